use anyhow::Result;
use clap::Parser;
use venvctl::cli::Cli;
use venvctl::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if cli.verbose {
        "venvctl=debug,info"
    } else {
        "venvctl=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    commands::execute(cli)
}
