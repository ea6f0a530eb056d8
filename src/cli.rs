use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Virtual environment control - relocate and manage Python virtualenvs
///
/// venvctl rewrites the absolute paths a virtualenv records about itself
/// (activation scripts, script shebangs, `.pth` path hints) so the
/// environment keeps working after it moves to a new location.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to $XDG_CONFIG_HOME/venvctl/config.toml)
    #[arg(long, global = true, value_name = "FILE", env = "VENVCTL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite an environment's recorded paths for a new location
    ///
    /// Without --move the files stay where they are and only their
    /// contents change, for environments that will be moved afterwards.
    Relocate {
        /// Current path of the environment
        #[arg(long, value_name = "PATH")]
        source: PathBuf,

        /// Path the environment will live at
        #[arg(long, value_name = "PATH")]
        destination: PathBuf,

        /// Also move the environment to the destination
        #[arg(long = "move")]
        move_tree: bool,
    },

    /// Create a new environment with the configured builder
    Create {
        /// Where to create the environment
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Interpreter to build the environment from
        #[arg(short, long, value_name = "PYTHON")]
        python: Option<String>,

        /// Give the environment access to the system site-packages
        #[arg(long)]
        system_site_packages: bool,

        /// Copy files instead of symlinking them
        #[arg(long)]
        always_copy: bool,
    },

    /// Install a package or a requirements file into an environment
    Install {
        /// Path of the environment
        #[arg(value_name = "VENV")]
        venv: PathBuf,

        /// Package or requirement specifier
        #[arg(value_name = "PACKAGE", required_unless_present = "requirements")]
        package: Option<String>,

        /// Install from a requirements file instead
        #[arg(short, long, value_name = "FILE", conflicts_with = "package")]
        requirements: Option<PathBuf>,

        /// Package index URL (overrides the configured default)
        #[arg(long, value_name = "URL")]
        index_url: Option<String>,

        /// Reinstall even if already up to date
        #[arg(short, long)]
        force: bool,

        /// Upgrade to the newest available version
        #[arg(short = 'U', long)]
        upgrade: bool,
    },

    /// Remove a package from an environment
    Uninstall {
        #[arg(value_name = "VENV")]
        venv: PathBuf,

        #[arg(value_name = "PACKAGE")]
        package: String,
    },

    /// Exit successfully if a package is installed in an environment
    Has {
        #[arg(value_name = "VENV")]
        venv: PathBuf,

        #[arg(value_name = "PACKAGE")]
        package: String,
    },

    /// Show the files that carry an environment's location
    Inspect {
        #[arg(value_name = "VENV")]
        venv: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_relocate_move_flag() {
        let cli = Cli::try_parse_from([
            "venvctl",
            "relocate",
            "--source",
            "/a",
            "--destination",
            "/b",
            "--move",
        ])
        .unwrap();

        match cli.command {
            Commands::Relocate {
                source,
                destination,
                move_tree,
            } => {
                assert_eq!(source, PathBuf::from("/a"));
                assert_eq!(destination, PathBuf::from("/b"));
                assert!(move_tree);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_install_needs_package_or_requirements() {
        assert!(Cli::try_parse_from(["venvctl", "install", "/venv"]).is_err());
        assert!(Cli::try_parse_from(["venvctl", "install", "/venv", "-r", "req.txt"]).is_ok());
        assert!(
            Cli::try_parse_from(["venvctl", "install", "/venv", "pkg", "-r", "req.txt"]).is_err()
        );
    }
}
