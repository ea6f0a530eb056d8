use crate::cli::{Cli, Commands};
use crate::node::PathNode;
use crate::Config;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

mod create;
mod has;
mod inspect;
mod install;
mod relocate;
mod uninstall;

pub fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref().map(expand_path).transpose()?;
    let config = Config::load_from(config_path.as_deref())?;

    match cli.command {
        Commands::Relocate {
            source,
            destination,
            move_tree,
        } => relocate::execute(
            config,
            &expand(&source)?,
            &expand_path(&destination)?,
            move_tree,
        ),

        Commands::Create {
            path,
            python,
            system_site_packages,
            always_copy,
        } => create::execute(
            config,
            &expand_path(&path)?,
            python,
            system_site_packages,
            always_copy,
        ),

        Commands::Install {
            venv,
            package,
            requirements,
            index_url,
            force,
            upgrade,
        } => {
            let requirements = requirements.as_deref().map(expand_path).transpose()?;
            install::execute(
                config,
                &expand_path(&venv)?,
                package,
                requirements,
                index_url,
                force,
                upgrade,
            )
        }

        Commands::Uninstall { venv, package } => {
            uninstall::execute(config, &expand_path(&venv)?, &package)
        }

        Commands::Has { venv, package } => has::execute(config, &expand_path(&venv)?, &package),

        Commands::Inspect { venv } => inspect::execute(&expand_path(&venv)?),
    }
}

/// Expand `~` and environment variables. A relative path stays relative.
pub(crate) fn expand(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path {:?}", path))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Expand `~` and environment variables, then make the path absolute.
pub(crate) fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(PathNode::new(expand(path)?).abspath())
}

/// Fail unless `path` looks like an environment root.
pub(crate) fn require_venv(path: &Path) -> Result<()> {
    if !path.is_dir() {
        anyhow::bail!("No virtual environment at {}", path.display());
    }
    Ok(())
}
