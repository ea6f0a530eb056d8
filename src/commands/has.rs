use super::require_venv;
use crate::{ui, Config, Environment};
use anyhow::Result;
use std::path::Path;

/// Exits with status 1 when the package is missing.
pub fn execute(config: Config, venv: &Path, package: &str) -> Result<()> {
    require_venv(venv)?;

    let env = Environment::new(venv, config);
    if env.packages()?.has_package(package)? {
        ui::success("Installed", package);
        Ok(())
    } else {
        ui::error(format!("{package} is not installed in {}", venv.display()));
        std::process::exit(1);
    }
}
