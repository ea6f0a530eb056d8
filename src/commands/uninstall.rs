use super::require_venv;
use crate::{ui, Config, Environment};
use anyhow::Result;
use std::path::Path;

pub fn execute(config: Config, venv: &Path, package: &str) -> Result<()> {
    require_venv(venv)?;

    let env = Environment::new(venv, config);
    env.packages()?.uninstall_package(package)?;
    ui::success("Removed", package);
    Ok(())
}
