use super::require_venv;
use crate::{ui, Config, Environment, InstallOptions};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub fn execute(
    config: Config,
    venv: &Path,
    package: Option<String>,
    requirements: Option<PathBuf>,
    index_url: Option<String>,
    force: bool,
    upgrade: bool,
) -> Result<()> {
    require_venv(venv)?;

    let env = Environment::new(venv, config);
    let packages = env.packages()?;

    let (progress, result) = match (package, requirements) {
        (_, Some(requirements)) => {
            let progress = ui::Progress::start("Installing", requirements.display().to_string());
            let result = packages.install_requirements(&requirements, index_url.as_deref());
            (progress, result)
        }
        (Some(package), None) => {
            let options = InstallOptions {
                index: index_url,
                force,
                upgrade,
            };
            let progress = ui::Progress::start("Installing", package.clone());
            let result = packages.install_package(&package, &options);
            (progress, result)
        }
        (None, None) => anyhow::bail!("Nothing to install: give a package or --requirements"),
    };

    match result {
        Ok(()) => {
            progress.finish("Installed", None);
            Ok(())
        }
        Err(err) => {
            progress.fail("Failed", &err);
            Err(err.into())
        }
    }
}
