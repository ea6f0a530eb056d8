use crate::{ui, Config, CreateOptions, Environment};
use anyhow::Result;
use std::path::Path;

pub fn execute(
    config: Config,
    path: &Path,
    python: Option<String>,
    system_site_packages: bool,
    always_copy: bool,
) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }

    let options = CreateOptions {
        python,
        system_site_packages,
        always_copy,
    };
    let env = Environment::new(path, config);
    let progress = ui::Progress::start("Creating", path.display().to_string());
    match env.create(&options) {
        Ok(_) => {
            progress.finish("Created", None);
            Ok(())
        }
        Err(err) => {
            progress.fail("Failed", &err);
            Err(err.into())
        }
    }
}
