use super::require_venv;
use crate::{ui, Config, Environment};
use anyhow::Result;
use std::path::Path;

pub fn execute(config: Config, source: &Path, destination: &Path, move_tree: bool) -> Result<()> {
    require_venv(source)?;

    let mut env = Environment::new(source, config);
    let verb = if move_tree { "Moving" } else { "Relocating" };
    let progress = ui::Progress::start(
        verb,
        format!("{} -> {}", source.display(), destination.display()),
    );

    let result = if move_tree {
        env.move_to(destination)
    } else {
        env.relocate(destination)
    };

    match result {
        Ok(report) => {
            progress.finish(
                if move_tree { "Moved" } else { "Relocated" },
                Some(format!(
                    "({} activation scripts, {} shebangs, {} path hints)",
                    report.activations, report.shebangs, report.path_hints
                )),
            );
            if report.skipped > 0 {
                ui::warn(format!(
                    "Skipped {} path hint files that are not text",
                    report.skipped
                ));
            }
            Ok(())
        }
        Err(err) => {
            progress.fail("Failed", &err);
            Err(err.into())
        }
    }
}
