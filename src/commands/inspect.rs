use super::require_venv;
use crate::relocate::PATH_HINT_EXTENSION;
use crate::{ui, VirtualEnvironment};
use anyhow::{Context, Result};
use std::path::Path;
use walkdir::WalkDir;

pub fn execute(path: &Path) -> Result<()> {
    require_venv(path)?;

    let venv = VirtualEnvironment::new(path);
    ui::status("Environment", path.display());

    let bin = venv.bin();
    if !bin.is_dir() {
        ui::warn(format!("{} has no bin directory", path.display()));
        return Ok(());
    }

    let activations = bin.activations()?;
    if activations.is_empty() {
        ui::info("No activation scripts found");
    }
    for activation in activations {
        let vpath = activation.vpath()?.unwrap_or_else(|| "-".to_string());
        ui::status(activation.dialect().as_str(), vpath);
    }

    for script in bin.executables()? {
        if script.is_link() {
            continue;
        }
        let shebang = match script.shebang() {
            Ok(Some(shebang)) => shebang,
            Ok(None) => continue,
            Err(err) => {
                ui::warn(format!("{}: {err}", script.path().display()));
                continue;
            }
        };
        let name = script.file_name().unwrap_or_default();
        let label = if shebang.references_own_interpreter() {
            "Script"
        } else {
            "Foreign"
        };
        ui::status(
            label,
            format!("{name}: {}", shebang.interpreter().unwrap_or_default()),
        );
    }

    let mut hints = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        let is_hint = entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(PATH_HINT_EXTENSION));
        if is_hint {
            hints.push(entry.into_path());
        }
    }
    for hint in &hints {
        ui::status("Path hint", hint.strip_prefix(path).unwrap_or(hint.as_path()).display());
    }

    ui::success("Inspected", format!("{} path hint files", hints.len()));
    Ok(())
}
