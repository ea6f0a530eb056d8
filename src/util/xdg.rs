use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "venvctl";

/// Get the XDG config directory for venvctl
///
/// Returns `$XDG_CONFIG_HOME/venvctl` or `~/.config/venvctl` if not set
pub fn config_dir() -> Result<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME").filter(|value| !value.is_empty()) {
        Some(value) => PathBuf::from(value),
        None => directories::BaseDirs::new()
            .context("Failed to get home directory")?
            .home_dir()
            .join(".config"),
    };

    Ok(base.join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_dir_from_env() {
        env::set_var("XDG_CONFIG_HOME", "/tmp/xdg-config");
        let dir = config_dir().unwrap();
        env::remove_var("XDG_CONFIG_HOME");

        assert_eq!(dir, PathBuf::from("/tmp/xdg-config/venvctl"));
    }

    #[test]
    #[serial]
    fn test_config_dir_falls_back_to_home() {
        env::remove_var("XDG_CONFIG_HOME");
        let dir = config_dir().unwrap();

        assert!(dir.ends_with(".config/venvctl"));
    }
}
