use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{quote, CommandExecutor, CommandOutput};
use crate::error::Result;

/// Flags for a single package install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Package index to install from, overriding the configured default.
    pub index: Option<String>,
    /// Reinstall even when the package is up to date.
    pub force: bool,
    /// Upgrade the package if a newer version exists.
    pub upgrade: bool,
}

/// Package operations through an environment's own `pip`.
pub struct PackageManager<'a, E: CommandExecutor> {
    pip: PathBuf,
    default_index: Option<String>,
    executor: &'a E,
}

impl<'a, E: CommandExecutor> PackageManager<'a, E> {
    pub fn new(pip: impl Into<PathBuf>, executor: &'a E) -> Self {
        Self {
            pip: pip.into(),
            default_index: None,
            executor,
        }
    }

    pub fn with_default_index(mut self, index: Option<String>) -> Self {
        self.default_index = index;
        self
    }

    /// Run `pip` with an already-formatted argument string.
    pub fn pip(&self, args: &str) -> Result<CommandOutput> {
        let pip = self.pip.display().to_string();
        self.executor.execute(&format!("{} {}", quote(&pip)?, args))
    }

    /// Whether `pip list` reports the package as installed.
    pub fn has_package(&self, name: &str) -> Result<bool> {
        let listing = self.pip("list")?;
        let wanted = normalize_name(name);
        Ok(listing
            .out
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .any(|installed| normalize_name(installed) == wanted))
    }

    /// Install a package. `name` may be any requirement specifier pip accepts.
    pub fn install_package(&self, name: &str, options: &InstallOptions) -> Result<()> {
        let mut args = vec!["install".to_string()];
        if options.force {
            args.push("--force-reinstall".to_string());
        }
        if options.upgrade {
            args.push("--upgrade".to_string());
        }
        if let Some(index) = options.index.as_deref().or(self.default_index.as_deref()) {
            args.push(format!("--index-url {}", quote(index)?));
        }
        args.push(quote(name)?.into_owned());

        info!(package = name, "installing package");
        self.pip(&args.join(" ")).map(|_| ())
    }

    /// Install every package listed in a requirements file.
    pub fn install_requirements(&self, path: &Path, index: Option<&str>) -> Result<()> {
        let requirements = path.display().to_string();
        let mut args = vec!["install".to_string()];
        if let Some(index) = index.or(self.default_index.as_deref()) {
            args.push(format!("--index-url {}", quote(index)?));
        }
        args.push(format!("-r {}", quote(&requirements)?));

        info!(requirements = %path.display(), "installing requirements");
        self.pip(&args.join(" ")).map(|_| ())
    }

    pub fn uninstall_package(&self, name: &str) -> Result<()> {
        info!(package = name, "uninstalling package");
        self.pip(&format!("uninstall --yes {}", quote(name)?))
            .map(|_| ())
    }
}

/// Package names compare case-insensitively with `-`, `_` and `.` equivalent.
fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase().replace(['_', '.'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::RecordingExecutor;

    const LISTING: &str = "Package    Version\n---------- -------\npip        23.2.1\nZope.Interface 6.0\ntyping_extensions 4.8\n";

    #[test]
    fn test_has_package_matches_whole_names() {
        let executor = RecordingExecutor::with_output(LISTING);
        let manager = PackageManager::new("/venv/bin/pip", &executor);
        assert!(manager.has_package("pip").unwrap());
        assert_eq!(executor.last(), "/venv/bin/pip list");

        let executor = RecordingExecutor::with_output(LISTING);
        let manager = PackageManager::new("/venv/bin/pip", &executor);
        assert!(!manager.has_package("pipx").unwrap());
    }

    #[test]
    fn test_has_package_normalizes_names() {
        let executor = RecordingExecutor::with_output(LISTING);
        let manager = PackageManager::new("/venv/bin/pip", &executor);
        assert!(manager.has_package("typing-extensions").unwrap());

        let executor = RecordingExecutor::with_output(LISTING);
        let manager = PackageManager::new("/venv/bin/pip", &executor);
        assert!(manager.has_package("zope-interface").unwrap());
    }

    #[test]
    fn test_install_package_flags() {
        let executor = RecordingExecutor::default();
        let manager = PackageManager::new("/venv/bin/pip", &executor);
        let options = InstallOptions {
            index: Some("https://pypi.example/simple".to_string()),
            force: true,
            upgrade: true,
        };

        manager.install_package("requests>=2", &options).unwrap();

        assert_eq!(
            executor.last(),
            "/venv/bin/pip install --force-reinstall --upgrade --index-url https://pypi.example/simple 'requests>=2'"
        );
    }

    #[test]
    fn test_install_uses_default_index() {
        let executor = RecordingExecutor::default();
        let manager = PackageManager::new("/venv/bin/pip", &executor)
            .with_default_index(Some("https://mirror.example/simple".to_string()));

        manager
            .install_package("confpy", &InstallOptions::default())
            .unwrap();
        assert_eq!(
            executor.last(),
            "/venv/bin/pip install --index-url https://mirror.example/simple confpy"
        );

        manager
            .install_requirements(Path::new("/tmp/req s.txt"), None)
            .unwrap();
        assert_eq!(
            executor.last(),
            "/venv/bin/pip install --index-url https://mirror.example/simple -r '/tmp/req s.txt'"
        );
    }

    #[test]
    fn test_uninstall_package() {
        let executor = RecordingExecutor::default();
        let manager = PackageManager::new("/venv/bin/pip", &executor);

        manager.uninstall_package("confpy").unwrap();

        assert_eq!(executor.last(), "/venv/bin/pip uninstall --yes confpy");
    }

    #[test]
    fn test_pip_path_with_spaces_is_quoted() {
        let executor = RecordingExecutor::default();
        let manager = PackageManager::new("/my venv/bin/pip", &executor);

        manager.pip("--version").unwrap();

        assert_eq!(executor.last(), "'/my venv/bin/pip' --version");
    }
}
