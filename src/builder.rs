use std::path::Path;

use tracing::info;

use crate::command::{quote, CommandExecutor, CommandOutput};
use crate::config::BuilderConfig;
use crate::error::Result;

/// Options for creating a new environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Name or path of the interpreter the environment is built from.
    pub python: Option<String>,
    /// Give the environment access to the system site-packages.
    pub system_site_packages: bool,
    /// Copy files instead of symlinking them.
    pub always_copy: bool,
}

/// Creates environments by delegating to an external builder such as `virtualenv`.
pub struct EnvironmentBuilder<'a, E: CommandExecutor> {
    config: &'a BuilderConfig,
    executor: &'a E,
}

impl<'a, E: CommandExecutor> EnvironmentBuilder<'a, E> {
    pub fn new(config: &'a BuilderConfig, executor: &'a E) -> Self {
        Self { config, executor }
    }

    pub fn command_line(&self, path: &Path, options: &CreateOptions) -> Result<String> {
        let mut parts = vec![quote(&self.config.command)?.into_owned()];
        for arg in &self.config.args {
            parts.push(quote(arg)?.into_owned());
        }
        if let Some(python) = &options.python {
            parts.push(format!("--python={}", quote(python)?));
        }
        if options.system_site_packages {
            parts.push("--system-site-packages".to_string());
        }
        if options.always_copy {
            parts.push("--always-copy".to_string());
        }
        parts.push(quote(&path.display().to_string())?.into_owned());
        Ok(parts.join(" "))
    }

    pub fn create(&self, path: &Path, options: &CreateOptions) -> Result<CommandOutput> {
        let command = self.command_line(path, options)?;
        info!(path = %path.display(), builder = %self.config.command, "creating environment");
        self.executor.execute(&command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::RecordingExecutor;
    use crate::command::SystemExecutor;
    use crate::error::VenvError;

    #[test]
    fn test_default_command_line() {
        let config = BuilderConfig::default();
        let executor = RecordingExecutor::default();
        let builder = EnvironmentBuilder::new(&config, &executor);

        builder
            .create(Path::new("/tmp/venv"), &CreateOptions::default())
            .unwrap();

        assert_eq!(executor.last(), "virtualenv /tmp/venv");
    }

    #[test]
    fn test_command_line_with_every_option() {
        let config = BuilderConfig {
            command: "python3".to_string(),
            args: vec!["-m".to_string(), "virtualenv".to_string()],
        };
        let executor = RecordingExecutor::default();
        let builder = EnvironmentBuilder::new(&config, &executor);
        let options = CreateOptions {
            python: Some("python3.11".to_string()),
            system_site_packages: true,
            always_copy: true,
        };

        let line = builder
            .command_line(Path::new("/tmp/my env"), &options)
            .unwrap();

        assert_eq!(
            line,
            "python3 -m virtualenv --python=python3.11 --system-site-packages --always-copy '/tmp/my env'"
        );
    }

    #[test]
    fn test_builder_failure_propagates() {
        let config = BuilderConfig {
            command: "false".to_string(),
            args: Vec::new(),
        };
        let builder = EnvironmentBuilder::new(&config, &SystemExecutor);

        let err = builder
            .create(Path::new("/tmp/venv"), &CreateOptions::default())
            .unwrap_err();
        assert!(matches!(err, VenvError::CommandFailed { code: 1, .. }));
    }
}
