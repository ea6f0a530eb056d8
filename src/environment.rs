use std::path::{Path, PathBuf};

use crate::builder::{CreateOptions, EnvironmentBuilder};
use crate::command::{quote, CommandExecutor, CommandOutput, SystemExecutor};
use crate::config::Config;
use crate::error::Result;
use crate::packages::PackageManager;
use crate::relocate::RelocationReport;
use crate::venv::VirtualEnvironment;

/// A virtual environment together with the tools that act on it.
///
/// Filesystem operations go through the [`VirtualEnvironment`] view; anything
/// that runs a program goes through the executor.
#[derive(Debug)]
pub struct Environment<E: CommandExecutor = SystemExecutor> {
    venv: VirtualEnvironment,
    config: Config,
    executor: E,
}

impl Environment<SystemExecutor> {
    pub fn new(path: impl Into<PathBuf>, config: Config) -> Self {
        Self::with_executor(path, config, SystemExecutor)
    }
}

impl<E: CommandExecutor> Environment<E> {
    pub fn with_executor(path: impl Into<PathBuf>, config: Config, executor: E) -> Self {
        Self {
            venv: VirtualEnvironment::new(path),
            config,
            executor,
        }
    }

    pub fn venv(&self) -> &VirtualEnvironment {
        &self.venv
    }

    pub fn path(&self) -> &Path {
        self.venv.path()
    }

    /// Create the environment with the configured builder.
    pub fn create(&self, options: &CreateOptions) -> Result<CommandOutput> {
        EnvironmentBuilder::new(&self.config.builder, &self.executor).create(self.path(), options)
    }

    /// Package operations through the environment's `pip`.
    pub fn packages(&self) -> Result<PackageManager<'_, E>> {
        let pip = self.cmd_path("pip")?;
        Ok(PackageManager::new(pip, &self.executor)
            .with_default_index(self.config.packages.index_url.clone()))
    }

    /// Path of a command in the environment's `bin/`.
    pub fn cmd_path(&self, name: &str) -> Result<PathBuf> {
        self.venv.bin().cmd_path(name)
    }

    /// Execute a script from the environment's `bin/`.
    pub fn run(&self, name: &str) -> Result<CommandOutput> {
        let script = self.cmd_path(name)?.display().to_string();
        self.executor.execute(&quote(&script)?)
    }

    /// Run the environment's Python with an argument string.
    pub fn python(&self, args: &str) -> Result<CommandOutput> {
        self.run_with("python", args)
    }

    /// Run the environment's pip with an argument string.
    pub fn pip(&self, args: &str) -> Result<CommandOutput> {
        self.run_with("pip", args)
    }

    fn run_with(&self, name: &str, args: &str) -> Result<CommandOutput> {
        let program = self.cmd_path(name)?.display().to_string();
        self.executor
            .execute(&format!("{} {}", quote(&program)?, args))
    }

    pub fn relocate(&self, destination: impl AsRef<Path>) -> Result<RelocationReport> {
        self.venv.relocate(destination)
    }

    pub fn move_to(&mut self, destination: impl AsRef<Path>) -> Result<RelocationReport> {
        self.venv.move_to(destination)
    }
}
