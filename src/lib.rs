// Public API
pub mod cli;
pub mod commands;

// Core domain types
pub mod activation;
pub mod bin_dir;
pub mod builder;
pub mod command;
pub mod config;
pub mod environment;
pub mod error;
pub mod node;
pub mod packages;
pub mod relocate;
pub mod shebang;
pub mod venv;

mod ui;
mod util;

// Re-export main types
pub use activation::{ActivationScript, Dialect, PathLocation, RewriteStrategy};
pub use bin_dir::{BinDir, BinEntry};
pub use builder::{CreateOptions, EnvironmentBuilder};
pub use command::{CommandExecutor, CommandOutput, SystemExecutor};
pub use config::Config;
pub use environment::Environment;
pub use error::{Result, VenvError};
pub use node::{DirNode, Entry, FileNode, PathNode};
pub use packages::{InstallOptions, PackageManager};
pub use relocate::RelocationReport;
pub use shebang::{ExecutableFile, Shebang, ShebangForm};
pub use venv::VirtualEnvironment;
