use std::ops::Deref;
use std::path::PathBuf;

use crate::activation::{ActivationScript, Dialect};
use crate::error::{Result, VenvError};
use crate::node::DirNode;
use crate::shebang::ExecutableFile;

/// A typed child of a `bin` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinEntry {
    Executable(ExecutableFile),
    Dir(BinDir),
}

/// Specialized directory view for the environment's `bin/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinDir {
    dir: DirNode,
}

impl Deref for BinDir {
    type Target = DirNode;

    fn deref(&self) -> &DirNode {
        &self.dir
    }
}

impl BinDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            dir: DirNode::new(path),
        }
    }

    pub fn activation(&self, dialect: Dialect) -> ActivationScript {
        ActivationScript::new(self.path(), dialect)
    }

    pub fn activate_sh(&self) -> ActivationScript {
        self.activation(Dialect::Sh)
    }

    pub fn activate_csh(&self) -> ActivationScript {
        self.activation(Dialect::Csh)
    }

    pub fn activate_fish(&self) -> ActivationScript {
        self.activation(Dialect::Fish)
    }

    pub fn activate_xsh(&self) -> ActivationScript {
        self.activation(Dialect::Xonsh)
    }

    pub fn activate_nu(&self) -> ActivationScript {
        self.activation(Dialect::Nu)
    }

    pub fn deactivate_nu(&self) -> ActivationScript {
        self.activation(Dialect::NuDeactivate)
    }

    pub fn activate_nu_deactivate_alias(&self) -> ActivationScript {
        self.activation(Dialect::NuDeactivateAlias)
    }

    /// Activation scripts present in this directory, one per dialect.
    pub fn activations(&self) -> Result<Vec<ActivationScript>> {
        let mut found = Vec::new();
        for dialect in Dialect::ALL {
            let script = self.activation(dialect);
            if script.is_relevant()? {
                found.push(script);
            }
        }
        Ok(found)
    }

    /// Every file directly in `bin/`, typed as an executable.
    pub fn executables(&self) -> Result<Vec<ExecutableFile>> {
        Ok(self.files()?.into_iter().map(ExecutableFile::from).collect())
    }

    pub fn entries(&self) -> Result<Vec<BinEntry>> {
        Ok(self
            .dir
            .paths()?
            .into_iter()
            .filter_map(|node| {
                if node.is_file() {
                    Some(BinEntry::Executable(ExecutableFile::new(node.path())))
                } else if node.is_dir() {
                    Some(BinEntry::Dir(BinDir::new(node.path())))
                } else {
                    None
                }
            })
            .collect())
    }

    /// Path of a command in `bin/`.
    pub fn cmd_path(&self, name: &str) -> Result<PathBuf> {
        let candidate = self.child(name);
        if candidate.is_file() {
            Ok(candidate)
        } else {
            Err(VenvError::CommandNotFound {
                name: name.to_string(),
                bin: self.path().to_path_buf(),
            })
        }
    }
}
