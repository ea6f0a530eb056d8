use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::bin_dir::BinDir;
use crate::node::DirNode;

/// A virtual environment on disk, viewed from its root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualEnvironment {
    root: DirNode,
}

impl Deref for VirtualEnvironment {
    type Target = DirNode;

    fn deref(&self) -> &DirNode {
        &self.root
    }
}

impl VirtualEnvironment {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            root: DirNode::new(path),
        }
    }

    /// The `bin/` directory.
    pub fn bin(&self) -> BinDir {
        BinDir::new(self.child("bin"))
    }

    /// The `include/` directory.
    pub fn include(&self) -> DirNode {
        DirNode::new(self.child("include"))
    }

    /// The `lib/` directory.
    pub fn lib(&self) -> DirNode {
        DirNode::new(self.child("lib"))
    }

    /// The `local/` directory some distributions add.
    pub fn local(&self) -> DirNode {
        DirNode::new(self.child("local"))
    }

    pub(crate) fn set_root(&mut self, path: &Path) {
        self.root = DirNode::new(path);
    }
}
