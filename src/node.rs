//! Typed views over paths inside a virtual environment.
//!
//! Nodes are cheap, transient wrappers around a path. They cache nothing: every
//! query goes back to the filesystem, so a node stays valid while the files
//! underneath it are being rewritten.

use std::env;
use std::fs;
use std::io::Write;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, VenvError};

/// A path in the virtual environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    path: PathBuf,
}

impl PathNode {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path exactly as it was given.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute form of the path with `.` and `..` resolved lexically.
    pub fn abspath(&self) -> PathBuf {
        let joined = if self.path.is_absolute() {
            self.path.clone()
        } else {
            match env::current_dir() {
                Ok(cwd) => cwd.join(&self.path),
                Err(_) => self.path.clone(),
            }
        };
        normalize_lexically(&joined)
    }

    /// The path with symbolic links resolved, or the absolute path if it cannot be resolved.
    pub fn realpath(&self) -> PathBuf {
        fs::canonicalize(&self.path).unwrap_or_else(|_| self.abspath())
    }

    pub fn is_absolute(&self) -> bool {
        self.path.is_absolute()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn is_file(&self) -> bool {
        self.path.is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.path.is_dir()
    }

    pub fn is_link(&self) -> bool {
        self.path
            .symlink_metadata()
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// A file within a virtual environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    node: PathNode,
}

impl Deref for FileNode {
    type Target = PathNode;

    fn deref(&self) -> &PathNode {
        &self.node
    }
}

impl FileNode {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            node: PathNode::new(path),
        }
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        fs::read(self.path()).map_err(|err| VenvError::io(self.path(), err))
    }

    /// Read the whole file as UTF-8 text.
    pub fn read_text(&self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|_| VenvError::NotText {
            path: self.path().to_path_buf(),
        })
    }

    /// Rewrite a single line in the file. Numbering starts at 0.
    ///
    /// The line keeps the terminator the original line had, so a file without
    /// a trailing newline stays that way.
    pub fn write_line(&self, line: &str, line_number: usize) -> Result<()> {
        self.write_lines(&[(line_number, line)])
    }

    /// Rewrite several lines in one pass over the file.
    ///
    /// Lines are split on raw bytes, so only the replaced lines need to be
    /// text. The rest of the file is copied through untouched.
    pub fn write_lines(&self, lines: &[(usize, &str)]) -> Result<()> {
        self.rewrite_bytes(|content| {
            let originals: Vec<&[u8]> = content
                .split_inclusive(|&byte| byte == b'\n')
                .collect();
            for (line_number, _) in lines {
                if *line_number >= originals.len() {
                    return Err(VenvError::LineOutOfRange {
                        path: self.path().to_path_buf(),
                        line: *line_number,
                        count: originals.len(),
                    });
                }
            }

            let mut updated = Vec::with_capacity(content.len());
            for (index, original) in originals.iter().enumerate() {
                match lines.iter().rev().find(|(number, _)| *number == index) {
                    Some((_, replacement)) => {
                        let replacement = replacement.trim_end_matches(['\r', '\n']);
                        updated.extend_from_slice(replacement.as_bytes());
                        updated.extend_from_slice(line_terminator(original));
                    }
                    None => updated.extend_from_slice(original),
                }
            }
            Ok(Some(updated))
        })
        .map(|_| ())
    }

    /// Replace every literal occurrence of `old` with `new`.
    ///
    /// Returns whether the file content changed.
    pub fn replace(&self, old: &str, new: &str) -> Result<bool> {
        if old.is_empty() {
            return Ok(false);
        }
        self.rewrite(|content| {
            if content.contains(old) {
                Ok(Some(content.replace(old, new)))
            } else {
                Ok(None)
            }
        })
    }

    /// Compose new content from the current text and replace the file with it.
    ///
    /// `compose` returns `None` to leave the file alone. Nothing on disk is
    /// touched until the full new content exists in memory.
    pub(crate) fn rewrite<F>(&self, compose: F) -> Result<bool>
    where
        F: FnOnce(&str) -> Result<Option<String>>,
    {
        self.rewrite_bytes(|bytes| {
            let content = std::str::from_utf8(bytes).map_err(|_| VenvError::NotText {
                path: self.path().to_path_buf(),
            })?;
            Ok(compose(content)?.map(String::into_bytes))
        })
    }

    fn rewrite_bytes<F>(&self, compose: F) -> Result<bool>
    where
        F: FnOnce(&[u8]) -> Result<Option<Vec<u8>>>,
    {
        let content = self.read_bytes()?;
        match compose(&content)? {
            Some(updated) if updated != content => {
                replace_on_write(self.path(), &updated)?;
                debug!(path = %self.path().display(), "rewrote file");
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn line_terminator(line: &[u8]) -> &'static [u8] {
    if line.ends_with(b"\r\n") {
        b"\r\n"
    } else if line.ends_with(b"\n") {
        b"\n"
    } else {
        b""
    }
}

/// Write `content` to a sibling temporary file and move it over `path`.
///
/// Symlinks are followed so the link itself survives, and the original
/// permissions are carried over to the replacement.
fn replace_on_write(path: &Path, content: &[u8]) -> Result<()> {
    let target = fs::canonicalize(path).map_err(|err| VenvError::io(path, err))?;
    let permissions = fs::metadata(&target)
        .map_err(|err| VenvError::io(&target, err))?
        .permissions();
    let parent = target.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(parent).map_err(|err| VenvError::io(parent, err))?;
    tmp.write_all(content)
        .map_err(|err| VenvError::io(tmp.path(), err))?;
    tmp.as_file()
        .set_permissions(permissions)
        .map_err(|err| VenvError::io(tmp.path(), err))?;
    tmp.persist(&target)
        .map_err(|err| VenvError::io(&target, err.error))?;
    Ok(())
}

/// A typed child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File(FileNode),
    Dir(DirNode),
}

impl Entry {
    pub fn path(&self) -> &Path {
        match self {
            Entry::File(file) => file.path(),
            Entry::Dir(dir) => dir.path(),
        }
    }
}

/// A directory within a virtual environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirNode {
    node: PathNode,
}

impl Deref for DirNode {
    type Target = PathNode;

    fn deref(&self) -> &PathNode {
        &self.node
    }
}

impl DirNode {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            node: PathNode::new(path),
        }
    }

    /// A child path of this directory, whether or not it exists.
    pub fn child(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Every immediate child, untyped. Order is unspecified.
    pub fn paths(&self) -> Result<Vec<PathNode>> {
        let reader = fs::read_dir(self.path()).map_err(|err| VenvError::io(self.path(), err))?;
        let mut paths = Vec::new();
        for entry in reader {
            let entry = entry.map_err(|err| VenvError::io(self.path(), err))?;
            paths.push(PathNode::new(entry.path()));
        }
        Ok(paths)
    }

    pub fn files(&self) -> Result<Vec<FileNode>> {
        Ok(self
            .paths()?
            .into_iter()
            .filter(PathNode::is_file)
            .map(|node| FileNode::new(node.path))
            .collect())
    }

    pub fn dirs(&self) -> Result<Vec<DirNode>> {
        Ok(self
            .paths()?
            .into_iter()
            .filter(PathNode::is_dir)
            .map(|node| DirNode::new(node.path))
            .collect())
    }

    /// Files and directories, typed. Anything else (broken links, sockets) is left out.
    pub fn entries(&self) -> Result<Vec<Entry>> {
        Ok(self
            .paths()?
            .into_iter()
            .filter_map(|node| {
                if node.is_file() {
                    Some(Entry::File(FileNode::new(node.path)))
                } else if node.is_dir() {
                    Some(Entry::Dir(DirNode::new(node.path)))
                } else {
                    None
                }
            })
            .collect())
    }

    pub fn iter(&self) -> Result<std::vec::IntoIter<Entry>> {
        Ok(self.entries()?.into_iter())
    }
}
