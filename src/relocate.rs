//! Rewriting an environment's embedded paths for a new location.
//!
//! `relocate` only rewrites metadata: activation scripts, shebangs of the
//! scripts in `bin/`, and `.pth` files anywhere in the tree. `move_to` does the
//! same and then moves the directory. If that move fails the rewritten metadata
//! stays behind at the old location; callers that need atomicity must back up
//! the environment first.

use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::Path;

use regex::{Captures, Regex};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Result, VenvError};
use crate::node::FileNode;
use crate::venv::VirtualEnvironment;

/// Suffix of the interpreter's path-hint files.
pub const PATH_HINT_EXTENSION: &str = ".pth";

// EXDEV on Linux and macOS.
const CROSS_DEVICE_LINK: i32 = 18;

/// What a relocation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelocationReport {
    pub activations: usize,
    pub shebangs: usize,
    pub path_hints: usize,
    /// Path-hint files that were not text.
    pub skipped: usize,
}

impl VirtualEnvironment {
    /// Configure the virtual environment for another path.
    ///
    /// This does not move anything; it rewrites the metadata a move requires.
    pub fn relocate(&self, destination: impl AsRef<Path>) -> Result<RelocationReport> {
        let destination = destination.as_ref();
        let target = destination.display().to_string();
        let mut report = RelocationReport::default();

        let bin = self.bin();
        for activation in bin.activations()? {
            if activation.set_vpath(&target)? {
                debug!(dialect = %activation.dialect(), "rewrote activation script");
                report.activations += 1;
            }
        }

        if bin.is_dir() {
            for script in bin.executables()? {
                if script.is_link() {
                    continue;
                }
                let Some(shebang) = script.shebang()? else {
                    continue;
                };
                let Some(relocated) = shebang.relocated(destination) else {
                    debug!(path = %script.path().display(), %shebang, "foreign interpreter, leaving shebang");
                    continue;
                };
                if relocated != shebang.to_string() {
                    script.set_shebang(&relocated)?;
                    report.shebangs += 1;
                }
            }
        }

        self.rewrite_path_hints(&target, &mut report)?;

        info!(
            root = %self.path().display(),
            destination = %target,
            activations = report.activations,
            shebangs = report.shebangs,
            path_hints = report.path_hints,
            "relocated environment"
        );
        Ok(report)
    }

    /// Reconfigure the environment for `destination` and move it there.
    ///
    /// Fails before touching anything if `destination` already exists.
    pub fn move_to(&mut self, destination: impl AsRef<Path>) -> Result<RelocationReport> {
        let destination = destination.as_ref();
        if destination.symlink_metadata().is_ok() {
            return Err(VenvError::DestinationExists {
                path: destination.to_path_buf(),
            });
        }

        let report = self.relocate(destination)?;
        move_tree(self.path(), destination).map_err(|source| VenvError::MoveFailed {
            from: self.path().to_path_buf(),
            to: destination.to_path_buf(),
            source,
        })?;
        self.set_root(destination);
        Ok(report)
    }

    fn rewrite_path_hints(&self, destination: &str, report: &mut RelocationReport) -> Result<()> {
        let absolute = self.abspath().display().to_string();
        let given = self.path().display().to_string();
        let matcher = RootMatcher::new(&absolute, trim_trailing_separator(&given));

        for entry in WalkDir::new(self.path()) {
            let entry = entry.map_err(|source| VenvError::Walk {
                path: self.path().to_path_buf(),
                source,
            })?;
            let is_hint = entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.ends_with(PATH_HINT_EXTENSION));
            if !is_hint {
                continue;
            }

            let file = FileNode::new(entry.path());
            match file.rewrite(|content| Ok(matcher.replace(content, destination))) {
                Ok(true) => report.path_hints += 1,
                Ok(false) => {}
                Err(VenvError::NotText { path }) => {
                    debug!(path = %path.display(), "skipping non-text path hint");
                    report.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

fn trim_trailing_separator(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        path
    } else {
        trimmed
    }
}

/// Finds references to the environment root in free text.
///
/// The absolute form is tried first at every position so the given (possibly
/// relative) form never matches inside it. A match only counts when it forms a
/// whole path: `/old/venv` must not hit `/old/venv2` or `/mnt/old/venv`.
struct RootMatcher {
    pattern: Regex,
}

impl RootMatcher {
    fn new(absolute: &str, given: &str) -> Self {
        let pattern = if given == absolute || given.is_empty() {
            regex::escape(absolute)
        } else {
            format!("{}|{}", regex::escape(absolute), regex::escape(given))
        };
        Self {
            pattern: Regex::new(&pattern).expect("escaped literals are valid patterns"),
        }
    }

    /// The text with every whole-path reference replaced, or `None` if there were none.
    fn replace(&self, content: &str, destination: &str) -> Option<String> {
        let mut changed = false;
        let replaced = self.pattern.replace_all(content, |caps: &Captures| {
            let Some(found) = caps.get(0) else {
                return String::new();
            };
            if is_whole_path(content, found.start(), found.end()) {
                changed = true;
                destination.to_string()
            } else {
                found.as_str().to_string()
            }
        });
        changed.then(|| replaced.into_owned())
    }
}

fn is_whole_path(content: &str, start: usize, end: usize) -> bool {
    let before = content[..start].chars().next_back();
    let after = content[end..].chars().next();
    let continues = |ch: char| ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.');
    !before.is_some_and(|ch| continues(ch) || ch == '/') && !after.is_some_and(continues)
}

fn move_tree(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if err.raw_os_error() == Some(CROSS_DEVICE_LINK) => {
            debug!(from = %from.display(), to = %to.display(), "rename crosses devices, copying");
            copy_tree(from, to)?;
            fs::remove_dir_all(from)
        }
        Err(err) => Err(err),
    }
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let target = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            symlink(fs::read_link(entry.path())?, &target)?;
        } else if file_type.is_dir() {
            fs::create_dir_all(&target)?;
            fs::set_permissions(&target, entry.metadata()?.permissions())?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
