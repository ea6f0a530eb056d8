//! Interpreter directives on executable scripts.
//!
//! Two forms are recognised. The plain form is a single `#!<interpreter>` line.
//! The wrapper form spans three lines and re-executes the interpreter through a
//! shell/Python polyglot, which build tools emit when the interpreter path is
//! too long for the kernel's shebang limit:
//!
//! ```text
//! #!/bin/sh
//! '''exec' /path/to/venv/bin/python "$0" "$@"
//! ' '''
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::error::{Result, VenvError};
use crate::node::FileNode;

const MARKER: &[u8; 2] = b"#!";
const WRAPPER_SHELL: &[u8] = b"/bin/sh";
const WRAPPER_EXEC: &[u8; 8] = b"'''exec'";
const DEFAULT_EXEC_ARGS: &str = "\"$0\" \"$@\"";

/// Interpreter names that belong to the environment itself.
const OWN_INTERPRETERS: &[&str] = &["python", "pypy"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShebangForm {
    /// `#!<interpreter>` on one line.
    Direct,
    /// The three-line `'''exec'` wrapper.
    Wrapper,
}

impl ShebangForm {
    pub fn line_count(self) -> usize {
        match self {
            ShebangForm::Direct => 1,
            ShebangForm::Wrapper => 3,
        }
    }
}

/// The detected interpreter directive of a script, one entry per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shebang {
    lines: Vec<String>,
}

impl Shebang {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn form(&self) -> ShebangForm {
        if self.lines.len() == ShebangForm::Wrapper.line_count() {
            ShebangForm::Wrapper
        } else {
            ShebangForm::Direct
        }
    }

    /// The program the directive runs.
    pub fn interpreter(&self) -> Option<&str> {
        let command = match self.form() {
            ShebangForm::Direct => self.lines.first()?.strip_prefix("#!")?,
            ShebangForm::Wrapper => self.lines.get(1)?.strip_prefix("'''exec'")?,
        };
        command.split_whitespace().next()
    }

    /// True when the interpreter is a Python or PyPy binary invoked by path.
    ///
    /// `#!/usr/bin/env pypy` is deliberately excluded: the program it runs is
    /// `env`, which is not part of the environment.
    pub fn references_own_interpreter(&self) -> bool {
        let Some(interpreter) = self.interpreter() else {
            return false;
        };
        Path::new(interpreter)
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| OWN_INTERPRETERS.iter().any(|own| name.starts_with(own)))
    }

    /// The directive pointing at `<destination>/bin/python`, or `None` when this
    /// shebang does not run the environment's own interpreter.
    pub fn relocated(&self, destination: &Path) -> Option<String> {
        if !self.references_own_interpreter() {
            return None;
        }

        let python = destination.join("bin").join("python");
        match self.form() {
            ShebangForm::Direct => Some(format!("#!{}", python.display())),
            ShebangForm::Wrapper => {
                let command = self.lines[1].strip_prefix("'''exec'")?.trim_start();
                let interpreter = command.split_whitespace().next()?;
                let args = command[interpreter.len()..].trim();
                let args = if args.is_empty() { DEFAULT_EXEC_ARGS } else { args };

                let mut lines = self.lines.clone();
                lines[1] = format!("'''exec' {} {}", python.display(), args);
                Some(lines.join("\n"))
            }
        }
    }
}

impl fmt::Display for Shebang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

/// An executable file from a virtual environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableFile {
    file: FileNode,
}

impl Deref for ExecutableFile {
    type Target = FileNode;

    fn deref(&self) -> &FileNode {
        &self.file
    }
}

impl From<FileNode> for ExecutableFile {
    fn from(file: FileNode) -> Self {
        Self { file }
    }
}

impl ExecutableFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: FileNode::new(path),
        }
    }

    /// Read the file's shebang if it has one.
    pub fn shebang(&self) -> Result<Option<Shebang>> {
        self.detect().map_err(|err| VenvError::io(self.path(), err))
    }

    fn detect(&self) -> io::Result<Option<Shebang>> {
        let mut reader = BufReader::new(File::open(self.path())?);

        let mut marker = [0u8; 2];
        match reader.read_exact(&mut marker) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(err) => return Err(err),
        }
        if &marker != MARKER {
            return Ok(None);
        }

        let mut first = Vec::new();
        reader.read_until(b'\n', &mut first)?;
        let mut peek = Vec::with_capacity(WRAPPER_EXEC.len());
        reader
            .by_ref()
            .take(WRAPPER_EXEC.len() as u64)
            .read_to_end(&mut peek)?;
        let wrapper = trim_line_end(&first) == WRAPPER_SHELL && peek == WRAPPER_EXEC;

        reader.seek(SeekFrom::Start(0))?;
        let wanted = if wrapper {
            ShebangForm::Wrapper.line_count()
        } else {
            ShebangForm::Direct.line_count()
        };

        let mut lines = Vec::with_capacity(wanted);
        for _ in 0..wanted {
            let mut raw = Vec::new();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            match String::from_utf8(raw) {
                Ok(line) => lines.push(line.trim().to_string()),
                Err(_) => return Ok(None),
            }
        }

        // A wrapper cut short by end of file is only a plain directive.
        lines.truncate(if lines.len() == wanted { wanted } else { 1 });
        Ok(Some(Shebang { lines }))
    }

    /// Write a new shebang to the file, line by line.
    ///
    /// The new value must have as many lines as the current one, and its first
    /// line must start with `#!`.
    pub fn set_shebang(&self, new_shebang: &str) -> Result<()> {
        let current = self.shebang()?.ok_or_else(|| VenvError::NoShebang {
            path: self.path().to_path_buf(),
        })?;

        let new_shebang = new_shebang.trim();
        if new_shebang.is_empty() {
            return Err(VenvError::EmptyShebang {
                path: self.path().to_path_buf(),
            });
        }

        let new_lines: Vec<&str> = new_shebang.lines().collect();
        if new_lines.len() != current.lines().len() {
            return Err(VenvError::ShebangLineCount {
                path: self.path().to_path_buf(),
                expected: current.lines().len(),
                actual: new_lines.len(),
            });
        }

        if !new_lines[0].starts_with("#!") {
            return Err(VenvError::MalformedShebang {
                path: self.path().to_path_buf(),
                line: new_lines[0].to_string(),
            });
        }

        let numbered: Vec<(usize, &str)> = new_lines.into_iter().enumerate().collect();
        self.write_lines(&numbered)
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
