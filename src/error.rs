use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the virtual environment model and its collaborators.
#[derive(Debug, Error)]
pub enum VenvError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path:?} is not valid UTF-8 text")]
    NotText { path: PathBuf },

    #[error("Cannot modify the shebang of {path:?}: the file has no shebang")]
    NoShebang { path: PathBuf },

    #[error("New shebang for {path:?} cannot be empty")]
    EmptyShebang { path: PathBuf },

    #[error(
        "Shebang of {path:?} spans {expected} line(s) but the replacement spans {actual}; \
         the form must be preserved"
    )]
    ShebangLineCount {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid shebang for {path:?}: {line:?} does not start with '#!'")]
    MalformedShebang { path: PathBuf, line: String },

    #[error("Line {line} is out of range for {path:?} ({count} line(s))")]
    LineOutOfRange {
        path: PathBuf,
        line: usize,
        count: usize,
    },

    #[error("Destination {path:?} already exists")]
    DestinationExists { path: PathBuf },

    #[error(
        "Failed to move {from:?} to {to:?} after rewriting its metadata \
         (the environment still lives at {from:?}): {source}"
    )]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("The command {name} was not found in {bin:?}")]
    CommandNotFound { name: String, bin: PathBuf },

    #[error("Invalid command line: {command}")]
    InvalidCommandLine { command: String },

    #[error("Failed to start `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Command `{command}` exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },
}

impl VenvError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        VenvError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by calling an operation on a value it cannot apply to.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            VenvError::NoShebang { .. }
                | VenvError::EmptyShebang { .. }
                | VenvError::ShebangLineCount { .. }
                | VenvError::MalformedShebang { .. }
                | VenvError::LineOutOfRange { .. }
                | VenvError::DestinationExists { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, VenvError>;
