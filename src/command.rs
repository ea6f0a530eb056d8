use std::borrow::Cow;
use std::process::Command;

use tracing::debug;

use crate::error::{Result, VenvError};

/// Captured result of a command that exited successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub out: String,
    pub err: String,
}

/// Runs shell-style command lines to completion.
pub trait CommandExecutor {
    /// Execute `command`, failing with [`VenvError::CommandFailed`] on a non-zero exit.
    fn execute(&self, command: &str) -> Result<CommandOutput>;
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &E {
    fn execute(&self, command: &str) -> Result<CommandOutput> {
        (**self).execute(command)
    }
}

/// Executes commands as child processes of the current one.
///
/// The command line is split with POSIX shell quoting rules but is not run
/// through a shell: no globbing, pipes or variable expansion.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl CommandExecutor for SystemExecutor {
    fn execute(&self, command: &str) -> Result<CommandOutput> {
        let parts = shlex::split(command).ok_or_else(|| VenvError::InvalidCommandLine {
            command: command.to_string(),
        })?;
        let Some((program, args)) = parts.split_first() else {
            return Err(VenvError::InvalidCommandLine {
                command: command.to_string(),
            });
        };

        debug!(command, "executing");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| VenvError::CommandSpawn {
                command: command.to_string(),
                source,
            })?;

        // Killed by a signal: there is no exit code to report.
        let code = output.status.code().unwrap_or(-1);
        let out = String::from_utf8_lossy(&output.stdout).into_owned();
        let err = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(VenvError::CommandFailed {
                command: command.to_string(),
                code,
                stderr: err,
            });
        }

        Ok(CommandOutput { code, out, err })
    }
}

/// Quote one argument so it survives splitting as a single word.
pub(crate) fn quote(arg: &str) -> Result<Cow<'_, str>> {
    shlex::try_quote(arg).map_err(|_| VenvError::InvalidCommandLine {
        command: arg.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Records command lines and replays canned output.
    #[derive(Default)]
    pub(crate) struct RecordingExecutor {
        pub commands: RefCell<Vec<String>>,
        pub outputs: RefCell<VecDeque<String>>,
    }

    impl RecordingExecutor {
        pub(crate) fn with_output(output: &str) -> Self {
            let executor = Self::default();
            executor.outputs.borrow_mut().push_back(output.to_string());
            executor
        }

        pub(crate) fn last(&self) -> String {
            self.commands.borrow().last().cloned().unwrap_or_default()
        }
    }

    impl CommandExecutor for RecordingExecutor {
        fn execute(&self, command: &str) -> Result<CommandOutput> {
            self.commands.borrow_mut().push(command.to_string());
            Ok(CommandOutput {
                code: 0,
                out: self.outputs.borrow_mut().pop_front().unwrap_or_default(),
                err: String::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_captures_stdout() {
        let output = SystemExecutor.execute("echo 'hello world'").unwrap();
        assert_eq!(output.code, 0);
        assert_eq!(output.out, "hello world\n");
        assert!(output.err.is_empty());
    }

    #[test]
    fn test_non_zero_exit_carries_code_and_stderr() {
        let err = SystemExecutor
            .execute("sh -c 'echo broken >&2; exit 3'")
            .unwrap_err();
        match err {
            VenvError::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "broken\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unbalanced_quotes_are_rejected() {
        let err = SystemExecutor.execute("echo 'unterminated").unwrap_err();
        assert!(matches!(err, VenvError::InvalidCommandLine { .. }));
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let err = SystemExecutor.execute("   ").unwrap_err();
        assert!(matches!(err, VenvError::InvalidCommandLine { .. }));
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        let err = SystemExecutor
            .execute("/definitely/not/a/real/program --flag")
            .unwrap_err();
        assert!(matches!(err, VenvError::CommandSpawn { .. }));
    }

    #[test]
    fn test_quote_round_trips_through_split() {
        let quoted = quote("/path with spaces/bin/pip").unwrap();
        assert_eq!(
            shlex::split(&format!("{quoted} list")).unwrap(),
            vec!["/path with spaces/bin/pip", "list"]
        );
    }
}
