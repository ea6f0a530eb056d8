//! Activation scripts and the shell dialects they are written in.
//!
//! Every dialect is a row in a fixed table: the file it lives in under `bin/`,
//! a pattern locating the line that assigns the install path, and the way the
//! path is rewritten. A dialect that cannot find its line simply reports no
//! path: generators drop the assignment from some dialects over time.

use std::fmt;
use std::ops::Deref;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Result, VenvError};
use crate::shebang::ExecutableFile;

/// How a dialect's install path is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStrategy {
    /// Replace the captured path on the matching line only.
    MatchedLine,
    /// Replace every literal occurrence of the captured path in the file.
    ///
    /// Used for templates that repeat the path, such as the POSIX script's
    /// Cygwin/MSYS branch that wraps it in `$(cygpath ...)`.
    EveryOccurrence,
}

/// Shell flavours with an activation script in `bin/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sh,
    Csh,
    Fish,
    Xonsh,
    Nu,
    NuDeactivate,
    /// The `alias deactivate = source .../deactivate.nu` line of `activate.nu`.
    NuDeactivateAlias,
}

impl Dialect {
    pub const ALL: [Dialect; 7] = [
        Dialect::Sh,
        Dialect::Csh,
        Dialect::Fish,
        Dialect::Xonsh,
        Dialect::Nu,
        Dialect::NuDeactivate,
        Dialect::NuDeactivateAlias,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Sh => "sh",
            Dialect::Csh => "csh",
            Dialect::Fish => "fish",
            Dialect::Xonsh => "xonsh",
            Dialect::Nu => "nu",
            Dialect::NuDeactivate => "nu-deactivate",
            Dialect::NuDeactivateAlias => "nu-deactivate-alias",
        }
    }

    pub fn file_name(self) -> &'static str {
        self.rule().file_name
    }

    pub fn strategy(self) -> RewriteStrategy {
        self.rule().strategy
    }

    /// Whether the file only counts for this dialect when the pattern matches.
    pub fn is_conditional(self) -> bool {
        self.rule().conditional
    }

    fn rule(self) -> &'static DialectRule {
        &(*RULES)[self as usize]
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct DialectRule {
    file_name: &'static str,
    pattern: Regex,
    strategy: RewriteStrategy,
    conditional: bool,
}

impl DialectRule {
    fn new(file_name: &'static str, pattern: &str, strategy: RewriteStrategy) -> Self {
        Self {
            file_name,
            pattern: Regex::new(pattern).expect("activation patterns are valid"),
            strategy,
            conditional: false,
        }
    }

    fn conditional(mut self) -> Self {
        self.conditional = true;
        self
    }
}

const NU_LET_PATTERN: &str = r#"^\s*let(?:-env)?\s+(?:virtual[-_]env|VIRTUAL_ENV)\s*=\s*(?:r#)?["']?(?P<path>[^"'#$()]+?)["']?#?\s*$"#;

// Indexed by `Dialect as usize`; keep in the order of `Dialect::ALL`.
static RULES: LazyLock<[DialectRule; 7]> = LazyLock::new(|| {
    [
        DialectRule::new(
            "activate",
            r#"^\s*(?:export\s+)?VIRTUAL_ENV=(?:\$\(\s*cygpath(?:\s+-u)?\s+)?["']?(?P<path>[^"'$()]+?)["']?\s*\)?\s*;?\s*$"#,
            RewriteStrategy::EveryOccurrence,
        ),
        DialectRule::new(
            "activate.csh",
            r#"^\s*setenv\s+VIRTUAL_ENV\s+["']?(?P<path>[^"'$()]+?)["']?\s*$"#,
            RewriteStrategy::MatchedLine,
        ),
        DialectRule::new(
            "activate.fish",
            r#"^\s*set\s+-gx\s+VIRTUAL_ENV\s+["']?(?P<path>[^"'$()]+?)["']?\s*$"#,
            RewriteStrategy::MatchedLine,
        ),
        DialectRule::new(
            "activate.xsh",
            r#"^\s*\$VIRTUAL_ENV\s*=\s*r?["']?(?P<path>[^"'$()]+?)["']?\s*$"#,
            RewriteStrategy::MatchedLine,
        ),
        DialectRule::new("activate.nu", NU_LET_PATTERN, RewriteStrategy::MatchedLine),
        DialectRule::new("deactivate.nu", NU_LET_PATTERN, RewriteStrategy::MatchedLine),
        DialectRule::new(
            "activate.nu",
            r#"^\s*alias\s+deactivate\s*=\s*source\s+(?:r#)?["']?(?P<path>[^"'#$()]+?)/bin/deactivate\.nu["']?#?\s*$"#,
            RewriteStrategy::MatchedLine,
        )
        .conditional(),
    ]
});

/// Where a dialect's install path sits in its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLocation {
    pub line_number: usize,
    /// Byte range of the path within the line, quotes and padding excluded.
    pub start: usize,
    pub end: usize,
    pub value: String,
}

/// An activation script read through one dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationScript {
    file: ExecutableFile,
    dialect: Dialect,
}

impl Deref for ActivationScript {
    type Target = ExecutableFile;

    fn deref(&self) -> &ExecutableFile {
        &self.file
    }
}

impl ActivationScript {
    /// The script for `dialect` inside the given `bin` directory.
    pub fn new(bin_dir: &Path, dialect: Dialect) -> Self {
        Self {
            file: ExecutableFile::new(bin_dir.join(dialect.file_name())),
            dialect,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Find the first line carrying the install path.
    pub fn locate(&self) -> Result<Option<PathLocation>> {
        if !self.is_file() {
            return Ok(None);
        }

        let content = match self.read_text() {
            Ok(content) => content,
            Err(VenvError::NotText { path }) => {
                debug!(path = %path.display(), "activation script is not text, skipping");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let pattern = &self.dialect.rule().pattern;
        for (line_number, line) in content.split_inclusive('\n').enumerate() {
            let body = line.trim_end_matches(['\r', '\n']);
            let Some(found) = pattern.captures(body).and_then(|caps| caps.name("path")) else {
                continue;
            };

            let raw = found.as_str();
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }
            let start = found.start() + (raw.len() - raw.trim_start().len());
            return Ok(Some(PathLocation {
                line_number,
                start,
                end: start + value.len(),
                value: value.to_string(),
            }));
        }
        Ok(None)
    }

    /// The install path embedded in the script, if any.
    pub fn vpath(&self) -> Result<Option<String>> {
        Ok(self.locate()?.map(|location| location.value))
    }

    /// Whether this script exists and, for conditional dialects, carries the line.
    pub fn is_relevant(&self) -> Result<bool> {
        if !self.is_file() {
            return Ok(false);
        }
        if self.dialect.is_conditional() {
            return Ok(self.locate()?.is_some());
        }
        Ok(true)
    }

    /// Point the script at a new install path.
    ///
    /// Returns `false` when the script carries no path to rewrite.
    pub fn set_vpath(&self, new_vpath: &str) -> Result<bool> {
        let Some(location) = self.locate()? else {
            debug!(
                dialect = %self.dialect,
                path = %self.path().display(),
                "no install path found, skipping"
            );
            return Ok(false);
        };

        match self.dialect.strategy() {
            RewriteStrategy::EveryOccurrence => self.replace(&location.value, new_vpath),
            RewriteStrategy::MatchedLine => {
                if location.value == new_vpath {
                    return Ok(false);
                }
                let content = self.read_text()?;
                let line = content
                    .split_inclusive('\n')
                    .nth(location.line_number)
                    .unwrap_or_default()
                    .trim_end_matches(['\r', '\n']);
                let updated = format!(
                    "{}{}{}",
                    &line[..location.start],
                    new_vpath,
                    &line[location.end..]
                );
                self.write_line(&updated, location.line_number)?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    const STDLIB_ACTIVATE: &str = r#"# This file must be used with "source bin/activate" *from bash*
deactivate nondestructive

# on Windows, a path can contain colons and backslashes and has to be converted:
if [ "${OSTYPE:-}" = "cygwin" ] || [ "${OSTYPE:-}" = "msys" ] ; then
    # transform D:\path\to\venv to /d/path/to/venv on MSYS
    # and to /cygdrive/d/path/to/venv on Cygwin
    export VIRTUAL_ENV=$(cygpath "/old/root")
else
    # use the path as-is
    export VIRTUAL_ENV="/old/root"
fi

_OLD_VIRTUAL_PATH="$PATH"
PATH="$VIRTUAL_ENV/bin:$PATH"
export PATH
"#;

    const VIRTUALENV_ACTIVATE: &str = r#"deactivate nondestructive

VIRTUAL_ENV='/old/root'
if ([ "$OSTYPE" = "cygwin" ] || [ "$OSTYPE" = "msys" ]) && $(command -v cygpath &> /dev/null) ; then
    VIRTUAL_ENV=$(cygpath -u "$VIRTUAL_ENV")
fi
export VIRTUAL_ENV
"#;

    const NU_ACTIVATE: &str = r#"def-env activate-virtualenv [] {
    let virtual_env = '/old/root'
    let bin = 'bin'
}
activate-virtualenv

alias pydoc = python -m pydoc
alias deactivate = source '/old/root/bin/deactivate.nu'
"#;

    fn write_script(temp: &TempDir, dialect: Dialect, content: &str) -> ActivationScript {
        fs::write(temp.path().join(dialect.file_name()), content).unwrap();
        ActivationScript::new(temp.path(), dialect)
    }

    #[rstest]
    #[case(Dialect::Sh, "VIRTUAL_ENV=\"/old/root\"\nexport VIRTUAL_ENV\n")]
    #[case(Dialect::Sh, VIRTUALENV_ACTIVATE)]
    #[case(Dialect::Sh, STDLIB_ACTIVATE)]
    #[case(Dialect::Csh, "setenv VIRTUAL_ENV \"/old/root\"\n")]
    #[case(Dialect::Csh, "setenv VIRTUAL_ENV '/old/root'\n")]
    #[case(Dialect::Fish, "set -gx VIRTUAL_ENV \"/old/root\"\n")]
    #[case(Dialect::Fish, "set -gx VIRTUAL_ENV '/old/root'\n")]
    #[case(Dialect::Xonsh, "$VIRTUAL_ENV = r\"/old/root\"\n")]
    #[case(Dialect::Nu, NU_ACTIVATE)]
    #[case(Dialect::Nu, "    let virtual-env = \"/old/root\"\n")]
    #[case(Dialect::Nu, "    let virtual_env = r#'/old/root'#\n")]
    #[case(Dialect::NuDeactivateAlias, NU_ACTIVATE)]
    fn test_vpath_and_relocation(#[case] dialect: Dialect, #[case] content: &str) {
        let temp = TempDir::new().unwrap();
        let script = write_script(&temp, dialect, content);

        assert_eq!(script.vpath().unwrap().as_deref(), Some("/old/root"));
        assert!(script.set_vpath("/new/root").unwrap());
        assert_eq!(script.vpath().unwrap().as_deref(), Some("/new/root"));
    }

    #[test]
    fn test_sh_rewrites_both_platform_branches() {
        let temp = TempDir::new().unwrap();
        let script = write_script(&temp, Dialect::Sh, STDLIB_ACTIVATE);

        script.set_vpath("/new/root").unwrap();

        let content = fs::read_to_string(script.path()).unwrap();
        assert!(!content.contains("/old/root"));
        assert!(content.contains("export VIRTUAL_ENV=$(cygpath \"/new/root\")\n"));
        assert!(content.contains("export VIRTUAL_ENV=\"/new/root\"\n"));
    }

    #[test]
    fn test_sh_cygpath_only_line_is_located() {
        let temp = TempDir::new().unwrap();
        let script = write_script(
            &temp,
            Dialect::Sh,
            "    export VIRTUAL_ENV=$(cygpath '/old/root')\n",
        );

        assert_eq!(script.vpath().unwrap().as_deref(), Some("/old/root"));
    }

    #[test]
    fn test_matched_line_keeps_quoting_and_other_lines() {
        let temp = TempDir::new().unwrap();
        let script = write_script(
            &temp,
            Dialect::Fish,
            "# comment /old/root\nset -gx VIRTUAL_ENV '/old/root'\nset -gx PATH \"$VIRTUAL_ENV/bin\" $PATH\n",
        );

        script.set_vpath("/new/root").unwrap();

        assert_eq!(
            fs::read_to_string(script.path()).unwrap(),
            "# comment /old/root\nset -gx VIRTUAL_ENV '/new/root'\nset -gx PATH \"$VIRTUAL_ENV/bin\" $PATH\n"
        );
    }

    #[test]
    fn test_nu_let_and_alias_are_independent() {
        let temp = TempDir::new().unwrap();
        write_script(&temp, Dialect::Nu, NU_ACTIVATE);
        let let_binding = ActivationScript::new(temp.path(), Dialect::Nu);
        let alias = ActivationScript::new(temp.path(), Dialect::NuDeactivateAlias);

        let_binding.set_vpath("/new/root").unwrap();
        assert_eq!(alias.vpath().unwrap().as_deref(), Some("/old/root"));

        alias.set_vpath("/new/root").unwrap();
        let content = fs::read_to_string(alias.path()).unwrap();
        assert!(content.contains("let virtual_env = '/new/root'"));
        assert!(content.contains("alias deactivate = source '/new/root/bin/deactivate.nu'"));
    }

    #[test]
    fn test_alias_is_relevant_only_when_present() {
        let temp = TempDir::new().unwrap();
        let script = write_script(
            &temp,
            Dialect::NuDeactivateAlias,
            "let virtual_env = '/old/root'\n",
        );

        assert!(!script.is_relevant().unwrap());
        assert!(ActivationScript::new(temp.path(), Dialect::Nu)
            .is_relevant()
            .unwrap());
    }

    #[test]
    fn test_missing_script_has_no_vpath() {
        let temp = TempDir::new().unwrap();
        let script = ActivationScript::new(temp.path(), Dialect::Xonsh);

        assert_eq!(script.vpath().unwrap(), None);
        assert!(!script.is_relevant().unwrap());
        assert!(!script.set_vpath("/new/root").unwrap());
    }

    #[test]
    fn test_script_without_assignment_is_skipped() {
        let temp = TempDir::new().unwrap();
        let original = "def-env deactivate-virtualenv [] {\n    hide-env VIRTUAL_ENV\n}\n";
        let script = write_script(&temp, Dialect::NuDeactivate, original);

        assert_eq!(script.vpath().unwrap(), None);
        assert!(!script.set_vpath("/new/root").unwrap());
        assert_eq!(fs::read_to_string(script.path()).unwrap(), original);
    }

    #[test]
    fn test_non_text_script_has_no_vpath() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(Dialect::Csh.file_name());
        fs::write(&path, b"setenv VIRTUAL_ENV \"/old/root\"\n# caf\xe9\n").unwrap();
        let script = ActivationScript::new(temp.path(), Dialect::Csh);

        assert_eq!(script.vpath().unwrap(), None);
        assert!(!script.set_vpath("/new/root").unwrap());
    }

    #[test]
    fn test_capture_is_trimmed() {
        let temp = TempDir::new().unwrap();
        let script = write_script(&temp, Dialect::Sh, "VIRTUAL_ENV=/old/root \n");

        assert_eq!(script.vpath().unwrap().as_deref(), Some("/old/root"));
    }

    #[test]
    fn test_set_vpath_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let script = write_script(&temp, Dialect::Sh, STDLIB_ACTIVATE);

        script.set_vpath("/new/root").unwrap();
        let once = fs::read_to_string(script.path()).unwrap();
        script.set_vpath("/new/root").unwrap();

        assert_eq!(fs::read_to_string(script.path()).unwrap(), once);
    }

    #[test]
    fn test_dialect_table_order() {
        for (index, dialect) in Dialect::ALL.iter().enumerate() {
            assert_eq!(*dialect as usize, index);
        }
        assert_eq!(Dialect::Sh.strategy(), RewriteStrategy::EveryOccurrence);
        assert_eq!(Dialect::NuDeactivateAlias.file_name(), "activate.nu");
        assert!(Dialect::NuDeactivateAlias.is_conditional());
    }
}
