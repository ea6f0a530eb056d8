//! Status lines for the terminal: a right-aligned coloured label, then the message.

use anstyle::{AnsiColor, Style};
use is_terminal::IsTerminal;
use std::fmt::{Display, Write as _};
use std::io::{self, Write};
use std::time::{Duration, Instant};

const LABEL_WIDTH: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Step,
    Done,
    Note,
    Warning,
    Failure,
}

impl Tone {
    fn color(self) -> AnsiColor {
        match self {
            Tone::Step => AnsiColor::Cyan,
            Tone::Done => AnsiColor::Green,
            Tone::Note => AnsiColor::Blue,
            Tone::Warning => AnsiColor::Yellow,
            Tone::Failure => AnsiColor::Red,
        }
    }

    fn on_stderr(self) -> bool {
        matches!(self, Tone::Warning | Tone::Failure)
    }
}

fn render(tone: Tone, label: &str, message: &str, colored: bool) -> String {
    let style = if colored {
        Style::new().bold().fg_color(Some(tone.color().into()))
    } else {
        Style::new()
    };

    let mut text = String::new();
    for (idx, line) in message.split('\n').enumerate() {
        let _ = if idx == 0 {
            writeln!(text, "{style}{label:>LABEL_WIDTH$}{style:#} {line}")
        } else {
            writeln!(text, "{:>LABEL_WIDTH$} {line}", "")
        };
    }
    text
}

fn emit(tone: Tone, label: &str, message: impl Display) {
    let message = message.to_string();
    let no_color = std::env::var_os("NO_COLOR").is_some();

    // Best effort: a closed pipe is not an error.
    if tone.on_stderr() {
        let colored = io::stderr().is_terminal() && !no_color;
        let _ = io::stderr()
            .lock()
            .write_all(render(tone, label, &message, colored).as_bytes());
    } else {
        let colored = io::stdout().is_terminal() && !no_color;
        let mut out = io::stdout().lock();
        let _ = out.write_all(render(tone, label, &message, colored).as_bytes());
        let _ = out.flush();
    }
}

fn elapsed(duration: Duration) -> String {
    if duration.as_secs() >= 60 {
        format!("{}m {}s", duration.as_secs() / 60, duration.as_secs() % 60)
    } else if duration.as_millis() >= 1000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

pub fn status(label: &str, message: impl Display) {
    emit(Tone::Step, label, message);
}

pub fn info(message: impl Display) {
    emit(Tone::Note, "Info", message);
}

pub fn warn(message: impl Display) {
    emit(Tone::Warning, "Warning", message);
}

pub fn error(message: impl Display) {
    emit(Tone::Failure, "Error", message);
}

pub fn success(label: &str, message: impl Display) {
    emit(Tone::Done, label, message);
}

/// One announced step; `finish` or `fail` reports it with the time it took.
pub struct Progress {
    message: String,
    started: Instant,
}

impl Progress {
    pub fn start(label: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        emit(Tone::Step, label, &message);
        Self {
            message,
            started: Instant::now(),
        }
    }

    pub fn finish(self, label: &str, detail: Option<String>) {
        let took = elapsed(self.started.elapsed());
        let message = match detail {
            Some(detail) => format!("{} {detail} in {took}", self.message),
            None => format!("{} in {took}", self.message),
        };
        emit(Tone::Done, label, message);
    }

    pub fn fail(self, label: &str, error: impl Display) {
        let took = elapsed(self.started.elapsed());
        emit(
            Tone::Failure,
            label,
            format!("{} after {took}: {error}", self.message),
        );
    }
}
