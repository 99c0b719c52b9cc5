//! Test-flow reporting.
//!
//! Page objects and the harness narrate what they do through a [`Reporter`]
//! handed to them at construction. [`ConsoleReporter`] prints the
//! human-facing transcript and mirrors every line into `tracing`;
//! [`MemoryReporter`] captures lines for assertions in tests.

use std::sync::Mutex;

use tracing::{error, info, warn};

/// Width of the banner rule printed around scenario boundaries.
pub const SEPARATOR_WIDTH: usize = 51;

/// Severity of a reported line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

fn separator() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

/// Sink for test-flow messages.
///
/// Only [`emit`](Reporter::emit) is required; the remaining methods format
/// the standard step and banner lines on top of it.
pub trait Reporter: Send + Sync {
    /// Record one (possibly multi-line) message.
    fn emit(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    /// An indented step annotation inside a scenario.
    fn step(&self, description: &str) {
        self.emit(Level::Info, &format!("  → {description}"));
    }

    fn test_start(&self, name: &str) {
        let sep = separator();
        self.emit(Level::Info, &format!("\n{sep}\n▶ TEST STARTED: {name}\n{sep}"));
    }

    fn test_passed(&self, name: &str) {
        let sep = separator();
        self.emit(Level::Info, &format!("{sep}\n✓ TEST PASSED: {name}\n{sep}\n"));
    }

    fn test_failed(&self, name: &str, error: &str) {
        let sep = separator();
        self.emit(
            Level::Error,
            &format!("{sep}\n✗ TEST FAILED: {name}\nError: {error}\n{sep}\n"),
        );
    }
}

/// Prints `[LEVEL] message` to stdout and forwards the message to `tracing`
/// under the `muzz_qa` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter that only forwards to `tracing`, leaving stdout free for
    /// machine-readable output.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

impl Reporter for ConsoleReporter {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::Info => info!(target: "muzz_qa", "{message}"),
            Level::Warn => warn!(target: "muzz_qa", "{message}"),
            Level::Error => error!(target: "muzz_qa", "{message}"),
        }
        if !self.quiet {
            println!("[{}] {message}", level.label());
        }
    }
}

/// Collects every emitted line in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Returns `true` if any line at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn emit(&self, level: Level, message: &str) {
        if let Ok(mut guard) = self.lines.lock() {
            guard.push((level, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_is_indented_with_arrow() {
        let reporter = MemoryReporter::new();
        reporter.step("Entering username");
        assert_eq!(
            reporter.lines(),
            vec![(Level::Info, "  → Entering username".to_string())]
        );
    }

    #[test]
    fn banners_use_full_separator() {
        let reporter = MemoryReporter::new();
        reporter.test_start("testSuccessfulLogin");
        reporter.test_failed("testSuccessfulLogin", "boom");

        let lines = reporter.lines();
        let sep = "=".repeat(51);
        assert!(lines[0].1.starts_with(&format!("\n{sep}\n")));
        assert!(lines[0].1.contains("▶ TEST STARTED: testSuccessfulLogin"));
        assert_eq!(lines[1].0, Level::Error);
        assert!(lines[1].1.contains("✗ TEST FAILED: testSuccessfulLogin\nError: boom"));
    }

    #[test]
    fn passed_banner_at_info() {
        let reporter = MemoryReporter::new();
        reporter.test_passed("testUserCanLikeProfile");
        assert!(reporter.contains(Level::Info, "✓ TEST PASSED: testUserCanLikeProfile"));
        assert!(!reporter.contains(Level::Error, "testUserCanLikeProfile"));
    }

    #[test]
    fn level_labels() {
        assert_eq!(Level::Info.label(), "INFO");
        assert_eq!(Level::Warn.label(), "WARN");
        assert_eq!(Level::Error.label(), "ERROR");
    }
}
