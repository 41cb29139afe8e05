//! Status reporting
//!
//! The executor never prints directly; it reports through a [`Reporter`].

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use console::style;

/// Terminal status of a task visited during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
    Skipped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => f.write_str("OK"),
            Status::Error => f.write_str("ERROR"),
            Status::Skipped => f.write_str("SKIPPED"),
        }
    }
}

/// Receives task statuses and debug output from the executor
pub trait Reporter: Send + Sync {
    /// Called exactly once for every task visited
    fn status(&self, task: &str, status: Status, elapsed: Option<Duration>);

    /// Debug-level output: commands being run and captured output
    fn debug(&self, message: &str);
}

/// Prints status lines to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn status(&self, task: &str, status: Status, elapsed: Option<Duration>) {
        let label = match status {
            Status::Ok => style(status.to_string()).green(),
            Status::Error => style(status.to_string()).red(),
            Status::Skipped => style(status.to_string()).cyan(),
        };

        match elapsed {
            Some(elapsed) => println!(
                "[ {} ] {} {}",
                label,
                style(task).bold(),
                style(format!("{:.2}s", elapsed.as_secs_f64())).dim()
            ),
            None => println!("[ {} ] {}", label, style(task).bold()),
        }
    }

    fn debug(&self, message: &str) {
        if self.verbose {
            println!("{}", style(message).dim());
        }
    }
}

/// Keeps every status in memory, in the order reported.
///
/// A testing aid for code that drives an [`Executor`](crate::Executor) and
/// wants to assert on the exact status sequence instead of console output.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    statuses: Mutex<Vec<(String, Status)>>,
    messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses reported so far
    pub fn statuses(&self) -> Vec<(String, Status)> {
        self.statuses
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Debug messages reported so far
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn status(&self, task: &str, status: Status, _elapsed: Option<Duration>) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.push((task.to_string(), status));
        }
    }

    fn debug(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
