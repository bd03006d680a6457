//! Styled terminal output for the CLI.

use console::{Term, style};
use std::fmt::Display;

/// Terminal output helper for consistent styled output.
pub struct Output {
    term: Term,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper writing to stdout.
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Print a success message with a green checkmark.
    pub fn success(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("✓").green().bold(), message)),
        );
    }

    /// Print an error message with a red X.
    pub fn error(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("✗").red().bold(), message)),
        );
    }

    pub fn print(&self, message: impl Display) {
        drop(self.term.write_line(&message.to_string()));
    }

    pub fn newline(&self) {
        drop(self.term.write_line(""));
    }

    /// Print a header with emphasis.
    pub fn header(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&style(message).bold().cyan().to_string()),
        );
    }

    /// Print a labeled value with indentation.
    pub fn labeled_indent(&self, label: impl Display, value: impl Display, indent: usize) {
        let spaces = " ".repeat(indent);
        drop(
            self.term
                .write_line(&format!("{spaces}{}: {}", style(label).dim(), value)),
        );
    }

    /// Print a dim/muted message.
    pub fn dim(&self, message: impl Display) {
        drop(self.term.write_line(&style(message).dim().to_string()));
    }

    /// Print a count summary.
    pub fn count(&self, label: impl Display, count: usize) {
        drop(self.term.write_line(&format!(
            "{}: {}",
            style(label).dim(),
            style(count).cyan().bold()
        )));
    }
}
