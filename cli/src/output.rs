//! Styled terminal output.

use std::fmt::Display;

use console::{Term, style};
use origin_business::{Notification, NotificationKind};

pub struct Output {
    term: Term,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    fn line(&self, text: &str) {
        drop(self.term.write_line(text));
    }

    pub fn success(&self, message: impl Display) {
        self.line(&format!("{} {message}", style("✓").green().bold()));
    }

    pub fn error(&self, message: impl Display) {
        self.line(&format!("{} {message}", style("✗").red().bold()));
    }

    pub fn print(&self, message: impl Display) {
        self.line(&message.to_string());
    }

    pub fn newline(&self) {
        self.line("");
    }

    pub fn header(&self, message: impl Display) {
        self.line(&style(message).bold().cyan().to_string());
    }

    pub fn dim(&self, message: impl Display) {
        self.line(&style(message).dim().to_string());
    }

    pub fn labeled(&self, label: impl Display, value: impl Display) {
        self.line(&format!("  {}: {value}", style(label).dim()));
    }

    /// Print a queued notification with the icon of its kind.
    pub fn notification(&self, notification: &Notification) {
        match notification.kind {
            NotificationKind::Info => self.success(&notification.message),
            NotificationKind::Error => self.error(&notification.message),
        }
    }

    /// "page X of Y, Z assets"
    pub fn page_summary(&self, page: u32, total_pages: usize, total: usize) {
        self.line(&format!(
            "\n{} {} of {}, {}",
            style("page").dim(),
            style(page).cyan().bold(),
            style(total_pages.max(1)).cyan(),
            style(format!("{total} asset(s)")).cyan()
        ));
    }
}
