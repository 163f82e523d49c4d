//! Terminal rendering of workbench notifications.

use std::sync::Mutex;
use std::time::Duration;

use codelib_core::api::{Notifier, Severity};
use indicatif::{ProgressBar, ProgressStyle};

/// Prints notifications to stderr and shows a spinner while requests are in flight.
pub struct TerminalNotifier {
    spinner: Mutex<Option<ProgressBar>>,
    interactive: bool,
}

impl TerminalNotifier {
    pub fn new(interactive: bool) -> Self {
        Self {
            spinner: Mutex::new(None),
            interactive,
        }
    }

    /// Spinner only when stderr is a terminal.
    pub fn detect(quiet: bool) -> Self {
        Self::new(!quiet && atty::is(atty::Stream::Stderr))
    }
}

fn prefix(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Success => "ok",
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

pub fn format_line(message: &str, severity: Severity) -> String {
    format!("[{}] {}", prefix(severity), message)
}

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        tracing::debug!(target: "codelib.notify", severity = %severity, "{}", message);
        let line = format_line(message, severity);
        let guard = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(bar) => bar.suspend(|| eprintln!("{line}")),
            None => eprintln!("{line}"),
        }
    }

    fn set_loading(&self, loading: bool) {
        if !self.interactive {
            return;
        }
        let mut guard = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if loading {
            if guard.is_none() {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                {
                    bar.set_style(
                        style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
                    );
                }
                bar.set_message("working...");
                bar.enable_steady_tick(Duration::from_millis(100));
                *guard = Some(bar);
            }
        } else if let Some(bar) = guard.take() {
            bar.finish_and_clear();
        }
    }
}
