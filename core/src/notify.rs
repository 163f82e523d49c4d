//! Upward interface to whatever renders feedback to the user.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient notifications plus a busy indicator.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);

    fn set_loading(&self, _loading: bool) {}
}

/// Sends notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => tracing::error!(target: "codelib.notify", "{}", message),
            Severity::Warning => tracing::warn!(target: "codelib.notify", "{}", message),
            Severity::Info | Severity::Success => {
                tracing::info!(target: "codelib.notify", severity = %severity, "{}", message)
            }
        }
    }
}
