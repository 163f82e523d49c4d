use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Unknown,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by, or while talking to, the indexing backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend http error kind={kind} url={url}: {message}")]
    Transport {
        kind: TransportKind,
        url: String,
        message: String,
    },
    /// Non-2xx response. `detail` is the backend's own `detail` text when it sent one.
    #[error("backend http error kind=status status={status} url={url}: {detail}")]
    Status {
        status: u16,
        url: String,
        detail: String,
    },
    #[error("backend http error kind=decode url={url}: {message}")]
    Decode { url: String, message: String },
}

impl BackendError {
    /// Text shown to the user; backend-supplied details pass through unchanged.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Transport { message, .. } => message,
            Self::Status { detail, .. } => detail,
            Self::Decode { message, .. } => message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_and_user_message() {
        let err = BackendError::Status {
            status: 404,
            url: "http://localhost:8000/templates/9".into(),
            detail: "Template not found".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("kind=status"));
        assert!(msg.contains("status=404"));
        assert_eq!(err.user_message(), "Template not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_transport_display() {
        let err = BackendError::Transport {
            kind: TransportKind::Connect,
            url: "http://localhost:8000/status/1".into(),
            message: "connection refused".into(),
        };
        assert!(err.to_string().contains("kind=connect"));
        assert_eq!(err.status(), None);
    }
}
