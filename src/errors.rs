//! Error types for the device monitor

use std::fmt;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug)]
pub enum MonitorError {
    /// Roster file missing, unreadable or not valid CSV
    FileAccess { path: String, source: csv::Error },

    /// Roster header lacks a required column
    MissingColumn { path: String, column: &'static str },

    /// Status lookup for one device failed
    CheckRequest { device_id: String, reason: CheckFailure },

    /// Sending an alert message failed
    NotifyRequest(String),

    /// Configuration error
    Config(String),

    /// HTTP client could not be built
    Http(reqwest::Error),

    /// Anything that escaped the narrower handlers
    Unhandled(String),
}

/// Why a status lookup produced no usable status
#[derive(Debug)]
pub enum CheckFailure {
    /// Connection, TLS, timeout or body read failure
    Transport(reqwest::Error),

    /// The API answered with a non-2xx status
    HttpStatus { status: u16, body: String },

    /// The body did not have the expected shape
    Malformed(String),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::FileAccess { path, source } => {
                write!(f, "cannot read roster {}: {}", path, source)
            }
            MonitorError::MissingColumn { path, column } => {
                write!(f, "roster {} has no \"{}\" column", path, column)
            }
            MonitorError::CheckRequest { reason, .. } => write!(f, "{}", reason),
            MonitorError::NotifyRequest(msg) => write!(f, "Notification failed: {}", msg),
            MonitorError::Config(msg) => write!(f, "Configuration error: {}", msg),
            MonitorError::Http(err) => write!(f, "HTTP error: {}", err),
            MonitorError::Unhandled(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckFailure::Transport(err) => write!(f, "{}", err),
            CheckFailure::HttpStatus { status, .. } => {
                write!(f, "Request failed with status code {}", status)
            }
            CheckFailure::Malformed(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::FileAccess { source, .. } => Some(source),
            MonitorError::CheckRequest { reason, .. } => Some(reason),
            MonitorError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for CheckFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckFailure::Transport(err) => Some(err),
            _ => None,
        }
    }
}
