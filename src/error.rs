use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The two user-triggered requests this client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Discovery,
    Diagnostics,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Discovery => "discovery",
            Operation::Diagnostics => "diagnostics",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single discovery or diagnostics request.
///
/// None of these are fatal: the owning component resets its busy flag,
/// leaves its state untouched and logs the error.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("malformed response body: {0}")]
    Decode(String),

    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
}

impl TelemetryError {
    /// Stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryError::Transport(_) => "transport",
            TelemetryError::Status { .. } => "protocol",
            TelemetryError::Decode(_) => "decode",
            TelemetryError::TimedOut(_) => "timed_out",
        }
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        TelemetryError::Decode(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid request timeout {0:?}: expected a positive number of seconds")]
    InvalidTimeout(String),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
