//! Failure taxonomy with a retryability verdict.
//!
//! | Failure | Kind | Retryable |
//! |---------|------|-----------|
//! | HTTP 403 / 429 | `blocked` | yes |
//! | HTTP 404 | `not_found` | no |
//! | HTTP >= 500 | `server_error` | yes |
//! | timeout | `timeout` | yes |
//! | DNS / connection refused | `unreachable` | no |
//! | anything else | `unknown` | no |
//!
//! `persistence_error` is only produced by the reconciler.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::fetch::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Blocked,
    NotFound,
    ServerError,
    Timeout,
    Unreachable,
    Unknown,
    PersistenceError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Blocked => "blocked",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::Unknown => "unknown",
            ErrorKind::PersistenceError => "persistence_error",
        };
        f.write_str(s)
    }
}

/// Normalised failure descriptor. Internal control-flow value only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ClassifiedError {
    fn new(kind: ErrorKind, message: String, retryable: bool) -> Self {
        Self { kind, message, retryable }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PersistenceError, message.into(), false)
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Classify a fetch failure. Pure apart from the log line it emits.
pub fn classify(error: &FetchError, source: &str) -> ClassifiedError {
    let message = error.to_string();
    let classified = match error {
        FetchError::Status { status: 403 | 429, .. } => {
            ClassifiedError::new(ErrorKind::Blocked, message, true)
        }
        FetchError::Status { status: 404, .. } => {
            ClassifiedError::new(ErrorKind::NotFound, message, false)
        }
        FetchError::Status { status, .. } if *status >= 500 => {
            ClassifiedError::new(ErrorKind::ServerError, message, true)
        }
        FetchError::Timeout { .. } => ClassifiedError::new(ErrorKind::Timeout, message, true),
        FetchError::Unreachable { .. } => {
            ClassifiedError::new(ErrorKind::Unreachable, message, false)
        }
        FetchError::Status { .. } | FetchError::Other { .. } => {
            ClassifiedError::new(ErrorKind::Unknown, message, false)
        }
    };
    warn!(
        source,
        kind = %classified.kind,
        retryable = classified.retryable,
        error = %classified.message,
        "Classified fetch error"
    );
    classified
}
