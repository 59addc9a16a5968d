//! Error types for the request layer
//!
//! Transport functions fail with any `anyhow::Error`; the engine folds it into
//! a [`NetworkError`] so views see one shape regardless of where it came from.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub const ABORT_CODE: &str = "ABORT_ERR";
pub const NOT_FOUND_CODE: &str = "ERR_NOT_FOUND";

/// Registry lookup failures (programmer errors)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Request '{0}' not found.")]
    NotFound(String),

    #[error("Request '{0}' is registered with different params or payload types")]
    TypeMismatch(String),
}

/// Failures raised by transport functions
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request aborted")]
    Aborted,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    MissingParam(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TransportError::Aborted => ABORT_CODE,
            TransportError::Status { .. } => "ERR_BAD_RESPONSE",
            TransportError::MissingParam(_) => "ERR_MISSING_PARAM",
            TransportError::InvalidResponse(_) => "ERR_INVALID_RESPONSE",
            TransportError::Request(e) => reqwest_code(e),
        }
    }
}

fn reqwest_code(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "ETIMEDOUT"
    } else if e.is_status() {
        "ERR_BAD_RESPONSE"
    } else if e.is_decode() {
        "ERR_INVALID_RESPONSE"
    } else {
        "ERR_NETWORK"
    }
}

/// Normalized error stored in a live request's `error` cell
#[derive(Error, Clone)]
#[error("{message}")]
pub struct NetworkError {
    pub message: String,
    pub status: Option<u16>,
    pub code: Option<String>,
    pub cause: Option<Arc<anyhow::Error>>,
}

impl NetworkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: None,
            cause: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Fold an arbitrary transport failure into the uniform shape. The
    /// first status/code found while walking the source chain wins.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        let mut status = None;
        let mut code = None;

        for cause in err.chain() {
            if let Some(t) = cause.downcast_ref::<TransportError>() {
                status = status.or(t.status());
                code = code.or_else(|| Some(t.code().to_string()));
            } else if let Some(r) = cause.downcast_ref::<reqwest::Error>() {
                status = status.or(r.status().map(|s| s.as_u16()));
                code = code.or_else(|| Some(reqwest_code(r).to_string()));
            } else if let Some(n) = cause.downcast_ref::<NetworkError>() {
                status = status.or(n.status);
                code = code.or_else(|| n.code.clone());
            }
        }

        let message = err.to_string();
        Self {
            message: if message.is_empty() {
                "Network error".to_string()
            } else {
                message
            },
            status,
            code,
            cause: Some(Arc::new(err)),
        }
    }

    pub fn is_abort(&self) -> bool {
        self.code.as_deref() == Some(ABORT_CODE)
    }
}

impl From<RegistryError> for NetworkError {
    fn from(err: RegistryError) -> Self {
        NetworkError::new(err.to_string()).with_code(NOT_FOUND_CODE)
    }
}

impl fmt::Debug for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkError")
            .field("message", &self.message)
            .field("status", &self.status)
            .field("code", &self.code)
            .finish_non_exhaustive()
    }
}

impl PartialEq for NetworkError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message && self.status == other.status && self.code == other.code
    }
}

/// Whether a failure is a cancellation rather than a real error
pub fn is_abort_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<TransportError>(),
            Some(TransportError::Aborted)
        ) || cause
            .downcast_ref::<NetworkError>()
            .is_some_and(NetworkError::is_abort)
    })
}

/// Default retry policy: 408, 429 and any 5xx
pub fn default_retryable(status: Option<u16>) -> bool {
    match status {
        Some(408) | Some(429) => true,
        Some(s) => s >= 500,
        None => false,
    }
}
