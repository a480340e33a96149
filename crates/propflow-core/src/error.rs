// ── Core error types ──
//
// User-facing errors from propflow-core. Consumers never see HTTP status
// codes or JSON parse failures directly -- the `From<propflow_api::Error>`
// impl translates wire-layer errors into the four classes screens render
// (transport, validation, conflict, not-found) plus config/internal.

use thiserror::Error;

/// Unified error type for the core crate.
///
/// Nothing here is fatal: every store operation resolves its error into
/// the store's `error` state as well as returning it, and all failures
/// are recoverable by retry or navigation.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport ────────────────────────────────────────────────────
    #[error("Cannot reach back office: {reason}")]
    Transport { reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Business errors ──────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        /// Offending field, when the server (or a client-side gate)
        /// attributes one.
        field: Option<String>,
    },

    /// Business-rule violation (unit no longer free, customer already
    /// booked). Must be tolerated post-submit too: the client-side
    /// availability check is a best-effort prefetch, not a lock.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Entity absent. Some flows treat this as a normal outcome and
    /// never surface it as an error (allotment letter, previous broker).
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation failed: {message}")]
    OperationFailed { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Message suitable for the store's `error` state / an alert banner.
    pub fn display_message(&self) -> String {
        self.to_string()
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from wire-layer errors ────────────────────────────────

impl From<propflow_api::Error> for CoreError {
    fn from(err: propflow_api::Error) -> Self {
        match err {
            propflow_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else {
                    CoreError::Transport {
                        reason: e.to_string(),
                    }
                }
            }
            propflow_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            propflow_api::Error::Tls(msg) => CoreError::Transport {
                reason: format!("TLS error: {msg}"),
            },
            propflow_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            propflow_api::Error::Auth { message } => CoreError::AuthenticationFailed { message },
            propflow_api::Error::Validation { message, field, .. } => {
                CoreError::Validation { message, field }
            }
            propflow_api::Error::Conflict { message } => CoreError::Conflict { message },
            propflow_api::Error::NotFound { resource } => CoreError::NotFound { resource },
            propflow_api::Error::Api { message, .. } => CoreError::OperationFailed { message },
            propflow_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
