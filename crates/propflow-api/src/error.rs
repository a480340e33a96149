use thiserror::Error;

/// Top-level error type for the `propflow-api` crate.
///
/// Covers every failure mode at the wire: transport, authentication, and
/// the four business-facing classes the stores care about (validation,
/// conflict, not-found, generic API failure). `propflow-core` maps these
/// into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Authentication ──────────────────────────────────────────────
    /// Token rejected or session expired (HTTP 401).
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    // ── Business errors (per the response envelope) ─────────────────
    /// 4xx with a field-level or general message.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        /// The offending field, when the server attributes one.
        field: Option<String>,
        status: u16,
    },

    /// Business-rule violation (HTTP 409), e.g. unit no longer free.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// HTTP 404. Some flows treat this as a normal, recoverable outcome
    /// (no allotment letter yet, no previous broker) rather than a failure.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Envelope-level failure (`success: false`) or 5xx.
    #[error("API error (HTTP {status}): {message}")]
    Api { message: String, status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
            || matches!(self, Self::Transport(e) if e.status() == Some(reqwest::StatusCode::NOT_FOUND))
    }

    /// Returns `true` if this is a business-rule conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// The server-supplied message, when one exists.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Validation { message, .. }
            | Self::Conflict { message }
            | Self::Api { message, .. }
            | Self::Auth { message } => Some(message),
            _ => None,
        }
    }
}
