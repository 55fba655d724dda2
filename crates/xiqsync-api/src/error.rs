use thiserror::Error;

/// Top-level error type for the `xiqsync-api` crate.
///
/// Covers every failure mode of the remote API surface: authentication,
/// the retrying request layer, page payloads, and raw transport.
/// `xiqsync-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login was rejected, or the login response carried no token.
    ///
    /// `status` is `None` when the login exchange never produced an HTTP
    /// response (connection refused, timeout).
    #[error("Authentication failed{}: {message}", fmt_status(.status))]
    Authentication { status: Option<u16>, message: String },

    // ── Request layer ───────────────────────────────────────────────
    /// A data request failed for good: a non-retryable status, or the
    /// retry budget ran out.
    #[error("{method} {path} failed after {attempts} attempt(s){}: {message}", fmt_status(.status))]
    Request {
        method: String,
        path: String,
        status: Option<u16>,
        attempts: u32,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// A page payload did not have the expected `{ "data": [...] }` shape.
    #[error("Malformed response from {path}: {message}")]
    MalformedResponse { path: String, message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),
}

#[allow(clippy::ref_option)]
fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl Error {
    /// Returns `true` if the remote API rejected our credentials.
    /// Such failures end the whole sync run.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` for transport-level failures worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Request { status, .. } => status.is_none() || *status == Some(429),
            _ => false,
        }
    }

    /// The HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::Request { status, .. } => *status,
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_message_carries_status_and_attempts() {
        let err = Error::Request {
            method: "GET".into(),
            path: "/devices".into(),
            status: Some(503),
            attempts: 3,
            message: "Service Unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "GET /devices failed after 3 attempt(s) (HTTP 503): Service Unavailable"
        );
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_transient());
    }

    #[test]
    fn authentication_without_status_omits_it() {
        let err = Error::Authentication {
            status: None,
            message: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "Authentication failed: connection refused");
        assert!(err.is_auth_failure());
    }

    #[test]
    fn exhausted_rate_limit_is_transient() {
        let err = Error::Request {
            method: "GET".into(),
            path: "/devices".into(),
            status: Some(429),
            attempts: 3,
            message: "Too Many Requests".into(),
        };
        assert!(err.is_transient());
    }
}
