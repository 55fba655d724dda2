// ── Core error types ──
//
// Errors surfaced by the sync engine. The `From<xiqsync_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        message: String,
        status: Option<u16>,
    },

    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Failure reported by an [`InventoryStore`](crate::store::InventoryStore)
/// implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("host '{hostname}' could not be loaded: {reason}")]
    Load { hostname: String, reason: String },

    #[error("host '{hostname}' could not be saved: {reason}")]
    Save { hostname: String, reason: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<xiqsync_api::Error> for CoreError {
    fn from(err: xiqsync_api::Error) -> Self {
        match err {
            xiqsync_api::Error::Authentication { status, message } => {
                Self::AuthenticationFailed { message, status }
            }
            xiqsync_api::Error::Transport(ref e) if e.is_connect() || e.is_timeout() => {
                Self::ConnectionFailed {
                    url: e.url().map(ToString::to_string).unwrap_or_default(),
                    reason: e.to_string(),
                }
            }
            xiqsync_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            xiqsync_api::Error::Tls(msg) => Self::Config {
                message: format!("TLS error: {msg}"),
            },
            other => Self::Api {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_authentication_maps_to_domain_variant() {
        let err = CoreError::from(xiqsync_api::Error::Authentication {
            status: Some(401),
            message: "login rejected".into(),
        });
        assert!(matches!(
            err,
            CoreError::AuthenticationFailed {
                status: Some(401),
                ..
            }
        ));
    }

    #[test]
    fn request_error_keeps_status() {
        let err = CoreError::from(xiqsync_api::Error::Request {
            method: "GET".into(),
            path: "/devices".into(),
            status: Some(500),
            attempts: 1,
            message: "boom".into(),
        });
        match err {
            CoreError::Api { status, message } => {
                assert_eq!(status, Some(500));
                assert!(message.contains("/devices"));
            }
            other => panic!("expected Api error, got: {other:?}"),
        }
    }

    #[test]
    fn tls_problem_is_configuration() {
        let err = CoreError::from(xiqsync_api::Error::Tls("bad pem".into()));
        assert!(matches!(err, CoreError::Config { .. }));
    }
}
