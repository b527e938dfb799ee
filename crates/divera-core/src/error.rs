// ── Core error types ──
//
// User-facing errors from divera-core. Hosts match on these variants (or on
// `ErrorClass`) to tell a rejected access key apart from an unreachable
// service. The `From<divera_api::Error>` impl does the translation.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote failures ──────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Cannot reach DIVERA: {message}")]
    Connection { message: String },

    #[error("Request to DIVERA timed out: {message}")]
    Timeout { message: String },

    #[error("DIVERA rejected the request: {message}")]
    Api {
        message: String,
        /// HTTP status code (if one was received).
        status: Option<u16>,
        /// Raw response body, for diagnostics.
        body: String,
    },

    // ── Local state ──────────────────────────────────────────────────
    #[error("No data yet{}", .ucr_id.map(|id| format!(" for subscription {id}")).unwrap_or_default())]
    NotReady { ucr_id: Option<i64> },

    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    #[error("Unknown status '{name}' (available: {})", .available.join(", "))]
    StatusNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure class, used for logging and for host-side branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorClass {
    Auth,
    Connection,
    Api,
    Other,
}

impl CoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Auth { .. } => ErrorClass::Auth,
            Self::Connection { .. } | Self::Timeout { .. } => ErrorClass::Connection,
            Self::Api { .. } => ErrorClass::Api,
            _ => ErrorClass::Other,
        }
    }

    pub fn is_auth(&self) -> bool {
        self.class() == ErrorClass::Auth
    }

    pub fn is_connection(&self) -> bool {
        self.class() == ErrorClass::Connection
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<divera_api::Error> for CoreError {
    fn from(err: divera_api::Error) -> Self {
        match err {
            divera_api::Error::Authentication { status, message } => CoreError::Auth {
                message: format!("{message} (HTTP {status})"),
            },
            divera_api::Error::Transport(ref e) if e.is_timeout() => CoreError::Timeout {
                message: e.to_string(),
            },
            divera_api::Error::Transport(e) => CoreError::Connection {
                message: e.to_string(),
            },
            divera_api::Error::Server { status, .. } => CoreError::Connection {
                message: format!("server error (HTTP {status})"),
            },
            divera_api::Error::Deserialization { message, .. } => CoreError::Connection {
                message: format!("unusable response: {message}"),
            },
            divera_api::Error::Tls(msg) => CoreError::Connection {
                message: format!("TLS error: {msg}"),
            },
            divera_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            divera_api::Error::Api {
                status,
                message,
                body,
            } => CoreError::Api {
                message,
                status: Some(status),
                body,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_maps_to_auth_class() {
        let err: CoreError = divera_api::Error::Authentication {
            status: 403,
            message: "denied".into(),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::Auth);
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn server_and_parse_failures_are_connection_class() {
        let server: CoreError = divera_api::Error::Server {
            status: 502,
            body: String::new(),
        }
        .into();
        let parse: CoreError = divera_api::Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        }
        .into();
        assert!(server.is_connection());
        assert!(parse.is_connection());
    }

    #[test]
    fn api_rejection_keeps_status_and_body() {
        let err: CoreError = divera_api::Error::Api {
            status: 422,
            message: "bad".into(),
            body: "{}".into(),
        }
        .into();
        match err {
            CoreError::Api { status, body, .. } => {
                assert_eq!(status, Some(422));
                assert_eq!(body, "{}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn status_not_found_lists_alternatives() {
        let err = CoreError::StatusNotFound {
            name: "bogus".into(),
            available: vec!["available".into(), "on duty".into()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown status 'bogus' (available: available, on duty)"
        );
        assert_eq!(err.class(), ErrorClass::Other);
    }
}
