use thiserror::Error;

/// Top-level error type for the `divera-api` crate.
///
/// Every failure of a request lands in exactly one of three buckets:
/// credentials ([`Authentication`](Error::Authentication)), reachability
/// (`Transport`, `Server`, `Deserialization`, `Tls`) or a well-formed
/// rejection by the service ([`Api`](Error::Api)). `divera-core` maps these
/// into its own user-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The access key was rejected (HTTP 401/403, or a `success: false`
    /// envelope naming the access key).
    #[error("Authentication failed (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error (bad CA bundle, client builder failure).
    #[error("TLS error: {0}")]
    Tls(String),

    /// The service answered with a 5xx status.
    #[error("Server error (HTTP {status})")]
    Server { status: u16, body: String },

    // ── API ─────────────────────────────────────────────────────────
    /// Well-formed rejection: a non-auth 4xx status, or a
    /// `{"success": false}` envelope.
    #[error("DIVERA API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the access key was rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if the service could not be reached or did not
    /// answer with something usable.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Server { .. } | Self::Deserialization { .. } | Self::Tls(_)
        )
    }

    /// Returns `true` for request timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// HTTP status attached to the error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. }
            | Self::Server { status, .. }
            | Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
