// divera-api: Async Rust client for the DIVERA 24/7 REST API (v2)

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::DiveraClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};

/// Public production endpoint of the DIVERA 24/7 service.
pub const DEFAULT_BASE_URL: &str = "https://app.divera247.com";

// Endpoint paths are relative, so they resolve below any path prefix the
// base URL carries (e.g. behind a reverse proxy).

/// Pull-all endpoint: everything the account can see for one cluster relation.
pub const PULL_ALL_PATH: &str = "api/v2/pull/all";

/// Status-setter endpoint for the account owner's personnel status.
pub const SET_STATUS_PATH: &str = "api/v2/statusgeber/set-status";

/// Probe (test) alarm endpoint.
pub const PROBE_ALARM_PATH: &str = "api/v2/alarms/probe";
