// ── Runtime subscription configuration ──
//
// These types describe *what* to poll and how often. They carry the access
// key and transport tuning but never touch disk; `divera-config` (or any
// other host) builds them and hands them in.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use divera_api::{TlsMode, TransportConfig};

use crate::error::CoreError;

// ── Poll interval ────────────────────────────────────────────────────

/// Seconds between scheduled pulls, constrained to `10..=300`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PollInterval(u64);

impl PollInterval {
    pub const MIN_SECS: u64 = 10;
    pub const MAX_SECS: u64 = 300;
    pub const DEFAULT_SECS: u64 = 60;

    pub fn from_secs(secs: u64) -> Result<Self, CoreError> {
        if (Self::MIN_SECS..=Self::MAX_SECS).contains(&secs) {
            Ok(Self(secs))
        } else {
            Err(CoreError::Validation {
                field: "scan_interval",
                reason: format!(
                    "{secs}s is outside {}..={} seconds",
                    Self::MIN_SECS,
                    Self::MAX_SECS
                ),
            })
        }
    }

    /// Parse user input, distinguishing non-numbers from out-of-range values.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let secs = input
            .trim()
            .parse::<u64>()
            .map_err(|_| CoreError::Validation {
                field: "scan_interval",
                reason: format!("'{input}' is not a whole number of seconds"),
            })?;
        Self::from_secs(secs)
    }

    pub fn as_secs(self) -> u64 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for PollInterval {
    fn default() -> Self {
        Self(Self::DEFAULT_SECS)
    }
}

impl fmt::Display for PollInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

// ── Vehicle naming ───────────────────────────────────────────────────

/// Which vehicle name variant to show in entity names.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VehicleNameMode {
    /// Short name, then name, then full name, then the vehicle id.
    #[default]
    Auto,
    Shortname,
    Name,
    Fullname,
}

impl VehicleNameMode {
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        input.trim().parse().map_err(|_| CoreError::Validation {
            field: "vehicle_name_mode",
            reason: format!("'{input}' is not one of auto, shortname, name, fullname"),
        })
    }
}

// ── Base URL ─────────────────────────────────────────────────────────

/// Parse a service base URL. HTTPS is required except for loopback hosts.
pub fn validate_base_url(input: &str) -> Result<Url, CoreError> {
    let url = Url::parse(input.trim()).map_err(|e| CoreError::Validation {
        field: "base_url",
        reason: format!("'{input}' is not a valid URL: {e}"),
    })?;

    let loopback = matches!(
        url.host_str(),
        Some("localhost" | "127.0.0.1" | "[::1]" | "::1")
    );
    match url.scheme() {
        "https" => Ok(url),
        "http" if loopback => Ok(url),
        scheme => Err(CoreError::Validation {
            field: "base_url",
            reason: format!("scheme '{scheme}' not allowed, use https"),
        }),
    }
}

/// The public service endpoint.
pub fn default_base_url() -> Url {
    Url::parse(divera_api::DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL")
}

// ── Subscriptions ────────────────────────────────────────────────────

/// One polled cluster relation.
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub access_key: SecretString,
    pub base_url: Url,
    /// User-cluster relation. `None` polls the account's default relation.
    pub ucr_id: Option<i64>,
    pub poll_interval: PollInterval,
    pub timeout: Duration,
    pub tls: TlsMode,
}

impl SubscriptionConfig {
    pub fn new(access_key: SecretString, ucr_id: Option<i64>) -> Self {
        Self {
            access_key,
            base_url: default_base_url(),
            ucr_id,
            poll_interval: PollInterval::default(),
            timeout: Duration::from_secs(30),
            tls: TlsMode::System,
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}

/// One access key polled for one or more cluster relations.
///
/// All subscriptions of an account share a single HTTP client.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub access_key: SecretString,
    pub base_url: Url,
    /// Relations to poll. Empty means "the account's default relation".
    pub ucr_ids: Vec<i64>,
    pub poll_interval: PollInterval,
    pub timeout: Duration,
    pub tls: TlsMode,
    pub vehicle_name_mode: VehicleNameMode,
}

impl AccountConfig {
    pub fn new(access_key: SecretString) -> Self {
        Self {
            access_key,
            base_url: default_base_url(),
            ucr_ids: Vec::new(),
            poll_interval: PollInterval::default(),
            timeout: Duration::from_secs(30),
            tls: TlsMode::System,
            vehicle_name_mode: VehicleNameMode::default(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }

    /// Expand into one subscription per relation. Repeated ids collapse
    /// into the first occurrence.
    pub fn subscriptions(&self) -> Vec<SubscriptionConfig> {
        let ucrs: Vec<Option<i64>> = if self.ucr_ids.is_empty() {
            vec![None]
        } else {
            let mut seen = HashSet::new();
            self.ucr_ids
                .iter()
                .copied()
                .filter(|id| seen.insert(*id))
                .map(Some)
                .collect()
        };
        ucrs.into_iter()
            .map(|ucr_id| SubscriptionConfig {
                access_key: self.access_key.clone(),
                base_url: self.base_url.clone(),
                ucr_id,
                poll_interval: self.poll_interval,
                timeout: self.timeout,
                tls: self.tls.clone(),
            })
            .collect()
    }
}
