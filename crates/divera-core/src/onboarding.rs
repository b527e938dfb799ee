// ── Onboarding ──
//
// One-shot account inspection used before any subscription exists: verify
// the access key, list the cluster relations, and validate the user's
// choices.

use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;
use tracing::debug;
use url::Url;

use divera_api::{DiveraClient, TransportConfig};

use crate::client::Client;
use crate::error::CoreError;
use crate::model::{ClusterInfo, ClusterVersion, Snapshot, names_match};

/// What an access key gives access to.
#[derive(Debug, Clone, Serialize)]
pub struct AccountOverview {
    pub full_name: String,
    pub email: Option<String>,
    pub clusters: Vec<ClusterInfo>,
    pub default_ucr: Option<i64>,
    pub active_ucr: Option<i64>,
    pub cluster_version: ClusterVersion,
    /// `false` for monitor-only accounts.
    pub supported: bool,
}

impl From<&Snapshot> for AccountOverview {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            full_name: snapshot.full_name(),
            email: snapshot.email().map(str::to_owned),
            clusters: snapshot.clusters.values().cloned().collect(),
            default_ucr: snapshot.default_ucr,
            active_ucr: snapshot.active_ucr,
            cluster_version: snapshot.cluster_version(),
            supported: snapshot.is_supported_account(),
        }
    }
}

impl AccountOverview {
    /// Resolve cluster names (case-insensitive) to UCR ids.
    ///
    /// Every name must match; an empty selection picks the default relation.
    pub fn select_clusters<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<i64>, CoreError> {
        if names.is_empty() {
            return Ok(self.default_ucr.into_iter().collect());
        }
        names
            .iter()
            .map(|wanted| {
                let wanted = wanted.as_ref().trim();
                self.clusters
                    .iter()
                    .find(|c| names_match(&c.name, wanted))
                    .map(|c| c.ucr_id)
                    .ok_or_else(|| CoreError::Validation {
                        field: "clusters",
                        reason: format!(
                            "'{wanted}' is not one of: {}",
                            self.cluster_names().join(", ")
                        ),
                    })
            })
            .collect()
    }

    pub fn cluster_names(&self) -> Vec<&str> {
        self.clusters.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_multiple_clusters(&self) -> bool {
        self.clusters.len() > 1
    }
}

/// Pull once with `access_key` and summarize the account.
///
/// Auth and connection failures come back as [`CoreError::Auth`] and
/// [`CoreError::Connection`] / [`CoreError::Timeout`] so the caller can
/// tell the user which one to fix.
pub async fn probe_account(
    access_key: SecretString,
    base_url: Url,
    transport: &TransportConfig,
) -> Result<AccountOverview, CoreError> {
    let api = DiveraClient::new(base_url, access_key, transport)?;
    let client = Client::new(Arc::new(api), None);
    let snapshot = client.pull().await?;
    let overview = AccountOverview::from(snapshot.as_ref());
    debug!(
        clusters = overview.clusters.len(),
        supported = overview.supported,
        "account probed"
    );
    Ok(overview)
}
