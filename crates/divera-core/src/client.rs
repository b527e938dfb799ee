// ── Per-subscription API client ──
//
// Owns the snapshot cache for one cluster relation and answers every read
// from it. Only `pull` and the two write actions touch the network.

use std::sync::Arc;

use indexmap::IndexMap;
use secrecy::SecretString;
use tracing::{debug, info};
use url::Url;

use divera_api::DiveraClient;

use crate::config::SubscriptionConfig;
use crate::error::CoreError;
use crate::model::{Alarm, ClusterVersion, Helper, Snapshot, Vehicle};
use crate::store::SnapshotCache;

/// API client for one subscription.
///
/// Several `Client`s may share one [`DiveraClient`] (same access key,
/// different cluster relations); each keeps its own snapshot.
pub struct Client {
    api: Arc<DiveraClient>,
    ucr_id: Option<i64>,
    cache: SnapshotCache,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("ucr_id", &self.ucr_id)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(api: Arc<DiveraClient>, ucr_id: Option<i64>) -> Self {
        Self {
            api,
            ucr_id,
            cache: SnapshotCache::new(),
        }
    }

    /// Build a client with its own HTTP transport.
    pub fn from_config(config: &SubscriptionConfig) -> Result<Self, CoreError> {
        let api = DiveraClient::new(
            config.base_url.clone(),
            config.access_key.clone(),
            &config.transport(),
        )?;
        Ok(Self::new(Arc::new(api), config.ucr_id))
    }

    // ── Network ──────────────────────────────────────────────────────

    /// Fetch and parse a snapshot without installing it.
    pub(crate) async fn fetch(&self) -> Result<Snapshot, CoreError> {
        let data = self.api.pull_all(self.ucr_id).await?;
        Ok(Snapshot::from(data))
    }

    /// Make a fetched snapshot the current one.
    pub(crate) fn install(&self, snapshot: Arc<Snapshot>) {
        self.cache.store(snapshot);
    }

    /// Fetch the pull-all document and replace the cached snapshot.
    pub async fn pull(&self) -> Result<Arc<Snapshot>, CoreError> {
        let snapshot = Arc::new(self.fetch().await?);
        self.install(Arc::clone(&snapshot));
        debug!(ucr = ?self.ucr_id, helpers = snapshot.helpers.len(), vehicles = snapshot.vehicles.len(), "snapshot updated");
        Ok(snapshot)
    }

    /// Set the account owner's personnel status by id.
    pub async fn set_user_status(&self, status_id: i64) -> Result<(), CoreError> {
        self.api.set_status(self.ucr_id, status_id).await?;
        info!(ucr = ?self.ucr_id, status_id, "user status set");
        Ok(())
    }

    pub async fn trigger_probe_alarm(&self) -> Result<(), CoreError> {
        self.api.trigger_probe_alarm(self.ucr_id).await?;
        info!(ucr = ?self.ucr_id, "probe alarm triggered");
        Ok(())
    }

    // ── Config-derived accessors ─────────────────────────────────────

    pub fn base_url(&self) -> &Url {
        self.api.base_url()
    }

    pub fn access_key(&self) -> &SecretString {
        self.api.access_key()
    }

    /// The configured cluster relation (`None` = account default).
    pub fn ucr_id(&self) -> Option<i64> {
        self.ucr_id
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    /// The current snapshot, or `NotReady` before the first successful pull.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>, CoreError> {
        self.cache.load().ok_or(CoreError::NotReady {
            ucr_id: self.ucr_id,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.cache.is_populated()
    }

    pub fn active_ucr_id(&self) -> Result<Option<i64>, CoreError> {
        Ok(self.snapshot()?.active_ucr)
    }

    pub fn default_ucr_id(&self) -> Result<Option<i64>, CoreError> {
        Ok(self.snapshot()?.default_ucr)
    }

    pub fn ucr_ids(&self) -> Result<Vec<i64>, CoreError> {
        Ok(self.snapshot()?.ucr_ids())
    }

    pub fn ucr_count(&self) -> Result<usize, CoreError> {
        Ok(self.snapshot()?.ucr_count())
    }

    pub fn cluster_name(&self, ucr_id: i64) -> Result<String, CoreError> {
        self.snapshot()?
            .cluster_name(ucr_id)
            .map(str::to_owned)
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "cluster",
                identifier: ucr_id.to_string(),
            })
    }

    pub fn cluster_names(&self) -> Result<Vec<String>, CoreError> {
        Ok(self
            .snapshot()?
            .cluster_names()
            .into_iter()
            .map(str::to_owned)
            .collect())
    }

    pub fn ucr_ids_for_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<i64>, CoreError> {
        Ok(self.snapshot()?.ucr_ids_for_names(names))
    }

    pub fn has_open_alarms(&self) -> Result<bool, CoreError> {
        Ok(self.snapshot()?.has_open_alarms())
    }

    pub fn last_alarm(&self) -> Result<Option<Alarm>, CoreError> {
        Ok(self.snapshot()?.last_alarm().cloned())
    }

    /// Personnel of the cluster; empty when the service sent none.
    pub fn helpers(&self) -> Result<Vec<Helper>, CoreError> {
        Ok(self.snapshot()?.helpers.clone())
    }

    pub fn vehicle_ids(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.snapshot()?.vehicles.keys().cloned().collect())
    }

    pub fn vehicle(&self, id: &str) -> Result<Vehicle, CoreError> {
        self.snapshot()?
            .vehicle(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "vehicle",
                identifier: id.to_owned(),
            })
    }

    /// FMS status of a vehicle (`None` if the vehicle reports none).
    pub fn vehicle_state(&self, id: &str) -> Result<Option<i64>, CoreError> {
        Ok(self.vehicle(id)?.fmsstatus_id)
    }

    pub fn current_user_status_name(&self) -> Result<Option<String>, CoreError> {
        Ok(self
            .snapshot()?
            .current_user_status_name()
            .map(str::to_owned))
    }

    pub fn status_names(&self) -> Result<IndexMap<i64, String>, CoreError> {
        Ok(self.snapshot()?.status_names.clone())
    }

    pub fn email(&self) -> Result<Option<String>, CoreError> {
        Ok(self.snapshot()?.email().map(str::to_owned))
    }

    pub fn full_name(&self) -> Result<String, CoreError> {
        Ok(self.snapshot()?.full_name())
    }

    pub fn cluster_version(&self) -> Result<ClusterVersion, CoreError> {
        Ok(self.snapshot()?.cluster_version())
    }

    pub fn is_supported_account(&self) -> Result<bool, CoreError> {
        Ok(self.snapshot()?.is_supported_account())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn offline_client() -> Client {
        let api = DiveraClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:1").unwrap(),
            SecretString::from("key".to_string()),
        );
        Client::new(Arc::new(api), Some(42))
    }

    #[test]
    fn snapshot_accessors_are_not_ready_before_first_pull() {
        let client = offline_client();
        assert!(matches!(
            client.helpers(),
            Err(CoreError::NotReady { ucr_id: Some(42) })
        ));
        assert!(matches!(client.has_open_alarms(), Err(CoreError::NotReady { .. })));
        assert!(!client.is_ready());
    }

    #[test]
    fn config_accessors_always_answer() {
        let client = offline_client();
        assert_eq!(client.ucr_id(), Some(42));
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:1/");
    }

    #[test]
    fn installed_snapshot_serves_reads() {
        let client = offline_client();
        let mut snapshot = Snapshot::default();
        snapshot.status_names.insert(1, "available".into());
        client.install(Arc::new(snapshot));

        assert_eq!(client.status_names().unwrap().len(), 1);
        assert!(matches!(
            client.vehicle("nope"),
            Err(CoreError::NotFound { entity_type: "vehicle", .. })
        ));
    }
}
