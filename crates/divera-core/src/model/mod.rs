// ── Domain model ──
//
// Immutable view of one successful pull. Built by `convert` from the wire
// types and never mutated afterwards; readers hold it behind an `Arc`.

mod alarm;
mod cluster;
mod personnel;
mod vehicle;

use indexmap::IndexMap;
use serde::Serialize;

pub use alarm::Alarm;
pub use cluster::{ActiveCluster, ClusterInfo, ClusterVersion};
pub use personnel::{Helper, UserInfo, UserStatus};
pub use vehicle::Vehicle;

/// Case-insensitive comparison of user-supplied names, ignoring
/// surrounding whitespace.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// User group of monitor-only accounts, which cannot be used here.
pub const MONITOR_USERGROUP_ID: i64 = 5;

/// Change markers returned with every pull. Exposed, never used for
/// conditional requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullTimestamps {
    pub news: Option<i64>,
    pub event: Option<i64>,
    pub statusplan: Option<i64>,
    pub localmonitor: Option<i64>,
    pub monitor: Option<i64>,
}

/// Everything one pull-all response told us.
///
/// Carries no fetch time, so two pulls of an unchanged payload compare equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Cluster relations of the account, keyed by UCR id.
    pub clusters: IndexMap<i64, ClusterInfo>,
    pub active_cluster: ActiveCluster,
    pub user: UserInfo,
    pub user_status: UserStatus,
    /// Valid personnel statuses, in the cluster's display order.
    pub status_names: IndexMap<i64, String>,
    pub helpers: Vec<Helper>,
    pub vehicles: IndexMap<String, Vehicle>,
    pub alarms: Vec<Alarm>,
    pub timestamps: PullTimestamps,
    pub default_ucr: Option<i64>,
    pub active_ucr: Option<i64>,
}

impl Snapshot {
    // ── Cluster relations ────────────────────────────────────────────

    pub fn ucr_ids(&self) -> Vec<i64> {
        self.clusters.keys().copied().collect()
    }

    pub fn ucr_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn cluster_name(&self, ucr_id: i64) -> Option<&str> {
        self.clusters.get(&ucr_id).map(|c| c.name.as_str())
    }

    pub fn cluster_names(&self) -> Vec<&str> {
        self.clusters.values().map(|c| c.name.as_str()).collect()
    }

    /// Map cluster names (case-insensitive) back to their UCR ids.
    /// Unknown names are skipped.
    pub fn ucr_ids_for_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<i64> {
        names
            .iter()
            .filter_map(|wanted| {
                self.clusters
                    .values()
                    .find(|c| names_match(&c.name, wanted.as_ref()))
                    .map(|c| c.ucr_id)
            })
            .collect()
    }

    pub fn cluster_version(&self) -> ClusterVersion {
        self.active_cluster.version
    }

    /// Monitor-only accounts cannot read or write personnel state.
    pub fn is_supported_account(&self) -> bool {
        self.active_ucr
            .and_then(|id| self.clusters.get(&id))
            .and_then(|c| c.usergroup_id)
            != Some(MONITOR_USERGROUP_ID)
    }

    // ── Account owner ────────────────────────────────────────────────

    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref()
    }

    pub fn full_name(&self) -> String {
        self.user.full_name()
    }

    pub fn current_user_status_name(&self) -> Option<&str> {
        self.user_status.name.as_deref()
    }

    /// Case-insensitive lookup of a status id by its display name.
    pub fn status_id_by_name(&self, name: &str) -> Option<i64> {
        self.status_names
            .iter()
            .find(|(_, n)| names_match(n, name))
            .map(|(id, _)| *id)
    }

    // ── Alarms ───────────────────────────────────────────────────────

    pub fn has_open_alarms(&self) -> bool {
        self.alarms.iter().any(|a| !a.closed)
    }

    /// Most recent alarm by timestamp.
    pub fn last_alarm(&self) -> Option<&Alarm> {
        self.alarms.iter().max_by_key(|a| a.date)
    }

    // ── Personnel ────────────────────────────────────────────────────

    pub fn helper(&self, id: &str) -> Option<&Helper> {
        self.helpers.iter().find(|h| h.id == id)
    }

    /// Number of helpers per status label, in first-seen order.
    pub fn status_counts(&self) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        for helper in &self.helpers {
            *counts.entry(helper.status.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Helpers whose status label normalizes to `slug`
    /// (lowercase, spaces as underscores).
    pub fn count_helpers_with_status(&self, slug: &str) -> usize {
        self.helpers
            .iter()
            .filter(|h| h.status_slug() == slug)
            .count()
    }

    // ── Vehicles ─────────────────────────────────────────────────────

    pub fn vehicle_ids(&self) -> Vec<&str> {
        self.vehicles.keys().map(String::as_str).collect()
    }

    pub fn vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    /// FMS status of a vehicle.
    pub fn vehicle_state(&self, id: &str) -> Option<i64> {
        self.vehicles.get(id).and_then(|v| v.fmsstatus_id)
    }
}
