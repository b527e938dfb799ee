// ── API-to-domain type conversions ──
//
// Bridges the lenient `divera_api::models` wire types into the `Snapshot`
// domain model. Records without any usable id are dropped; everything else
// is normalized (ids to strings or integers, epochs to `DateTime<Utc>`,
// missing labels to defaults).

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

use divera_api::models::{
    Keyed, PullAllData, RawAlarm, RawCluster, RawHelper, RawStatusDef, RawTimestamps, RawUcr,
    RawVehicle,
};

use crate::model::{
    ActiveCluster, Alarm, ClusterInfo, ClusterVersion, Helper, PullTimestamps, Snapshot,
    UserInfo, UserStatus, Vehicle,
};

/// Label for helpers whose status the service did not resolve.
pub const UNKNOWN_STATUS: &str = "unknown";

// ── Helpers ────────────────────────────────────────────────────────

fn epoch_to_datetime(epoch: Option<i64>) -> Option<DateTime<Utc>> {
    epoch.and_then(|ts| DateTime::from_timestamp(ts, 0))
}

/// Resolve an integer id from the record, falling back to its map key.
fn int_id(own: Option<i64>, key: Option<&String>) -> Option<i64> {
    own.or_else(|| key.and_then(|k| k.trim().parse().ok()))
}

/// Resolve a string id from the record, falling back to its map key.
fn str_id(own: Option<String>, key: Option<String>) -> Option<String> {
    own.or(key).filter(|id| !id.is_empty())
}

/// Reorder `items` so ids listed in `sorting` come first, in that order.
fn apply_sorting<T>(mut items: Vec<(i64, T)>, sorting: &[i64]) -> Vec<(i64, T)> {
    if sorting.is_empty() {
        return items;
    }
    let rank = |id: i64| sorting.iter().position(|s| *s == id).unwrap_or(usize::MAX);
    // Stable: unsorted ids keep document order after the sorted ones.
    items.sort_by_key(|(id, _)| rank(*id));
    items
}

// ── Clusters ───────────────────────────────────────────────────────

fn convert_ucrs(raw: Keyed<RawUcr>) -> IndexMap<i64, ClusterInfo> {
    let mut clusters = IndexMap::new();
    for (key, ucr) in raw.into_entries() {
        let Some(ucr_id) = int_id(ucr.id, key.as_ref()) else {
            debug!(?key, "skipping cluster relation without id");
            continue;
        };
        clusters.insert(
            ucr_id,
            ClusterInfo {
                ucr_id,
                name: ucr
                    .name
                    .clone()
                    .or_else(|| ucr.shortname.clone())
                    .unwrap_or_else(|| ucr_id.to_string()),
                shortname: ucr.shortname,
                cluster_id: ucr.cluster_id,
                usergroup_id: ucr.usergroup_id,
            },
        );
    }
    clusters
}

fn convert_status_names(raw: Keyed<RawStatusDef>, sorting: &[i64]) -> IndexMap<i64, String> {
    let entries: Vec<(i64, String)> = raw
        .into_entries()
        .into_iter()
        .filter_map(|(key, def)| {
            let id = int_id(def.id, key.as_ref())?;
            Some((id, def.name.unwrap_or_else(|| id.to_string())))
        })
        .collect();
    apply_sorting(entries, sorting).into_iter().collect()
}

fn convert_active_cluster(raw: &RawCluster) -> ActiveCluster {
    ActiveCluster {
        id: raw.id,
        name: raw.name.clone(),
        shortname: raw.shortname.clone(),
        version: ClusterVersion::from_id(raw.version_id),
    }
}

// ── Personnel ──────────────────────────────────────────────────────

fn convert_helper(
    key: Option<String>,
    raw: RawHelper,
    status_names: &IndexMap<i64, String>,
) -> Option<Helper> {
    let id = str_id(raw.id, key)?;
    let status = raw
        .status
        .or_else(|| raw.status_id.and_then(|sid| status_names.get(&sid).cloned()))
        .unwrap_or_else(|| UNKNOWN_STATUS.to_owned());
    Some(Helper {
        id,
        firstname: raw.firstname.unwrap_or_default(),
        lastname: raw.lastname.unwrap_or_default(),
        status,
        status_id: raw.status_id,
        extra: raw.extra,
    })
}

// ── Vehicles ───────────────────────────────────────────────────────

fn convert_vehicle(key: Option<String>, raw: RawVehicle) -> Option<Vehicle> {
    let id = str_id(raw.id, key)?;
    Some(Vehicle {
        id,
        name: raw.name,
        shortname: raw.shortname,
        fullname: raw.fullname,
        fmsstatus_id: raw.fmsstatus_id,
        fmsstatus_note: raw.fmsstatus_note,
        fmsstatus_ts: raw.fmsstatus_ts,
        latitude: raw.lat,
        longitude: raw.lng,
        opta: raw.opta,
        issi: raw.issi,
        number: raw.number,
        extra: raw.extra,
    })
}

// ── Alarms ─────────────────────────────────────────────────────────

impl From<RawAlarm> for Alarm {
    fn from(raw: RawAlarm) -> Self {
        Alarm {
            id: raw.id.unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            text: raw.text.unwrap_or_default(),
            address: raw.address,
            latitude: raw.lat,
            longitude: raw.lng,
            date: epoch_to_datetime(raw.date),
            closed: raw.closed.unwrap_or(false),
            new: raw.new.unwrap_or(false),
            priority: raw.priority.unwrap_or(false),
        }
    }
}

fn convert_alarms(raw: Keyed<RawAlarm>, sorting: &[i64]) -> Vec<Alarm> {
    let entries: Vec<(i64, Alarm)> = raw
        .into_entries()
        .into_iter()
        .filter_map(|(key, mut alarm)| {
            let id = int_id(alarm.id, key.as_ref())?;
            alarm.id = Some(id);
            Some((id, Alarm::from(alarm)))
        })
        .collect();
    apply_sorting(entries, sorting)
        .into_iter()
        .map(|(_, alarm)| alarm)
        .collect()
}

impl From<RawTimestamps> for PullTimestamps {
    fn from(raw: RawTimestamps) -> Self {
        PullTimestamps {
            news: raw.ts_news,
            event: raw.ts_event,
            statusplan: raw.ts_statusplan,
            localmonitor: raw.ts_localmonitor,
            monitor: raw.ts_monitor,
        }
    }
}

// ── Snapshot ───────────────────────────────────────────────────────

impl From<PullAllData> for Snapshot {
    fn from(data: PullAllData) -> Self {
        let PullAllData {
            user,
            status,
            ucr_default,
            ucr_active,
            ucr,
            cluster,
            alarm,
            timestamps,
        } = data;

        let active_cluster = convert_active_cluster(&cluster);
        let RawCluster {
            status: status_defs,
            statussorting,
            consumer,
            vehicle,
            ..
        } = cluster;

        let status_names = convert_status_names(status_defs, &statussorting);

        let helpers: Vec<Helper> = consumer
            .into_entries()
            .into_iter()
            .filter_map(|(key, raw)| convert_helper(key, raw, &status_names))
            .collect();

        let vehicles: IndexMap<String, Vehicle> = vehicle
            .into_entries()
            .into_iter()
            .filter_map(|(key, raw)| convert_vehicle(key, raw))
            .map(|v| (v.id.clone(), v))
            .collect();

        let user_status = UserStatus {
            id: status.status_id,
            name: status
                .status_id
                .and_then(|id| status_names.get(&id).cloned()),
            note: status.note,
        };

        Snapshot {
            clusters: convert_ucrs(ucr),
            active_cluster,
            user: UserInfo {
                firstname: user.firstname.unwrap_or_default(),
                lastname: user.lastname.unwrap_or_default(),
                email: user.email,
            },
            user_status,
            status_names,
            helpers,
            vehicles,
            alarms: convert_alarms(alarm.items, &alarm.sorting),
            timestamps: timestamps.into(),
            default_ucr: ucr_default,
            active_ucr: ucr_active,
        }
    }
}
