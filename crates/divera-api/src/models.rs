// DIVERA v2 response types
//
// Wire models for the pull-all document. The service is a PHP backend and is
// loose about types: keyed maps turn into `[]` when empty, ids and
// coordinates arrive as numbers or strings depending on the record's age.
// Everything here is therefore defaulted and deserialized leniently; the
// domain conversion in `divera-core` decides what "absent" means.

use indexmap::IndexMap;
use serde::Deserialize;

// ── Response Envelope ────────────────────────────────────────────────

/// Standard DIVERA v2 response envelope.
///
/// ```json
/// { "success": true, "data": { ... } }
/// { "success": false, "message": "Zugriff verweigert", "errors": { ... } }
/// ```
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

impl<T> Envelope<T> {
    /// Best human-readable failure description the envelope carries.
    pub fn failure_message(&self) -> String {
        if let Some(msg) = self.message.as_deref().filter(|m| !m.is_empty()) {
            return msg.to_owned();
        }
        match &self.errors {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Object(map)) => map
                .values()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    other => other.as_array().and_then(|a| a.first()?.as_str().map(String::from)),
                })
                .collect::<Vec<_>>()
                .join("; "),
            _ => "request rejected".into(),
        }
    }
}

/// Lowercase fragments of failure messages that reject the credentials.
const ACCESS_DENIAL_MARKERS: &[&str] = &[
    "accesskey",
    "access key",
    "access denied",
    "unauthorized",
    "zugriff verweigert",
];

impl<T> Envelope<T> {
    /// Whether a `success: false` envelope rejects the access key rather
    /// than the request itself.
    pub fn is_auth_failure(&self) -> bool {
        let names_key = match &self.errors {
            Some(serde_json::Value::Object(map)) => map
                .keys()
                .any(|k| k.eq_ignore_ascii_case("accesskey") || k.eq_ignore_ascii_case("access_key")),
            _ => false,
        };
        if names_key {
            return true;
        }
        let message = self.failure_message().to_lowercase();
        ACCESS_DENIAL_MARKERS.iter().any(|m| message.contains(m))
    }
}

// ── Keyed collections ────────────────────────────────────────────────

/// A collection the service emits as `{ "<id>": {...} }`, or as `[]` when
/// empty (and occasionally as a plain list).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Keyed<T> {
    Map(IndexMap<String, T>),
    List(Vec<T>),
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl<T> Keyed<T> {
    /// Flatten into `(map key, item)` pairs, preserving document order.
    pub fn into_entries(self) -> Vec<(Option<String>, T)> {
        match self {
            Self::Map(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
            Self::List(items) => items.into_iter().map(|v| (None, v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Map(map) => map.len(),
            Self::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Pull-all payload ─────────────────────────────────────────────────

/// `data` of `GET /api/v2/pull/all`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullAllData {
    #[serde(default)]
    pub user: RawUser,
    #[serde(default)]
    pub status: RawUserStatus,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub ucr_default: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub ucr_active: Option<i64>,
    #[serde(default, deserialize_with = "de::keyed")]
    pub ucr: Keyed<RawUcr>,
    #[serde(default)]
    pub cluster: RawCluster,
    #[serde(default)]
    pub alarm: RawAlarmBlock,
    /// Change markers at the top level of `data`.
    #[serde(flatten)]
    pub timestamps: RawTimestamps,
}

/// Account owner.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub firstname: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub lastname: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub email: Option<String>,
}

/// The account owner's current personnel status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUserStatus {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub status_id: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub note: Option<String>,
}

/// One user-cluster relation the account belongs to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUcr {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub shortname: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub cluster_id: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub usergroup_id: Option<i64>,
}

/// The active cluster: status catalogue, personnel and vehicles.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCluster {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub shortname: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub version_id: Option<i64>,
    #[serde(default, deserialize_with = "de::keyed")]
    pub status: Keyed<RawStatusDef>,
    #[serde(default, deserialize_with = "de::lenient_i64_list")]
    pub statussorting: Vec<i64>,
    #[serde(default, deserialize_with = "de::keyed")]
    pub consumer: Keyed<RawHelper>,
    #[serde(default, deserialize_with = "de::keyed")]
    pub vehicle: Keyed<RawVehicle>,
}

/// One entry of the cluster's status catalogue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStatusDef {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub name: Option<String>,
}

/// Personnel record. Unknown fields are kept in `extra`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHelper {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub firstname: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub lastname: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub status_id: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Vehicle record. Unknown fields are kept in `extra`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVehicle {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub shortname: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub fullname: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub fmsstatus_id: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub fmsstatus_note: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub fmsstatus_ts: Option<i64>,
    #[serde(default, alias = "latitude", deserialize_with = "de::lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, alias = "longitude", deserialize_with = "de::lenient_f64")]
    pub lng: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub opta: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub issi: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub number: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `data.alarm`: alarm items plus the service's display order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAlarmBlock {
    #[serde(default, deserialize_with = "de::keyed")]
    pub items: Keyed<RawAlarm>,
    #[serde(default, deserialize_with = "de::lenient_i64_list")]
    pub sorting: Vec<i64>,
}

/// Alarm record. Unknown fields are kept in `extra`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAlarm {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub lng: Option<f64>,
    /// Unix seconds.
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub date: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub closed: Option<bool>,
    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub new: Option<bool>,
    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub priority: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Change markers the service returns alongside the pull-all document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawTimestamps {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub ts_news: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub ts_event: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub ts_statusplan: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub ts_localmonitor: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub ts_monitor: Option<i64>,
}

// ── Requests ─────────────────────────────────────────────────────────

/// Body of `POST /api/v2/statusgeber/set-status`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SetStatusRequest {
    #[serde(rename = "Status")]
    pub status: StatusRef,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StatusRef {
    pub id: i64,
}

// ── Lenient field deserializers ──────────────────────────────────────

mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::Keyed;

    pub(super) fn keyed<'de, D, T>(d: D) -> Result<Keyed<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Keyed<T>>::deserialize(d)?.unwrap_or_default())
    }

    pub(super) fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|f| f.is_finite()))
    }

    pub(super) fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.as_ref().and_then(value_to_i64))
    }

    pub(super) fn lenient_i64_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<i64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(match value {
            Some(Value::Array(items)) => items.iter().filter_map(value_to_i64).collect(),
            _ => Vec::new(),
        })
    }

    pub(super) fn lenient_string<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(match value {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub(super) fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(match value {
            Some(Value::Bool(b)) => Some(b),
            Some(Value::Number(n)) => n.as_i64().map(|i| i != 0),
            Some(Value::String(s)) => match s.as_str() {
                "1" | "true" => Some(true),
                "0" | "false" | "" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }

    fn value_to_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keyed_accepts_object_and_empty_array() {
        let map: Keyed<RawStatusDef> =
            serde_json::from_value(json!({ "1": { "id": 1, "name": "available" } })).unwrap();
        assert_eq!(map.len(), 1);

        let empty: Keyed<RawStatusDef> = serde_json::from_value(json!([])).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn vehicle_coordinates_are_lenient() {
        let v: RawVehicle = serde_json::from_value(json!({
            "id": 7,
            "lat": "52.5",
            "lng": "",
            "opta": 1234,
            "custom": "kept"
        }))
        .unwrap();

        assert_eq!(v.id.as_deref(), Some("7"));
        assert_eq!(v.lat, Some(52.5));
        assert_eq!(v.lng, None);
        assert_eq!(v.opta.as_deref(), Some("1234"));
        assert_eq!(v.extra.get("custom"), Some(&json!("kept")));
        assert!(!v.extra.contains_key("lat"));
    }

    #[test]
    fn vehicle_accepts_long_coordinate_names() {
        let v: RawVehicle =
            serde_json::from_value(json!({ "latitude": 52.5, "longitude": 13.4 })).unwrap();
        assert_eq!(v.lat, Some(52.5));
        assert_eq!(v.lng, Some(13.4));
    }

    #[test]
    fn null_collections_become_empty() {
        let data: PullAllData = serde_json::from_value(json!({
            "ucr": null,
            "cluster": { "vehicle": null, "consumer": [] },
            "alarm": { "items": [], "sorting": null },
            "ts_news": "17"
        }))
        .unwrap();

        assert!(data.ucr.is_empty());
        assert!(data.cluster.vehicle.is_empty());
        assert!(data.alarm.sorting.is_empty());
        assert_eq!(data.timestamps.ts_news, Some(17));
    }

    #[test]
    fn auth_failure_is_told_apart_from_request_rejection() {
        let keyed: Envelope<serde_json::Value> = serde_json::from_value(json!({
            "success": false,
            "errors": { "accesskey": ["invalid"] }
        }))
        .unwrap();
        assert!(keyed.is_auth_failure());

        let worded: Envelope<serde_json::Value> = serde_json::from_value(json!({
            "success": false,
            "message": "Zugriff verweigert"
        }))
        .unwrap();
        assert!(worded.is_auth_failure());

        let request: Envelope<serde_json::Value> = serde_json::from_value(json!({
            "success": false,
            "message": "unknown status",
            "errors": { "status_id": ["not found"] }
        }))
        .unwrap();
        assert!(!request.is_auth_failure());
    }

    #[test]
    fn failure_message_prefers_message_then_errors() {
        let env: Envelope<serde_json::Value> = serde_json::from_value(json!({
            "success": false,
            "errors": { "accesskey": ["invalid"] }
        }))
        .unwrap();
        assert_eq!(env.failure_message(), "invalid");

        let env: Envelope<serde_json::Value> =
            serde_json::from_value(json!({ "success": false, "message": "denied" })).unwrap();
        assert_eq!(env.failure_message(), "denied");
    }

    #[test]
    fn set_status_body_shape() {
        let body = SetStatusRequest {
            status: StatusRef { id: 3 },
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({ "Status": { "id": 3 } })
        );
    }
}
