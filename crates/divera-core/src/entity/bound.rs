use serde::Serialize;

use crate::config::VehicleNameMode;
use crate::model::Snapshot;

use super::{EntityDescription, EntityKey, Platform};

pub const UNIQUE_ID_PREFIX: &str = "divera247";
pub const MANUFACTURER: &str = "DIVERA GmbH";

/// Device grouping shown by the host: one device per subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: &'static str,
    pub model: String,
}

impl DeviceInfo {
    pub fn for_subscription(ucr_id: Option<i64>, snapshot: &Snapshot) -> Self {
        let name = ucr_id
            .and_then(|id| snapshot.cluster_name(id))
            .map(str::to_owned)
            .or_else(|| snapshot.active_cluster.name.clone())
            .unwrap_or_else(|| "DIVERA 24/7".to_owned());
        Self {
            identifier: format!("{UNIQUE_ID_PREFIX}_{}", ucr_label(ucr_id)),
            name,
            manufacturer: MANUFACTURER,
            model: format!("Divera {}", snapshot.cluster_version()),
        }
    }
}

/// A description bound to a subscription and a subject.
#[derive(Debug, Clone, Serialize)]
pub struct BoundEntity {
    pub unique_id: String,
    pub name: String,
    pub key: EntityKey,
    pub platform: Platform,
    pub icon: &'static str,
    #[serde(skip)]
    pub description: &'static EntityDescription,
    pub device: DeviceInfo,
}

impl BoundEntity {
    pub fn bind(
        description: &'static EntityDescription,
        key: EntityKey,
        ucr_id: Option<i64>,
        snapshot: &Snapshot,
        name_mode: VehicleNameMode,
    ) -> Self {
        let subject = match &key {
            EntityKey::Cluster => description.key.to_owned(),
            EntityKey::Vehicle(id) => format!("vehicle_{id}_{}", description.key),
            EntityKey::Helper(id) => format!("helper_{id}_{}", description.key),
        };
        let unique_id = format!("{UNIQUE_ID_PREFIX}_{}_{subject}", ucr_label(ucr_id));
        let name = display_name(description, &key, snapshot, name_mode);

        Self {
            unique_id,
            name,
            key,
            platform: description.platform,
            icon: description.icon,
            description,
            device: DeviceInfo::for_subscription(ucr_id, snapshot),
        }
    }

    pub fn has_state(&self) -> bool {
        self.platform.has_state()
    }

    pub fn has_position(&self) -> bool {
        self.platform.has_position()
    }

    pub fn is_action(&self) -> bool {
        self.platform.is_action()
    }
}

fn ucr_label(ucr_id: Option<i64>) -> String {
    ucr_id.map_or_else(|| "default".to_owned(), |id| id.to_string())
}

fn display_name(
    description: &EntityDescription,
    key: &EntityKey,
    snapshot: &Snapshot,
    name_mode: VehicleNameMode,
) -> String {
    let subject = match key {
        EntityKey::Cluster => return description.name.to_owned(),
        EntityKey::Vehicle(id) => snapshot
            .vehicle(id)
            .map_or_else(|| id.clone(), |v| v.display_name(name_mode).to_owned()),
        EntityKey::Helper(id) => snapshot
            .helper(id)
            .map(crate::model::Helper::full_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| id.clone()),
    };
    if description.name.is_empty() {
        subject
    } else {
        format!("{subject} {}", description.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CLUSTER_ENTITIES, VEHICLE_ENTITIES};
    use crate::model::{ClusterInfo, ClusterVersion, Vehicle};

    fn snapshot() -> Snapshot {
        let mut snap = Snapshot::default();
        snap.active_cluster.version = ClusterVersion::Pro;
        snap.clusters.insert(
            100,
            ClusterInfo {
                ucr_id: 100,
                name: "FF Nord".into(),
                ..ClusterInfo::default()
            },
        );
        snap.vehicles.insert(
            "7".into(),
            Vehicle {
                id: "7".into(),
                shortname: Some("HLF".into()),
                name: Some("HLF 20".into()),
                ..Vehicle::default()
            },
        );
        snap
    }

    #[test]
    fn unique_ids_are_scoped_by_subscription_and_subject() {
        let snap = snapshot();
        let alarm = BoundEntity::bind(
            &CLUSTER_ENTITIES[0],
            EntityKey::Cluster,
            Some(100),
            &snap,
            VehicleNameMode::Auto,
        );
        assert_eq!(alarm.unique_id, "divera247_100_active_alarm");

        let location = VEHICLE_ENTITIES
            .iter()
            .find(|d| d.key == "location")
            .map(|d| {
                BoundEntity::bind(
                    d,
                    EntityKey::Vehicle("7".into()),
                    Some(100),
                    &snap,
                    VehicleNameMode::Name,
                )
            });
        let location = location.as_ref().map(|e| (e.unique_id.as_str(), e.name.as_str()));
        assert_eq!(location, Some(("divera247_100_vehicle_7_location", "HLF 20 location")));
    }

    #[test]
    fn device_info_carries_cluster_and_version() {
        let info = DeviceInfo::for_subscription(Some(100), &snapshot());
        assert_eq!(info.name, "FF Nord");
        assert_eq!(info.model, "Divera Pro");
        assert_eq!(info.manufacturer, "DIVERA GmbH");
        assert_eq!(info.identifier, "divera247_100");
    }
}
