// Static entity tables.
//
// One row per entity kind. The row's functions receive the snapshot and the
// key the entity is bound to, so a single row serves every vehicle or
// helper.

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::CoreError;
use crate::model::{Helper, Snapshot, Vehicle};

use super::{Attributes, EntityKey, Platform, StateValue};

pub type ValueFn = fn(&Snapshot, &EntityKey) -> Result<StateValue, CoreError>;
pub type AttributesFn = fn(&Snapshot, &EntityKey) -> Result<Attributes, CoreError>;

/// One kind of derived entity.
#[derive(Debug)]
pub struct EntityDescription {
    /// Stable key, part of the unique id.
    pub key: &'static str,
    /// Display name (cluster entities) or suffix after the vehicle/helper
    /// name. Empty means "just the subject's name".
    pub name: &'static str,
    pub platform: Platform,
    pub icon: &'static str,
    pub value_fn: ValueFn,
    pub attributes_fn: AttributesFn,
}

// ── Tables ───────────────────────────────────────────────────────────

/// One instance per subscription.
pub static CLUSTER_ENTITIES: &[EntityDescription] = &[
    EntityDescription {
        key: "active_alarm",
        name: "Active alarm",
        platform: Platform::BinarySensor,
        icon: "mdi:alarm-light",
        value_fn: |snap, _| Ok(StateValue::Bool(snap.has_open_alarms())),
        attributes_fn: last_alarm_attributes,
    },
    EntityDescription {
        key: "status_active",
        name: "Active helpers",
        platform: Platform::Sensor,
        icon: "mdi:check-circle",
        value_fn: |snap, _| Ok(StateValue::Count(snap.count_helpers_with_status("active"))),
        attributes_fn: no_attributes,
    },
    EntityDescription {
        key: "status_inactive",
        name: "Inactive helpers",
        platform: Platform::Sensor,
        icon: "mdi:close-circle",
        value_fn: |snap, _| Ok(StateValue::Count(snap.count_helpers_with_status("inactive"))),
        attributes_fn: no_attributes,
    },
    EntityDescription {
        key: "status_on_duty",
        name: "Helpers on duty",
        platform: Platform::Sensor,
        icon: "mdi:briefcase",
        value_fn: |snap, _| Ok(StateValue::Count(snap.count_helpers_with_status("on_duty"))),
        attributes_fn: no_attributes,
    },
    EntityDescription {
        key: "status_overview",
        name: "Status overview",
        platform: Platform::Sensor,
        icon: "mdi:clipboard-list",
        value_fn: |snap, _| Ok(StateValue::Count(snap.helpers.len())),
        attributes_fn: |snap, _| {
            Ok(snap
                .status_counts()
                .into_iter()
                .map(|(status, n)| (status, json!(n)))
                .collect())
        },
    },
    EntityDescription {
        key: "last_alarm_address",
        name: "Last alarm address",
        platform: Platform::Sensor,
        icon: "mdi:map-marker",
        value_fn: |snap, _| {
            Ok(StateValue::text(
                snap.last_alarm().and_then(|a| a.address.clone()),
            ))
        },
        attributes_fn: last_alarm_attributes,
    },
    EntityDescription {
        key: "user_status",
        name: "User status",
        platform: Platform::Select,
        icon: "mdi:account-switch",
        value_fn: |snap, _| Ok(StateValue::text(snap.current_user_status_name())),
        attributes_fn: |snap, _| {
            let mut attrs = Attributes::new();
            attrs.insert(
                "options".into(),
                json!(snap.status_names.values().collect::<Vec<_>>()),
            );
            attrs.insert("status_id".into(), json!(snap.user_status.id));
            Ok(attrs)
        },
    },
    EntityDescription {
        key: "trigger_test_alarm",
        name: "Trigger test alarm",
        platform: Platform::Button,
        icon: "mdi:alarm-bell",
        value_fn: |_, _| Ok(StateValue::Unknown),
        attributes_fn: no_attributes,
    },
];

/// One instance per vehicle.
pub static VEHICLE_ENTITIES: &[EntityDescription] = &[
    EntityDescription {
        key: "state",
        name: "",
        platform: Platform::Sensor,
        icon: "mdi:truck-outline",
        value_fn: |snap, key| {
            Ok(vehicle(snap, key)?
                .fmsstatus_id
                .map_or(StateValue::Unknown, StateValue::Integer))
        },
        attributes_fn: |snap, key| to_attributes(vehicle(snap, key)?),
    },
    EntityDescription {
        key: "location",
        name: "location",
        platform: Platform::Sensor,
        icon: "mdi:map-marker",
        value_fn: |snap, key| Ok(StateValue::text(vehicle(snap, key)?.fmsstatus_note.clone())),
        attributes_fn: |snap, key| Ok(coordinates(vehicle(snap, key)?)),
    },
    EntityDescription {
        key: "opta",
        name: "OPTA",
        platform: Platform::Sensor,
        icon: "mdi:radio-tower",
        value_fn: |snap, key| Ok(StateValue::text(vehicle(snap, key)?.opta.clone())),
        attributes_fn: no_attributes,
    },
    EntityDescription {
        key: "issi",
        name: "ISSI",
        platform: Platform::Sensor,
        icon: "mdi:identifier",
        value_fn: |snap, key| Ok(StateValue::text(vehicle(snap, key)?.issi.clone())),
        attributes_fn: no_attributes,
    },
    EntityDescription {
        key: "number",
        name: "number",
        platform: Platform::Sensor,
        icon: "mdi:numeric",
        value_fn: |snap, key| Ok(StateValue::text(vehicle(snap, key)?.number.clone())),
        attributes_fn: no_attributes,
    },
    EntityDescription {
        key: "tracker",
        name: "",
        platform: Platform::DeviceTracker,
        icon: "mdi:truck",
        value_fn: |snap, key| {
            Ok(vehicle(snap, key)?
                .position()
                .map_or(StateValue::Unknown, |(latitude, longitude)| {
                    StateValue::Position {
                        latitude,
                        longitude,
                    }
                }))
        },
        attributes_fn: |snap, key| Ok(coordinates(vehicle(snap, key)?)),
    },
];

/// One instance per helper.
pub static HELPER_ENTITIES: &[EntityDescription] = &[
    EntityDescription {
        key: "name",
        name: "name",
        platform: Platform::Sensor,
        icon: "mdi:account",
        value_fn: |snap, key| Ok(StateValue::Text(helper(snap, key)?.full_name())),
        attributes_fn: |snap, key| to_attributes(helper(snap, key)?),
    },
    EntityDescription {
        key: "status",
        name: "status",
        platform: Platform::Sensor,
        icon: "mdi:account-check",
        value_fn: |snap, key| Ok(StateValue::Text(helper(snap, key)?.status.clone())),
        attributes_fn: |snap, key| to_attributes(helper(snap, key)?),
    },
];

// ── Shared pieces ────────────────────────────────────────────────────

fn no_attributes(_: &Snapshot, _: &EntityKey) -> Result<Attributes, CoreError> {
    Ok(Attributes::new())
}

fn last_alarm_attributes(snap: &Snapshot, _: &EntityKey) -> Result<Attributes, CoreError> {
    snap.last_alarm()
        .map_or_else(|| Ok(Attributes::new()), to_attributes)
}

fn coordinates(vehicle: &Vehicle) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("latitude".into(), json!(vehicle.latitude));
    attrs.insert("longitude".into(), json!(vehicle.longitude));
    attrs
}

fn vehicle<'a>(snap: &'a Snapshot, key: &EntityKey) -> Result<&'a Vehicle, CoreError> {
    let EntityKey::Vehicle(id) = key else {
        return Err(wrong_key("vehicle", key));
    };
    snap.vehicle(id).ok_or_else(|| CoreError::NotFound {
        entity_type: "vehicle",
        identifier: id.clone(),
    })
}

fn helper<'a>(snap: &'a Snapshot, key: &EntityKey) -> Result<&'a Helper, CoreError> {
    let EntityKey::Helper(id) = key else {
        return Err(wrong_key("helper", key));
    };
    snap.helper(id).ok_or_else(|| CoreError::NotFound {
        entity_type: "helper",
        identifier: id.clone(),
    })
}

fn wrong_key(expected: &str, key: &EntityKey) -> CoreError {
    CoreError::Internal(format!("{expected} entity bound to {key:?}"))
}

fn to_attributes<T: Serialize>(value: &T) -> Result<Attributes, CoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CoreError::Internal(format!(
            "attributes must be an object, got {other}"
        ))),
        Err(e) => Err(CoreError::Internal(format!("attribute serialization: {e}"))),
    }
}
