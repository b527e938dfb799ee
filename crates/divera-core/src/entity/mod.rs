// ── Derived entities ──
//
// Read-only views computed from a snapshot: alarm state, personnel counts,
// vehicle positions and so on. Each entity is a static description (plain
// `fn` pointers) plus the `EntityKey` it is bound to; nothing captures
// per-instance closures.

mod bound;
mod descriptions;
mod set;

use serde::Serialize;

pub use bound::{BoundEntity, DeviceInfo};
pub use descriptions::{
    CLUSTER_ENTITIES, EntityDescription, HELPER_ENTITIES, VEHICLE_ENTITIES,
};
pub use set::EntitySet;

/// Free-form entity attributes.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// What an entity is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityKey {
    /// The subscription's cluster as a whole.
    Cluster,
    Vehicle(String),
    Helper(String),
}

/// Host platform an entity maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    BinarySensor,
    Sensor,
    DeviceTracker,
    Select,
    Button,
}

impl Platform {
    pub fn has_state(self) -> bool {
        !matches!(self, Self::Button)
    }

    pub fn has_position(self) -> bool {
        matches!(self, Self::DeviceTracker)
    }

    pub fn is_action(self) -> bool {
        matches!(self, Self::Button | Self::Select)
    }
}

/// Current value of an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateValue {
    /// No data yet, or the value is absent in the snapshot.
    Unknown,
    Bool(bool),
    Count(usize),
    Integer(i64),
    Text(String),
    Position { latitude: f64, longitude: f64 },
}

impl StateValue {
    pub fn text(value: Option<impl Into<String>>) -> Self {
        value.map_or(Self::Unknown, |v| Self::Text(v.into()))
    }
}

impl std::fmt::Display for StateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Bool(true) => f.write_str("on"),
            Self::Bool(false) => f.write_str("off"),
            Self::Count(n) => write!(f, "{n}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Position {
                latitude,
                longitude,
            } => write!(f, "{latitude:.5}, {longitude:.5}"),
        }
    }
}

/// Computed state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub value: StateValue,
    pub attributes: Attributes,
    /// `false` when computing this entity failed on the last refresh.
    pub available: bool,
}

impl EntityState {
    /// State before any data has arrived.
    pub fn neutral() -> Self {
        Self {
            value: StateValue::Unknown,
            attributes: Attributes::new(),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            value: StateValue::Unknown,
            attributes: Attributes::new(),
            available: false,
        }
    }
}
