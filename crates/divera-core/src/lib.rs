// divera-core: Refresh coordination and derived values between divera-api and hosts.

pub mod actions;
pub mod client;
pub mod config;
pub mod convert;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod model;
pub mod onboarding;
pub mod setup;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::Client;
pub use config::{AccountConfig, PollInterval, SubscriptionConfig, VehicleNameMode};
pub use coordinator::{Coordinator, FailureRecord, ListenerId, RefreshOutcome, RefreshState};
pub use entity::{BoundEntity, EntityKey, EntitySet, EntityState, Platform, StateValue};
pub use error::{CoreError, ErrorClass};
pub use onboarding::AccountOverview;
pub use setup::SubscriptionGroup;
pub use store::SnapshotCache;
pub use stream::SnapshotStream;

pub use model::{
    ActiveCluster, Alarm, ClusterInfo, ClusterVersion, Helper, PullTimestamps, Snapshot,
    UserInfo, UserStatus, Vehicle,
};

// Transport knobs pass straight through from the wire crate.
pub use divera_api::{DEFAULT_BASE_URL, TlsMode, TransportConfig};
