use std::sync::{Arc, Weak};

use arc_swap::{ArcSwap, ArcSwapOption};
use tracing::{debug, warn};

use crate::config::VehicleNameMode;
use crate::coordinator::{Coordinator, ListenerId};
use crate::model::Snapshot;

use super::{
    BoundEntity, CLUSTER_ENTITIES, EntityKey, EntityState, HELPER_ENTITIES, StateValue,
    VEHICLE_ENTITIES,
};

/// All entities of one subscription, with their latest computed states.
///
/// The entity list is fixed when the set is built; states are recomputed
/// on every successful refresh once [`attach`](Self::attach)ed.
#[derive(Clone)]
pub struct EntitySet {
    inner: Arc<EntitySetInner>,
}

struct EntitySetInner {
    ucr_id: Option<i64>,
    entities: Vec<BoundEntity>,
    states: ArcSwap<Vec<EntityState>>,
    attachment: ArcSwapOption<Attachment>,
}

struct Attachment {
    coordinator: Coordinator,
    listener: ListenerId,
}

impl std::fmt::Debug for EntitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySet")
            .field("ucr_id", &self.inner.ucr_id)
            .field("entities", &self.inner.entities.len())
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl EntitySet {
    /// Bind every description to the subjects present in `snapshot`.
    ///
    /// Without a snapshot only the cluster-wide entities exist and all
    /// states are neutral.
    pub fn build(
        ucr_id: Option<i64>,
        snapshot: Option<&Snapshot>,
        name_mode: VehicleNameMode,
    ) -> Self {
        let empty = Snapshot::default();
        let source = snapshot.unwrap_or(&empty);

        let mut entities: Vec<BoundEntity> = CLUSTER_ENTITIES
            .iter()
            .map(|d| BoundEntity::bind(d, EntityKey::Cluster, ucr_id, source, name_mode))
            .collect();
        for vehicle_id in source.vehicles.keys() {
            entities.extend(VEHICLE_ENTITIES.iter().map(|d| {
                BoundEntity::bind(
                    d,
                    EntityKey::Vehicle(vehicle_id.clone()),
                    ucr_id,
                    source,
                    name_mode,
                )
            }));
        }
        for helper in &source.helpers {
            entities.extend(HELPER_ENTITIES.iter().map(|d| {
                BoundEntity::bind(
                    d,
                    EntityKey::Helper(helper.id.clone()),
                    ucr_id,
                    source,
                    name_mode,
                )
            }));
        }

        let neutral = vec![EntityState::neutral(); entities.len()];
        let set = Self {
            inner: Arc::new(EntitySetInner {
                ucr_id,
                entities,
                states: ArcSwap::from_pointee(neutral),
                attachment: ArcSwapOption::empty(),
            }),
        };
        if let Some(snapshot) = snapshot {
            set.refresh(snapshot);
        }
        debug!(ucr = ?ucr_id, entities = set.len(), "entity set built");
        set
    }

    /// Build from the coordinator's current snapshot and attach to it.
    pub fn for_coordinator(coordinator: &Coordinator, name_mode: VehicleNameMode) -> Self {
        let snapshot = coordinator.client().snapshot().ok();
        let set = Self::build(coordinator.ucr_id(), snapshot.as_deref(), name_mode);
        set.attach(coordinator);
        set.catch_up(snapshot.as_ref(), coordinator.client().snapshot().ok().as_ref());
        set
    }

    /// Recompute from `latest` if a refresh swapped it in after the set was
    /// built from `built_from` but before the listener was registered.
    fn catch_up(&self, built_from: Option<&Arc<Snapshot>>, latest: Option<&Arc<Snapshot>>) -> bool {
        let Some(latest) = latest else {
            return false;
        };
        if built_from.is_some_and(|seen| Arc::ptr_eq(seen, latest)) {
            return false;
        }
        debug!(ucr = ?self.inner.ucr_id, "snapshot changed while attaching");
        self.refresh(latest);
        true
    }

    // ── Listener wiring ──────────────────────────────────────────

    /// Recompute states after every successful refresh of `coordinator`.
    /// Replaces any previous attachment.
    pub fn attach(&self, coordinator: &Coordinator) {
        self.detach();
        let weak: Weak<EntitySetInner> = Arc::downgrade(&self.inner);
        let listener = coordinator.add_listener(move |snapshot| {
            if let Some(inner) = weak.upgrade() {
                EntitySet { inner }.refresh(snapshot);
            }
        });
        self.inner.attachment.store(Some(Arc::new(Attachment {
            coordinator: coordinator.clone(),
            listener,
        })));
    }

    /// Stop following the coordinator. States keep their last values.
    pub fn detach(&self) {
        if let Some(attachment) = self.inner.attachment.swap(None) {
            attachment
                .coordinator
                .remove_listener(attachment.listener);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attachment.load().is_some()
    }

    // ── State ────────────────────────────────────────────────────

    /// Recompute every entity from `snapshot`.
    ///
    /// A failing entity becomes unavailable; the others are unaffected.
    pub fn refresh(&self, snapshot: &Snapshot) {
        let states: Vec<EntityState> = self
            .inner
            .entities
            .iter()
            .map(|entity| compute(entity, snapshot))
            .collect();
        self.inner.states.store(Arc::new(states));
    }

    pub fn ucr_id(&self) -> Option<i64> {
        self.inner.ucr_id
    }

    pub fn entities(&self) -> &[BoundEntity] {
        &self.inner.entities
    }

    pub fn len(&self) -> usize {
        self.inner.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entities.is_empty()
    }

    /// States in the same order as [`entities`](Self::entities).
    pub fn states(&self) -> Arc<Vec<EntityState>> {
        self.inner.states.load_full()
    }

    /// Entities paired with their current states.
    pub fn current(&self) -> Vec<(BoundEntity, EntityState)> {
        let states = self.states();
        self.inner
            .entities
            .iter()
            .cloned()
            .zip(states.iter().cloned())
            .collect()
    }

    pub fn state_of(&self, unique_id: &str) -> Option<EntityState> {
        let index = self
            .inner
            .entities
            .iter()
            .position(|e| e.unique_id == unique_id)?;
        self.states().get(index).cloned()
    }
}

fn compute(entity: &BoundEntity, snapshot: &Snapshot) -> EntityState {
    let description = entity.description;
    let value = if entity.has_state() {
        (description.value_fn)(snapshot, &entity.key)
    } else {
        Ok(StateValue::Unknown)
    };
    let attributes = (description.attributes_fn)(snapshot, &entity.key);

    match (value, attributes) {
        (Ok(value), Ok(attributes)) => EntityState {
            value,
            attributes,
            available: true,
        },
        (Err(e), _) | (_, Err(e)) => {
            warn!(entity = %entity.unique_id, error = %e, "entity update failed");
            EntityState::unavailable()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Helper, Vehicle};

    fn snapshot() -> Snapshot {
        let mut snap = Snapshot::default();
        snap.vehicles.insert(
            "7".into(),
            Vehicle {
                id: "7".into(),
                fmsstatus_id: Some(3),
                ..Vehicle::default()
            },
        );
        snap.helpers.push(Helper {
            id: "h1".into(),
            firstname: "Ann".into(),
            status: "active".into(),
            ..Helper::default()
        });
        snap
    }

    #[test]
    fn without_snapshot_only_cluster_entities_with_neutral_states() {
        let set = EntitySet::build(Some(1), None, VehicleNameMode::Auto);
        assert_eq!(set.len(), CLUSTER_ENTITIES.len());
        assert!(set.states().iter().all(|s| *s == EntityState::neutral()));
    }

    #[test]
    fn builds_per_vehicle_and_per_helper_entities() {
        let set = EntitySet::build(Some(1), Some(&snapshot()), VehicleNameMode::Auto);
        assert_eq!(
            set.len(),
            CLUSTER_ENTITIES.len() + VEHICLE_ENTITIES.len() + HELPER_ENTITIES.len()
        );
        let state = set.state_of("divera247_1_vehicle_7_state").unwrap();
        assert_eq!(state.value, StateValue::Integer(3));
    }

    #[test]
    fn catch_up_applies_a_snapshot_swapped_in_while_attaching() {
        let first = Arc::new(snapshot());
        let set = EntitySet::build(Some(1), Some(first.as_ref()), VehicleNameMode::Auto);

        assert!(!set.catch_up(Some(&first), Some(&Arc::clone(&first))));
        assert!(!set.catch_up(Some(&first), None));

        let mut newer = snapshot();
        if let Some(vehicle) = newer.vehicles.get_mut("7") {
            vehicle.fmsstatus_id = Some(6);
        }
        assert!(set.catch_up(Some(&first), Some(&Arc::new(newer))));

        let state = set.state_of("divera247_1_vehicle_7_state").unwrap();
        assert_eq!(state.value, StateValue::Integer(6));
    }

    #[test]
    fn catch_up_fills_a_set_built_before_the_first_pull() {
        let set = EntitySet::build(Some(1), None, VehicleNameMode::Auto);
        assert!(set.catch_up(None, Some(&Arc::new(snapshot()))));

        let active = set.state_of("divera247_1_status_active").unwrap();
        assert_eq!(active.value, StateValue::Count(1));
    }

    #[test]
    fn failing_entity_does_not_affect_others() {
        let set = EntitySet::build(Some(1), Some(&snapshot()), VehicleNameMode::Auto);

        // Vehicle 7 disappears from the next snapshot.
        let mut next = snapshot();
        next.vehicles.clear();
        set.refresh(&next);

        let vehicle = set.state_of("divera247_1_vehicle_7_state").unwrap();
        assert!(!vehicle.available);

        let helper = set.state_of("divera247_1_helper_h1_status").unwrap();
        assert!(helper.available);
        assert_eq!(helper.value, StateValue::Text("active".into()));

        let active = set.state_of("divera247_1_status_active").unwrap();
        assert_eq!(active.value, StateValue::Count(1));
    }
}
