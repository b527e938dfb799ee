use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::model::Snapshot;

/// Latest snapshot of one subscription.
///
/// Writers swap in a complete `Arc<Snapshot>`; readers get either the old
/// or the new one, never a mix. A superseded snapshot is dropped once its
/// last reader lets go.
#[derive(Default)]
pub struct SnapshotCache {
    current: ArcSwapOption<Snapshot>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, if any pull has succeeded yet.
    pub fn load(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    /// Replace the current snapshot, returning the previous one.
    pub fn store(&self, snapshot: Arc<Snapshot>) -> Option<Arc<Snapshot>> {
        self.current.swap(Some(snapshot))
    }

    pub fn is_populated(&self) -> bool {
        self.current.load().is_some()
    }
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("populated", &self.is_populated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_replaces_and_returns_previous() {
        let cache = SnapshotCache::new();
        assert!(cache.load().is_none());

        let first = Arc::new(Snapshot::default());
        assert!(cache.store(Arc::clone(&first)).is_none());

        let second = Arc::new(Snapshot {
            default_ucr: Some(1),
            ..Snapshot::default()
        });
        let previous = cache.store(Arc::clone(&second));
        assert!(previous.is_some_and(|p| Arc::ptr_eq(&p, &first)));
        assert!(cache.load().is_some_and(|c| Arc::ptr_eq(&c, &second)));
    }

    #[test]
    fn readers_keep_superseded_snapshot_alive() {
        let cache = SnapshotCache::new();
        cache.store(Arc::new(Snapshot::default()));
        let held = cache.load();

        cache.store(Arc::new(Snapshot {
            active_ucr: Some(2),
            ..Snapshot::default()
        }));

        assert!(held.is_some_and(|s| s.active_ucr.is_none()));
        assert!(cache.load().is_some_and(|s| s.active_ucr == Some(2)));
    }
}
