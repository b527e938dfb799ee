// ── Snapshot storage ──
//
// Lock-free holder for the latest snapshot of one subscription.

mod cache;

pub use cache::SnapshotCache;
