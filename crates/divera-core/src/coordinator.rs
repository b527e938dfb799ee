// ── Refresh coordinator ──
//
// Lifecycle of one subscription: the first refresh that must succeed,
// a scheduled background refresh loop, staleness tracking, and fan-out of
// every new snapshot to listeners and stream subscribers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::config::{PollInterval, SubscriptionConfig};
use crate::error::{CoreError, ErrorClass};
use crate::model::Snapshot;
use crate::stream::SnapshotStream;

// ── State ────────────────────────────────────────────────────────

/// Refresh state observable by hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RefreshState {
    /// Created, first refresh not attempted yet.
    Uninitialized,
    /// First refresh in flight.
    Refreshing,
    /// Data available, scheduler running.
    Ready,
    /// Scheduled or requested refresh in flight; the previous snapshot
    /// stays readable.
    BackgroundRefreshing,
    /// First refresh failed. Terminal.
    Failed,
    /// Shut down. Terminal.
    Stopped,
}

impl RefreshState {
    pub fn has_data(self) -> bool {
        matches!(self, Self::Ready | Self::BackgroundRefreshing)
    }
}

/// What a background refresh attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was installed.
    Updated,
    /// The pull failed; the previous snapshot is still current.
    Failed(ErrorClass),
    /// Not attempted: another pull was in flight, or the coordinator is not
    /// `Ready`.
    Skipped,
    /// The pull finished after shutdown and its result was dropped.
    Discarded,
}

/// The most recent background refresh failure.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub class: ErrorClass,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Handle returned by [`Coordinator::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&Arc<Snapshot>) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct UpdateStamp {
    at: Instant,
    wall: DateTime<Utc>,
}

// ── Coordinator ──────────────────────────────────────────────────

/// Drives periodic pulls for one subscription.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Call
/// [`first_refresh()`](Self::first_refresh) once, then read through
/// [`client()`](Self::client) or subscribe to updates; call
/// [`shutdown()`](Self::shutdown) to stop the scheduler.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    client: Arc<Client>,
    interval: PollInterval,
    state: watch::Sender<RefreshState>,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    last_updated: ArcSwapOption<UpdateStamp>,
    /// Held for the duration of every pull.
    refresh_lock: Mutex<()>,
    cancel: CancellationToken,
    task_handle: Mutex<Option<JoinHandle<()>>>,
    listeners: DashMap<ListenerId, Listener>,
    next_listener_id: AtomicU64,
    failure_count: AtomicU64,
    consecutive_failures: AtomicU64,
    last_failure: ArcSwapOption<FailureRecord>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("ucr_id", &self.inner.client.ucr_id())
            .field("interval", &self.inner.interval)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Create a coordinator. Does NOT fetch -- call
    /// [`first_refresh()`](Self::first_refresh).
    pub fn new(client: Arc<Client>, interval: PollInterval) -> Self {
        let (state, _) = watch::channel(RefreshState::Uninitialized);
        let (snapshot_tx, _) = watch::channel(None);

        Self {
            inner: Arc::new(CoordinatorInner {
                client,
                interval,
                state,
                snapshot_tx,
                last_updated: ArcSwapOption::empty(),
                refresh_lock: Mutex::new(()),
                cancel: CancellationToken::new(),
                task_handle: Mutex::new(None),
                listeners: DashMap::new(),
                next_listener_id: AtomicU64::new(0),
                failure_count: AtomicU64::new(0),
                consecutive_failures: AtomicU64::new(0),
                last_failure: ArcSwapOption::empty(),
            }),
        }
    }

    /// Build a coordinator with its own client and HTTP transport.
    pub fn from_config(config: &SubscriptionConfig) -> Result<Self, CoreError> {
        let client = Client::from_config(config)?;
        Ok(Self::new(Arc::new(client), config.poll_interval))
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.inner.client
    }

    pub fn ucr_id(&self) -> Option<i64> {
        self.inner.client.ucr_id()
    }

    pub fn poll_interval(&self) -> PollInterval {
        self.inner.interval
    }

    pub fn state(&self) -> RefreshState {
        *self.inner.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RefreshState> {
        self.inner.state.subscribe()
    }

    pub fn snapshots(&self) -> SnapshotStream {
        SnapshotStream::new(self.inner.snapshot_tx.subscribe())
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Perform the initial pull and start the scheduler.
    ///
    /// Only valid from `Uninitialized`. On failure the coordinator moves to
    /// `Failed` and the error is returned unchanged.
    pub async fn first_refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let guard = self.inner.refresh_lock.lock().await;

        let current = self.state();
        if current != RefreshState::Uninitialized {
            return Err(CoreError::InvalidState {
                message: format!("first refresh requires uninitialized coordinator, state is {current}"),
            });
        }
        self.inner.state.send_replace(RefreshState::Refreshing);
        debug!(ucr = ?self.ucr_id(), "first refresh");

        let snapshot = match self.inner.client.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.inner.state.send_replace(RefreshState::Failed);
                warn!(ucr = ?self.ucr_id(), class = %e.class(), error = %e, "first refresh failed");
                return Err(e);
            }
        };

        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::InvalidState {
                message: "coordinator shut down during first refresh".into(),
            });
        }

        let snapshot = self.apply(snapshot);
        self.inner.state.send_replace(RefreshState::Ready);
        drop(guard);

        self.spawn_scheduler().await;
        info!(
            ucr = ?self.ucr_id(),
            interval = %self.inner.interval,
            "subscription ready"
        );
        Ok(snapshot)
    }

    /// Host-triggered refresh. Never fails; the outcome says what happened.
    pub async fn request_refresh(&self) -> RefreshOutcome {
        self.background_refresh().await
    }

    /// Stop the scheduler and wait for it to exit.
    ///
    /// A pull that is already in flight completes, but its result is
    /// discarded. Listeners are dropped.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let handle = self.inner.task_handle.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.inner.listeners.clear();
        self.inner.state.send_replace(RefreshState::Stopped);
        debug!(ucr = ?self.ucr_id(), "coordinator stopped");
    }

    // ── Listeners ────────────────────────────────────────────────

    /// Register a callback run after every successful snapshot swap.
    ///
    /// Callbacks run synchronously on the refreshing task, before stream
    /// subscribers are woken; keep them short.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Arc<Snapshot>) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.insert(id, Arc::new(listener));
        id
    }

    /// Returns `false` if the listener was already gone.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    // ── Staleness & failures ─────────────────────────────────────

    /// Wall-clock time of the last successful refresh.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.inner.last_updated.load().as_ref().map(|s| s.wall)
    }

    /// Time since the last successful refresh.
    pub fn data_age(&self) -> Option<Duration> {
        self.inner.last_updated.load().as_ref().map(|s| s.at.elapsed())
    }

    /// `true` without data, or when the data is older than two poll
    /// intervals.
    pub fn is_stale(&self) -> bool {
        self.data_age()
            .is_none_or(|age| age > self.inner.interval.as_duration() * 2)
    }

    /// Background refresh failures since creation.
    pub fn failure_count(&self) -> u64 {
        self.inner.failure_count.load(Ordering::Relaxed)
    }

    /// Background refresh failures since the last success.
    pub fn consecutive_failures(&self) -> u64 {
        self.inner.consecutive_failures.load(Ordering::Relaxed)
    }

    pub fn last_failure(&self) -> Option<FailureRecord> {
        self.inner.last_failure.load_full().map(|f| (*f).clone())
    }

    // ── Internals ────────────────────────────────────────────────

    async fn background_refresh(&self) -> RefreshOutcome {
        let Ok(_guard) = self.inner.refresh_lock.try_lock() else {
            debug!(ucr = ?self.ucr_id(), "refresh already in flight, skipping");
            return RefreshOutcome::Skipped;
        };

        let began = self.inner.state.send_if_modified(|state| {
            if *state == RefreshState::Ready {
                *state = RefreshState::BackgroundRefreshing;
                true
            } else {
                false
            }
        });
        if !began {
            debug!(ucr = ?self.ucr_id(), state = %self.state(), "not ready, skipping refresh");
            return RefreshOutcome::Skipped;
        }

        let result = self.inner.client.fetch().await;

        if self.inner.cancel.is_cancelled() {
            debug!(ucr = ?self.ucr_id(), "discarding refresh result after shutdown");
            return RefreshOutcome::Discarded;
        }

        let outcome = match result {
            Ok(snapshot) => {
                self.apply(snapshot);
                self.inner.consecutive_failures.store(0, Ordering::Relaxed);
                RefreshOutcome::Updated
            }
            Err(e) => {
                self.record_failure(&e);
                RefreshOutcome::Failed(e.class())
            }
        };

        self.inner.state.send_if_modified(|state| {
            if *state == RefreshState::BackgroundRefreshing {
                *state = RefreshState::Ready;
                true
            } else {
                false
            }
        });
        outcome
    }

    /// Install a fresh snapshot, stamp it, and fan it out.
    fn apply(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.inner.client.install(Arc::clone(&snapshot));
        self.inner.last_updated.store(Some(Arc::new(UpdateStamp {
            at: Instant::now(),
            wall: Utc::now(),
        })));

        // Collect first so callbacks may add or remove listeners.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }

        self.inner.snapshot_tx.send_replace(Some(Arc::clone(&snapshot)));
        snapshot
    }

    fn record_failure(&self, err: &CoreError) {
        let total = self.inner.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        let consecutive = self
            .inner
            .consecutive_failures
            .fetch_add(1, Ordering::Relaxed)
            + 1;
        self.inner.last_failure.store(Some(Arc::new(FailureRecord {
            class: err.class(),
            message: err.to_string(),
            at: Utc::now(),
        })));

        warn!(
            ucr = ?self.ucr_id(),
            class = %err.class(),
            error = %err,
            consecutive,
            total,
            "background refresh failed, keeping previous snapshot"
        );
    }

    async fn spawn_scheduler(&self) {
        let coordinator = self.clone();
        let cancel = self.inner.cancel.clone();
        let period = self.inner.interval.as_duration();
        let handle = tokio::spawn(refresh_task(coordinator, period, cancel));
        *self.inner.task_handle.lock().await = Some(handle);
    }
}

// ── Background task ──────────────────────────────────────────────

/// Re-pull every `period` until cancelled.
async fn refresh_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let outcome = coordinator.background_refresh().await;
                debug!(ucr = ?coordinator.ucr_id(), ?outcome, "scheduled refresh");
            }
        }
    }
}
