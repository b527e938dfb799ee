// ── Reactive snapshot stream ──
//
// Lets hosts await new snapshots instead of registering callbacks.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Snapshot;

/// A subscription to the snapshots of one coordinator.
///
/// Point-in-time access via [`latest`](Self::latest), change notification
/// via [`changed`](Self::changed), or as a `Stream` that yields the current
/// snapshot (if any) and then every replacement.
pub struct SnapshotStream {
    receiver: watch::Receiver<Option<Arc<Snapshot>>>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<Option<Arc<Snapshot>>>) -> Self {
        Self { receiver }
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next successful refresh.
    /// Returns `None` once the coordinator is gone.
    pub async fn changed(&mut self) -> Option<Arc<Snapshot>> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(snapshot) = self.receiver.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }

    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`; skips the empty
/// pre-first-refresh value.
pub struct SnapshotWatchStream {
    inner: WatchStream<Option<Arc<Snapshot>>>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<Snapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Some(snapshot))) => return Poll::Ready(Some(snapshot)),
                Poll::Ready(Some(None)) => {}
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn stream_skips_empty_value_and_yields_updates() {
        let (tx, rx) = watch::channel(None);
        let mut stream = SnapshotStream::new(rx).into_stream();

        tx.send_replace(Some(Arc::new(Snapshot {
            active_ucr: Some(7),
            ..Snapshot::default()
        })));

        let first = stream.next().await.unwrap();
        assert_eq!(first.active_ucr, Some(7));

        drop(tx);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn changed_returns_none_when_sender_dropped() {
        let (tx, rx) = watch::channel(None);
        let mut snapshots = SnapshotStream::new(rx);
        drop(tx);
        assert!(snapshots.changed().await.is_none());
        assert!(snapshots.latest().is_none());
    }
}
