use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use super::{CartPersistence, PersistenceError, Result};
use crate::domain::aggregates::CartEntry;

/// Moves cart writes off the caller's path. `save` only enqueues; a blocking
/// task drains the queue and writes the newest snapshot through `inner`.
pub struct BackgroundWriter {
    inner: Arc<dyn CartPersistence>,
    tx: mpsc::UnboundedSender<Vec<CartEntry>>,
    worker: JoinHandle<()>,
}

impl BackgroundWriter {
    /// Must be called from within a tokio runtime.
    pub fn spawn(inner: Arc<dyn CartPersistence>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<CartEntry>>();
        let sink = Arc::clone(&inner);
        let worker = tokio::task::spawn_blocking(move || {
            while let Some(mut latest) = rx.blocking_recv() {
                // Older queued snapshots are superseded by newer ones.
                while let Ok(next) = rx.try_recv() {
                    latest = next;
                }
                match sink.save(&latest) {
                    Ok(()) => tracing::trace!(entries = latest.len(), "Cart persisted"),
                    Err(e) => tracing::warn!(error = %e, "Cart write failed; keeping in-memory cart"),
                }
            }
        });
        Self { inner, tx, worker }
    }

    /// Stops accepting writes and waits for queued ones to land.
    pub async fn shutdown(self) {
        let Self { tx, worker, .. } = self;
        drop(tx);
        if let Err(e) = worker.await {
            tracing::error!(error = %e, "Cart writer task failed");
        }
    }
}

impl CartPersistence for BackgroundWriter {
    fn load(&self) -> Result<Vec<CartEntry>> { self.inner.load() }

    fn save(&self, entries: &[CartEntry]) -> Result<()> {
        self.tx.send(entries.to_vec()).map_err(|_| PersistenceError::WriterClosed)
    }
}
