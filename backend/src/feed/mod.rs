//! Live resource feed.
//!
//! After every write the full resource list is offered to all subscribers. There is
//! no diffing and no backlog: each subscriber only ever sees the newest snapshot,
//! and a snapshot older than the one already held is dropped.

use std::sync::Arc;

use tokio::sync::watch;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::ResourceSnapshot;

/// What subscribers observe: the newest snapshot published so far, if any.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<ResourceSnapshot>>>;

/// Latest-value hub for resource snapshots.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: Arc<watch::Sender<Option<Arc<ResourceSnapshot>>>>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to future snapshots. Whatever is held right now counts as seen.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Read the current list and offer it to subscribers.
    ///
    /// Returns whether subscribers were notified. Skips the read when nobody listens.
    pub async fn publish(&self, repo: &Repository) -> Result<bool, AppError> {
        if self.subscriber_count() == 0 {
            return Ok(false);
        }
        let snapshot = repo.resource_snapshot().await?;
        Ok(self.offer(snapshot))
    }

    /// Replace the held snapshot unless it is at least as new as `snapshot`.
    fn offer(&self, snapshot: ResourceSnapshot) -> bool {
        let revision_id = snapshot.revision_id;
        let replaced = self.sender.send_if_modified(move |held| {
            if held
                .as_ref()
                .is_some_and(|current| current.revision_id >= revision_id)
            {
                return false;
            }
            *held = Some(Arc::new(snapshot));
            true
        });

        if !replaced {
            tracing::debug!(revision_id, "Dropped stale resource snapshot");
        }
        replaced
    }
}
