//! Change tracking
//!
//! Mutating provider calls return a change id that propagates
//! asynchronously. The tracker lists the stored ids and polls their status.
//! Statuses are fetched on every call and passed through as reported.

use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Change, ChangeOwner, ChangeRowId};
use crate::timed::TimedProvider;
use crate::traits::{ChangeStatus, RecordStore};

/// Status lookups for recorded changes
#[derive(Clone)]
pub struct ChangeTracker {
    provider: TimedProvider,
    store: Arc<dyn RecordStore>,
}

impl ChangeTracker {
    pub fn new(provider: TimedProvider, store: Arc<dyn RecordStore>) -> Self {
        Self { provider, store }
    }

    /// Poll the provider for a change's status
    pub async fn status(&self, change: &Change) -> Result<ChangeStatus> {
        let status = self.provider.get_change_status(&change.change_id).await?;
        debug!("Change {} is {}", change.change_id, status);
        Ok(status)
    }

    /// Poll the status of a change by its local id
    pub async fn status_by_id(&self, id: ChangeRowId) -> Result<ChangeStatus> {
        let change = self
            .store
            .get_change(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("change {}", id)))?;
        self.status(&change).await
    }

    /// Changes recorded for a zone or record, oldest first
    pub async fn changes_for(&self, owner: ChangeOwner) -> Result<Vec<Change>> {
        self.store.list_changes(owner).await
    }
}
