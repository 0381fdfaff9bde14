//! Engine events for external monitoring
//!
//! Components report what they did through an [`EventSink`]. The sink is a
//! bounded channel; when the consumer falls behind, events are dropped with
//! a warning instead of blocking a provider workflow.

use tokio::sync::mpsc;
use tracing::warn;

use crate::model::{ChangeOwner, RecordId, RecordKind};

/// Events emitted by the engine and its components
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Periodic reconciliation started
    Started {
        interval_secs: u64,
    },

    /// Periodic reconciliation stopped
    Stopped {
        reason: String,
    },

    /// A zone was rebuilt from provider state
    ZoneSynced {
        zone: String,
        name: String,
        records: usize,
        retired: usize,
    },

    /// A zone sync failed before any local row was touched
    SyncFailed {
        zone: String,
        error: String,
    },

    /// A zone sync failed after its records were retired; the zone has
    /// no active records until the next successful sync
    SyncInconsistent {
        zone: String,
        error: String,
    },

    /// A zone was created at the provider and recorded locally
    ZoneCreated {
        zone: String,
        name: String,
    },

    /// A zone was deleted at the provider and retired locally
    ZoneDeleted {
        zone: String,
    },

    /// A record was created at the provider and recorded locally
    RecordCreated {
        zone: String,
        record_id: RecordId,
        name: String,
        kind: RecordKind,
    },

    /// A record was deleted at the provider and retired locally
    RecordDeleted {
        zone: String,
        record_id: RecordId,
    },

    /// A provider change id was stored
    ChangeRecorded {
        change_id: String,
        owner: ChangeOwner,
    },
}

/// Sending half of the event channel, shared by all components
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<EngineEvent>>,
}

impl EventSink {
    /// Create a sink and the receiver that observes it
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that discards every event
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Emit an event
    pub fn emit(&self, event: EngineEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
