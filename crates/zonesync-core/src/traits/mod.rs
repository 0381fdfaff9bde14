//! Core traits for zonesync
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ZoneProvider`]: Hosted DNS provider API
//! - [`RecordStore`]: Local durable mirror of zones, records and changes

pub mod record_store;
pub mod zone_provider;

pub use record_store::{RecordStore, RecordStoreFactory};
pub use zone_provider::{
    ChangeAction, ChangeRequest, ChangeStatus, CreatedZone, ProviderZone, RecordSet,
    ZoneProvider, ZoneProviderFactory,
};
