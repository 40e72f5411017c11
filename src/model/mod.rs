//! Core data model for opstrack.
//!
//! These types mirror the tracker's REST response bodies: events, catalog
//! entries and the listings that carry them. Enumerations and timestamps are
//! normalized once, while deserializing; nothing downstream compares raw
//! strings.

mod catalog;
mod event;
mod time;
mod wire;

pub use catalog::{
    Catalog, CatalogListing, CatalogType, CommunicationChannel, Language, Sla, SlaLevel,
    UsedDeliverable,
};
pub use event::{
    Environment, Event, EventAttributes, EventLinks, EventListing, EventMetadata, EventType,
    Priority, Status,
};
pub use wire::{UnknownValue, WireEnum};
