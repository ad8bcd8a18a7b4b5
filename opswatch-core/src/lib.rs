//! # Opswatch Core — Shared model and customer configuration
//!
//! Common ground for every monitoring crate: the normalized alert/tenant/
//! incident model, the persisted customer configuration store, and the
//! generic raw-payload path lookup vendor adapters use to read fields the
//! normalized model does not carry.

pub mod customers;
pub mod error;
pub mod payload;
pub mod types;

pub use error::{OpswatchError, OpswatchResult};
pub use types::{AlertRecord, CustomerAlerts, Endpoint, Incident, SourceKind, Tenant};
