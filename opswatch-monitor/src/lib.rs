//! # Opswatch Monitor — vendor alert collection and incident correlation
//!
//! One collect cycle per vendor source: list tenants, normalize their
//! alerts, correlate same-type alerts into time-bounded incidents per
//! endpoint, suppress incidents already surfaced, and hand the remainder
//! to the ticket sink. Vendor HTTP clients and the ticketing system stay
//! behind the `VendorClient` and `TicketSink` seams.

pub mod collector;
pub mod correlator;
pub mod dedup;
pub mod registry;
pub mod sources;
pub mod types;

pub use collector::{CollectEngine, CollectReport};
pub use types::{SourceProfile, TicketPriority, TicketSink, VendorClient};

#[cfg(test)]
mod tests;
