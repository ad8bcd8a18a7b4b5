//! # Opswatch Feeds — advisory feed deduplication and classification
//!
//! Consumes already-parsed vulnerability-advisory feed items (NCSC, DTC),
//! keeps a persistent seen-set so re-polls emit nothing twice, and
//! classifies each genuinely new item as high or normal priority for the
//! customers monitoring that feed. Fetching and RSS parsing happen
//! upstream; this crate only sees parsed items.

pub mod advisory;

pub use advisory::{Advisory, FeedEngine, FeedItem, FeedProfile, FeedReport, Priority};
