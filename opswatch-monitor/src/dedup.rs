//! Reported-Incident Tracker — suppression of already-surfaced incidents
//!
//! Features:
//! - Pre-emptive memory: every live incident id is added to the reported
//!   set before any report goes out ("seen" is established before
//!   "reported")
//! - Suppression against the ORIGINAL input set only, so ids added this
//!   cycle never suppress their own incident
//! - Legacy compatibility: bare alert ids in the set still suppress
//! - Devices left without incidents are dropped from the outgoing report
//! - The returned set wholly replaces the stored one; ids of incidents
//!   that stopped recurring are kept until compacted manually
//!   (`CustomerStore::compact_reported`), never pruned here

use opswatch_core::CustomerAlerts;
use std::collections::HashSet;
use tracing::debug;

/// Filter `current` down to incidents not yet surfaced, returning the
/// replacement reported-set and the number of suppressed incidents.
pub fn filter_unreported(reported: &[String], current: &mut CustomerAlerts) -> (Vec<String>, u64) {
    let original: HashSet<&str> = reported.iter().map(|s| s.as_str()).collect();
    let mut updated: Vec<String> = reported.to_vec();

    for incident in current.incidents() {
        updated.push(incident.dedup_id());
    }

    let mut suppressed = 0u64;
    for by_type in current.devices.values_mut() {
        by_type.retain(|_, incident| {
            let known = original.contains(incident.dedup_id().as_str())
                || original.contains(incident.alert.id.as_str());
            if known {
                suppressed += 1;
            }
            !known
        });
    }
    current.devices.retain(|_, by_type| !by_type.is_empty());

    let mut seen = HashSet::new();
    updated.retain(|id| seen.insert(id.clone()));

    debug!(
        customer = %current.name,
        remembered = updated.len(),
        suppressed = suppressed,
        "Reported-incident filter applied"
    );
    (updated, suppressed)
}
