//! Incident Correlator — (endpoint, alert-type) incident windows
//!
//! Features:
//! - Absent → Open: the first qualifying alert for an (endpoint, type)
//!   pair opens an incident with start = end = alert.created
//! - Open → Open (extended): repeat alerts for the same pair move the end
//!   of the window and carry the latest alert; the start never moves
//! - Distinct alert types on one endpoint are independent incidents
//! - Incidents close implicitly by not reappearing on a later cycle
//!
//! The end time tracks the last alert PROCESSED, not the maximum
//! timestamp: callers feeding unsorted alerts get last-write-wins
//! semantics. Tests pin this rather than hiding it behind a sort.

use opswatch_core::{AlertRecord, Incident, SourceKind};
use std::collections::HashMap;
use tracing::debug;

/// Open a new incident or extend the live one for this alert's
/// (endpoint, group-key) pair. Returns `true` when a new incident was
/// opened.
pub fn open_or_extend(
    devices: &mut HashMap<String, HashMap<String, Incident>>,
    source: SourceKind,
    group_key: &str,
    alert: &AlertRecord,
) -> bool {
    let by_type = devices.entry(alert.endpoint_id.clone()).or_default();
    match by_type.get_mut(group_key) {
        Some(incident) => {
            incident.end_time = alert.created;
            incident.alert = alert.clone();
            debug!(
                source = %source,
                endpoint = %alert.endpoint_id,
                key = %group_key,
                "Incident window extended"
            );
            false
        }
        None => {
            by_type.insert(
                group_key.to_string(),
                Incident {
                    source,
                    endpoint_id: alert.endpoint_id.clone(),
                    start_time: alert.created,
                    end_time: alert.created,
                    alert: alert.clone(),
                },
            );
            true
        }
    }
}
