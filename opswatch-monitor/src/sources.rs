//! Vendor source profiles — the per-portal policy bundles
//!
//! Each vendor gets a [`SourceProfile`]: which severities qualify, how
//! alerts group into incidents, how endpoints are synthesized from a
//! first alert, and how incidents are labelled. The correlation core
//! never branches on the vendor; it runs whatever profile it is handed.
//!
//! Severity vocabularies are vendor-specific free text. The backup
//! portals report job status words, Sophos reports low/medium/high,
//! Zabbix reports numeric codes 0-5 that `zabbix_severity_text` maps to
//! the usual trigger names.

use crate::types::SourceProfile;
use opswatch_core::payload::get_path;
use opswatch_core::{AlertRecord, Endpoint, SourceKind};

/// Profile for a vendor source.
pub fn profile(kind: SourceKind) -> SourceProfile {
    match kind {
        SourceKind::CloudAlly => SourceProfile {
            kind,
            is_active: |a| !a.severity.eq_ignore_ascii_case("success"),
            // One backup task = one incident stream; the task is the endpoint.
            group_key: |a| a.endpoint_id.clone(),
            make_endpoint: |a| {
                let hostname = pick(&[get_path(&a.raw, "entityName"), a.description.clone()]);
                endpoint_from_alert(a, hostname)
            },
            label: |i| {
                format!(
                    "CloudAlly backup '{}' {} since {}",
                    i.alert.endpoint_id,
                    i.alert.severity.to_lowercase(),
                    format_time(i.start_time)
                )
            },
        },
        SourceKind::Skykick => SourceProfile {
            kind,
            is_active: |a| !a.severity.eq_ignore_ascii_case("resolved"),
            group_key: |a| a.category.clone(),
            make_endpoint: |a| {
                let hostname = pick(&[get_path(&a.raw, "subscriptionName"), a.description.clone()]);
                endpoint_from_alert(a, hostname)
            },
            label: |i| format!("Skykick {}: {}", i.alert.category, i.alert.description),
        },
        SourceKind::Sophos => SourceProfile {
            kind,
            is_active: |a| !a.severity.eq_ignore_ascii_case("low"),
            group_key: |a| a.category.clone(),
            make_endpoint: |a| {
                let hostname = pick(&[get_path(&a.raw, "managedAgent.name"), a.endpoint_id.clone()]);
                endpoint_from_alert(a, hostname)
            },
            label: |i| {
                format!(
                    "Sophos {} alert on {} ({})",
                    i.alert.severity, i.endpoint_id, i.alert.category
                )
            },
        },
        SourceKind::Veeam => SourceProfile {
            kind,
            is_active: |a| {
                !a.severity.eq_ignore_ascii_case("success") && !a.severity.eq_ignore_ascii_case("running")
            },
            group_key: |a| a.category.clone(),
            make_endpoint: |a| endpoint_from_alert(a, a.description.clone()),
            label: |i| {
                format!(
                    "Veeam job '{}' {} ({} - {})",
                    i.alert.endpoint_id,
                    i.alert.severity,
                    format_time(i.start_time),
                    format_time(i.end_time)
                )
            },
        },
        SourceKind::Integra365 => SourceProfile {
            kind,
            is_active: |a| {
                !a.severity.eq_ignore_ascii_case("success") && !a.severity.eq_ignore_ascii_case("running")
            },
            group_key: |a| a.endpoint_id.clone(),
            make_endpoint: |a| {
                let hostname = pick(&[get_path(&a.raw, "organization.name"), a.description.clone()]);
                endpoint_from_alert(a, hostname)
            },
            label: |i| {
                format!("Integra365 backup '{}' {}", i.alert.endpoint_id, i.alert.severity.to_lowercase())
            },
        },
        SourceKind::Zabbix => SourceProfile {
            kind,
            // Codes 0 (not classified) and 1 (information) do not qualify.
            is_active: |a| a.severity.parse::<u8>().map_or(false, |code| code >= 2),
            // The trigger name is the alert type; one trigger per window.
            group_key: |a| a.description.clone(),
            make_endpoint: |a| {
                let hostname = pick(&[get_path(&a.raw, "hosts.0.host"), a.endpoint_id.clone()]);
                endpoint_from_alert(a, hostname)
            },
            label: |i| {
                format!(
                    "{}: {} [{}]",
                    i.alert.endpoint_id,
                    i.alert.description,
                    zabbix_severity_text(&i.alert.severity)
                )
            },
        },
    }
}

/// All built-in profiles, in polling order.
pub fn all_profiles() -> Vec<SourceProfile> {
    [
        SourceKind::CloudAlly,
        SourceKind::Skykick,
        SourceKind::Sophos,
        SourceKind::Veeam,
        SourceKind::Integra365,
        SourceKind::Zabbix,
    ]
    .into_iter()
    .map(profile)
    .collect()
}

/// Map a Zabbix numeric severity code to its trigger severity name.
/// Unrecognized input passes through unchanged.
pub fn zabbix_severity_text(code: &str) -> String {
    match code {
        "0" => "Not classified".to_string(),
        "1" => "Information".to_string(),
        "2" => "Warning".to_string(),
        "3" => "Average".to_string(),
        "4" => "High".to_string(),
        "5" => "Disaster".to_string(),
        other => other.to_string(),
    }
}

fn endpoint_from_alert(alert: &AlertRecord, hostname: String) -> Endpoint {
    Endpoint {
        id: alert.endpoint_id.clone(),
        kind: alert.endpoint_type.clone(),
        hostname,
        tenant_id: alert.tenant_id.clone(),
        status: String::new(),
        alerts: Vec::new(),
        incident_alerts: Vec::new(),
    }
}

fn pick(candidates: &[String]) -> String {
    candidates
        .iter()
        .find(|c| !c.is_empty())
        .cloned()
        .unwrap_or_default()
}

pub(crate) fn format_time(epoch_secs: i64) -> String {
    chrono::DateTime::from_timestamp(epoch_secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| epoch_secs.to_string())
}
