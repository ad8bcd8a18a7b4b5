//! Shared types for the alert monitoring pipeline.

use std::collections::HashMap;

/// Vendor portals the monitors poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SourceKind {
    CloudAlly,
    Skykick,
    Sophos,
    Veeam,
    Integra365,
    Zabbix,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::CloudAlly => "CloudAlly",
            SourceKind::Skykick => "Skykick",
            SourceKind::Sophos => "Sophos",
            SourceKind::Veeam => "Veeam",
            SourceKind::Integra365 => "Integra365",
            SourceKind::Zabbix => "Zabbix",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vendor alert normalized into the common shape.
///
/// `severity` is the vendor's own vocabulary ("FAILED", "Resolved", a
/// Zabbix code mapped to text) and is never interpreted here; each source
/// profile supplies the predicate deciding which severities qualify.
/// Fields the normalized shape does not carry stay in `raw` and are read
/// through [`crate::payload::get_path`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AlertRecord {
    pub id: String,
    /// Creation time, epoch seconds.
    pub created: i64,
    pub description: String,
    pub severity: String,
    pub category: String,
    pub product: String,
    pub endpoint_id: String,
    pub endpoint_type: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// A monitored device/mailbox/job/host owned by a tenant.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Endpoint {
    pub id: String,
    pub kind: String,
    pub hostname: String,
    pub tenant_id: String,
    pub status: String,
    #[serde(default)]
    pub alerts: Vec<AlertRecord>,
    #[serde(default)]
    pub incident_alerts: Vec<AlertRecord>,
}

impl Endpoint {
    /// Empties both alert lists without dropping the endpoint itself.
    /// Runs once per polling cycle, before alerts are repopulated.
    pub fn clear_alerts(&mut self) {
        self.alerts.clear();
        self.incident_alerts.clear();
    }
}

/// A vendor-side customer/organization account. `id` is unique within one
/// vendor source only; `description` is the display name used as the
/// cross-system join key.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Tenant {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub endpoints: HashMap<String, Endpoint>,
    #[serde(default)]
    pub alerts: Vec<AlertRecord>,
}

impl Tenant {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            endpoints: HashMap::new(),
            alerts: Vec::new(),
        }
    }
}

/// A correlated, time-bounded grouping of same-type alerts for one
/// endpoint. Rebuilt from current alerts every collection cycle; only the
/// identifiers of incidents already surfaced are persisted.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Incident {
    pub source: SourceKind,
    pub endpoint_id: String,
    /// First qualifying alert's creation time, epoch seconds.
    pub start_time: i64,
    /// Most recent qualifying alert's creation time, epoch seconds.
    pub end_time: i64,
    pub alert: AlertRecord,
}

impl Incident {
    /// Identity used by the reported-incident tracker.
    pub fn dedup_id(&self) -> String {
        format!("{}-{}", self.source, self.alert.id)
    }
}

/// Per-tenant aggregate built during one collection cycle: all qualifying
/// alerts plus the live incidents keyed by endpoint id and alert type.
/// An (endpoint, type) key maps to at most one live incident.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CustomerAlerts {
    pub name: String,
    #[serde(default)]
    pub alerts: Vec<AlertRecord>,
    #[serde(default)]
    pub devices: HashMap<String, HashMap<String, Incident>>,
}

impl CustomerAlerts {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), alerts: Vec::new(), devices: HashMap::new() }
    }

    /// Number of live incidents across all devices.
    pub fn incident_count(&self) -> usize {
        self.devices.values().map(|types| types.len()).sum()
    }

    /// Iterate all live incidents.
    pub fn incidents(&self) -> impl Iterator<Item = &Incident> {
        self.devices.values().flat_map(|types| types.values())
    }
}
