//! Seams and strategy types for the monitor crate.

use opswatch_core::{AlertRecord, Endpoint, Incident, OpswatchResult, SourceKind, Tenant};

/// What the collect cycle needs from a vendor API client. Fetch errors
/// are per-call; a failing tenant is skipped for the cycle and picked up
/// again on the next successful one.
pub trait VendorClient: Send + Sync {
    fn list_tenants(&self) -> OpswatchResult<Vec<Tenant>>;
    fn list_alerts(&self, tenant_id: &str) -> OpswatchResult<Vec<AlertRecord>>;
}

/// Ticketing system seam. Delivery is best-effort; idempotence comes from
/// the reported-incident tracker upstream, not from the sink.
pub trait TicketSink: Send + Sync {
    fn create_ticket(
        &self,
        title: &str,
        body: &str,
        priority: TicketPriority,
        tag: &str,
    ) -> OpswatchResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TicketPriority {
    Low,
    Normal,
    High,
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketPriority::Low => f.write_str("low"),
            TicketPriority::Normal => f.write_str("normal"),
            TicketPriority::High => f.write_str("high"),
        }
    }
}

/// Per-vendor strategy bundle. Everything the correlation core must not
/// hardcode lives here: which severities qualify, how alerts group into
/// incidents, how unknown endpoints are synthesized, and how an incident
/// is labelled for humans.
#[derive(Clone, Copy)]
pub struct SourceProfile {
    pub kind: SourceKind,
    /// Vendor severity policy: does this alert open or extend an incident?
    pub is_active: fn(&AlertRecord) -> bool,
    /// Correlation key within one endpoint. For some vendors the endpoint
    /// identity itself is the key and this returns a constant.
    pub group_key: fn(&AlertRecord) -> String,
    /// Factory for endpoints first seen through an alert.
    pub make_endpoint: fn(&AlertRecord) -> Endpoint,
    /// Human-facing incident label used in ticket bodies.
    pub label: fn(&Incident) -> String,
}
