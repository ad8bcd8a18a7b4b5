//! Endpoint Registry — per-tenant endpoint resolution
//!
//! Features:
//! - Lookup of an alert's endpoint in the tenant's endpoint directory
//! - Lazy synthesis through the vendor factory when no directory entry
//!   exists (every alert resolves to exactly one endpoint per tenant)
//! - Per-cycle alert-list reset that keeps the endpoint objects alive

use opswatch_core::{AlertRecord, Endpoint, Tenant};

/// Return the endpoint the alert refers to, synthesizing and inserting
/// one via the vendor factory when the tenant's directory has no entry.
/// Total: the factory is a function of the alert alone, so this always
/// succeeds.
pub fn resolve_endpoint<'a>(
    tenant: &'a mut Tenant,
    alert: &AlertRecord,
    factory: fn(&AlertRecord) -> Endpoint,
) -> &'a mut Endpoint {
    tenant
        .endpoints
        .entry(alert.endpoint_id.clone())
        .or_insert_with(|| factory(alert))
}

/// Reset every endpoint's alert lists. Must run exactly once per polling
/// cycle, before alerts are repopulated, so lists do not grow across
/// cycles.
pub fn clear_all(tenant: &mut Tenant) {
    for endpoint in tenant.endpoints.values_mut() {
        endpoint.clear_alerts();
    }
}
