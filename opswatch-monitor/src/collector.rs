//! Collect Engine — one polling cycle per vendor source
//!
//! Features:
//! - Sequential tenant iteration (one tenant processed to completion
//!   before the next; no shared mutable state across tenants)
//! - Per-cycle endpoint alert reset, then normalize → correlate → dedup
//! - Customer store reconciliation: entries created on first sighting,
//!   touched-flag pruning for tenants gone from the vendor
//! - Ticket creation for customers with the flag set, one summary ticket
//!   per customer per cycle
//! - Injectable pacing hook between tenants (rate-limited vendor APIs;
//!   tests pass a no-op)
//! - Cycle counters and a serializable report

use crate::correlator;
use crate::dedup;
use crate::registry;
use crate::types::{SourceProfile, TicketPriority, TicketSink, VendorClient};
use opswatch_core::customers::CustomerStore;
use opswatch_core::{CustomerAlerts, OpswatchResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_PACING_MS: u64 = 50;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CollectReport {
    pub source: String,
    pub tenants_processed: u64,
    pub tenants_failed: u64,
    pub alerts_seen: u64,
    pub alerts_qualifying: u64,
    pub incidents_opened: u64,
    pub incidents_suppressed: u64,
    pub tickets_created: u64,
}

// ── Collect Engine ──────────────────────────────────────────────────────────

pub struct CollectEngine {
    profile: SourceProfile,
    store: Arc<CustomerStore>,
    pacing: Box<dyn Fn() + Send + Sync>,
    tenants_processed: AtomicU64,
    tenants_failed: AtomicU64,
    alerts_seen: AtomicU64,
    alerts_qualifying: AtomicU64,
    incidents_opened: AtomicU64,
    suppressed: AtomicU64,
    tickets_created: AtomicU64,
}

impl CollectEngine {
    pub fn new(profile: SourceProfile, store: Arc<CustomerStore>) -> Self {
        Self {
            profile,
            store,
            pacing: Box::new(|| {
                std::thread::sleep(std::time::Duration::from_millis(DEFAULT_PACING_MS))
            }),
            tenants_processed: AtomicU64::new(0),
            tenants_failed: AtomicU64::new(0),
            alerts_seen: AtomicU64::new(0),
            alerts_qualifying: AtomicU64::new(0),
            incidents_opened: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            tickets_created: AtomicU64::new(0),
        }
    }

    /// Replace the inter-tenant pacing hook.
    pub fn with_pacing(mut self, pacing: impl Fn() + Send + Sync + 'static) -> Self {
        self.pacing = Box::new(pacing);
        self
    }

    // ── Cycle ───────────────────────────────────────────────────────────

    /// Run one collection cycle against the vendor, returning the
    /// per-tenant aggregates that survived the reported-incident filter.
    pub fn run_cycle(
        &self,
        client: &dyn VendorClient,
        sink: &dyn TicketSink,
    ) -> OpswatchResult<Vec<CustomerAlerts>> {
        let source = self.profile.kind;
        self.store.begin_reconcile();

        let tenants = client.list_tenants()?;
        info!(source = %source, tenants = tenants.len(), "Collection cycle started");

        let mut results = Vec::with_capacity(tenants.len());
        for mut tenant in tenants {
            let entry = self.store.ensure_entry(&tenant.description, source.as_str());

            let alerts = match client.list_alerts(&tenant.id) {
                Ok(alerts) => alerts,
                Err(e) => {
                    warn!(source = %source, tenant = %tenant.description, error = %e,
                          "Alert fetch failed, tenant skipped this cycle");
                    self.tenants_failed.fetch_add(1, Ordering::Relaxed);
                    (self.pacing)();
                    continue;
                }
            };

            registry::clear_all(&mut tenant);
            let mut customer = CustomerAlerts::new(&tenant.description);
            for alert in alerts {
                self.alerts_seen.fetch_add(1, Ordering::Relaxed);
                if !(self.profile.is_active)(&alert) {
                    continue;
                }
                self.alerts_qualifying.fetch_add(1, Ordering::Relaxed);

                let endpoint =
                    registry::resolve_endpoint(&mut tenant, &alert, self.profile.make_endpoint);
                endpoint.alerts.push(alert.clone());

                let key = (self.profile.group_key)(&alert);
                if correlator::open_or_extend(&mut customer.devices, source, &key, &alert) {
                    self.incidents_opened.fetch_add(1, Ordering::Relaxed);
                }
                customer.alerts.push(alert);
            }

            let (updated, suppressed) =
                dedup::filter_unreported(&entry.reported_alerts, &mut customer);
            self.suppressed.fetch_add(suppressed, Ordering::Relaxed);
            self.store.set_reported(&tenant.description, updated)?;

            if entry.create_ticket && customer.incident_count() > 0 {
                self.deliver_ticket(sink, &customer);
            }

            self.tenants_processed.fetch_add(1, Ordering::Relaxed);
            results.push(customer);
            (self.pacing)();
        }

        let stale = self.store.prune_untouched(source.as_str());
        if stale > 0 {
            info!(source = %source, stale = stale, "Stale customer entries pruned");
        }
        self.store.save()?;

        info!(
            source = %source,
            tenants = self.tenants_processed.load(Ordering::Relaxed),
            incidents = self.incidents_opened.load(Ordering::Relaxed),
            suppressed = self.suppressed.load(Ordering::Relaxed),
            "Collection cycle complete"
        );
        Ok(results)
    }

    fn deliver_ticket(&self, sink: &dyn TicketSink, customer: &CustomerAlerts) {
        let title = format!(
            "{}: {} open incident(s) for {}",
            self.profile.kind,
            customer.incident_count(),
            customer.name
        );
        let mut lines: Vec<String> =
            customer.incidents().map(|i| (self.profile.label)(i)).collect();
        lines.sort();
        let body = lines.join("\n");

        match sink.create_ticket(&title, &body, TicketPriority::Normal, self.profile.kind.as_str())
        {
            Ok(ticket_id) => {
                info!(customer = %customer.name, ticket = %ticket_id, "Ticket created");
                self.tickets_created.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                warn!(customer = %customer.name, error = %e, "Ticket creation failed");
            }
        }
    }

    // ── Stats ───────────────────────────────────────────────────────────

    pub fn tenants_processed(&self) -> u64 {
        self.tenants_processed.load(Ordering::Relaxed)
    }

    pub fn tickets_created(&self) -> u64 {
        self.tickets_created.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> CollectReport {
        CollectReport {
            source: self.profile.kind.to_string(),
            tenants_processed: self.tenants_processed.load(Ordering::Relaxed),
            tenants_failed: self.tenants_failed.load(Ordering::Relaxed),
            alerts_seen: self.alerts_seen.load(Ordering::Relaxed),
            alerts_qualifying: self.alerts_qualifying.load(Ordering::Relaxed),
            incidents_opened: self.incidents_opened.load(Ordering::Relaxed),
            incidents_suppressed: self.suppressed.load(Ordering::Relaxed),
            tickets_created: self.tickets_created.load(Ordering::Relaxed),
        }
    }
}
