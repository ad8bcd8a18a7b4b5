use crate::collector::CollectEngine;
use crate::correlator::open_or_extend;
use crate::dedup::filter_unreported;
use crate::registry::{clear_all, resolve_endpoint};
use crate::sources::{profile, zabbix_severity_text};
use crate::types::{TicketPriority, TicketSink, VendorClient};
use opswatch_core::customers::CustomerStore;
use opswatch_core::{
    AlertRecord, CustomerAlerts, Endpoint, OpswatchError, OpswatchResult, SourceKind, Tenant,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

fn alert(id: &str, created: i64, endpoint_id: &str, severity: &str, category: &str) -> AlertRecord {
    AlertRecord {
        id: id.into(),
        created,
        description: format!("alert {}", id),
        severity: severity.into(),
        category: category.into(),
        product: "test".into(),
        endpoint_id: endpoint_id.into(),
        endpoint_type: "job".into(),
        tenant_id: "t1".into(),
        raw: serde_json::Value::Null,
    }
}

fn test_factory(a: &AlertRecord) -> Endpoint {
    Endpoint {
        id: a.endpoint_id.clone(),
        kind: a.endpoint_type.clone(),
        hostname: a.endpoint_id.clone(),
        tenant_id: a.tenant_id.clone(),
        status: String::new(),
        alerts: Vec::new(),
        incident_alerts: Vec::new(),
    }
}

// ── Endpoint registry ───────────────────────────────────────────────────────

#[test]
fn test_lazy_endpoint_creation_exactly_once() {
    let mut tenant = Tenant::new("t1", "Acme");
    let a1 = alert("a1", 100, "ep-1", "Failed", "disk");
    let a2 = alert("a2", 200, "ep-1", "Failed", "disk");

    resolve_endpoint(&mut tenant, &a1, test_factory);
    assert_eq!(tenant.endpoints.len(), 1);
    resolve_endpoint(&mut tenant, &a2, test_factory);
    assert_eq!(tenant.endpoints.len(), 1);

    let a3 = alert("a3", 300, "ep-2", "Failed", "disk");
    resolve_endpoint(&mut tenant, &a3, test_factory);
    assert_eq!(tenant.endpoints.len(), 2);
}

#[test]
fn test_clear_all_keeps_endpoints() {
    let mut tenant = Tenant::new("t1", "Acme");
    let a1 = alert("a1", 100, "ep-1", "Failed", "disk");
    let ep = resolve_endpoint(&mut tenant, &a1, test_factory);
    ep.alerts.push(a1.clone());
    ep.incident_alerts.push(a1);

    clear_all(&mut tenant);
    assert_eq!(tenant.endpoints.len(), 1);
    let ep = &tenant.endpoints["ep-1"];
    assert!(ep.alerts.is_empty());
    assert!(ep.incident_alerts.is_empty());
}

// ── Incident correlation ────────────────────────────────────────────────────

#[test]
fn test_incident_merge_window() {
    let mut devices = HashMap::new();
    let t1 = 1_700_000_000;
    let t2 = t1 + 1800;

    let opened = open_or_extend(&mut devices, SourceKind::Veeam, "disk", &alert("a1", t1, "ep-1", "Failed", "disk"));
    assert!(opened);
    let opened = open_or_extend(&mut devices, SourceKind::Veeam, "disk", &alert("a2", t2, "ep-1", "Failed", "disk"));
    assert!(!opened);

    let incident = &devices["ep-1"]["disk"];
    assert_eq!(incident.start_time, t1);
    assert_eq!(incident.end_time, t2);
    assert_eq!(incident.alert.id, "a2");

    // A different type on the same endpoint is an independent incident.
    let opened = open_or_extend(&mut devices, SourceKind::Veeam, "tape", &alert("a3", t2, "ep-1", "Failed", "tape"));
    assert!(opened);
    assert_eq!(devices["ep-1"].len(), 2);
    assert_eq!(devices["ep-1"]["disk"].end_time, t2);
}

#[test]
fn test_end_time_last_processed_wins() {
    // Unsorted input: the later-processed alert sets the end even though
    // its timestamp is earlier. Documented behavior, pinned here.
    let mut devices = HashMap::new();
    open_or_extend(&mut devices, SourceKind::Veeam, "disk", &alert("a2", 2000, "ep-1", "Failed", "disk"));
    open_or_extend(&mut devices, SourceKind::Veeam, "disk", &alert("a1", 1000, "ep-1", "Failed", "disk"));

    let incident = &devices["ep-1"]["disk"];
    assert_eq!(incident.start_time, 2000);
    assert_eq!(incident.end_time, 1000);
    assert_eq!(incident.alert.id, "a1");
}

// ── Reported-incident dedup ─────────────────────────────────────────────────

fn customer_with_incident(id: &str, created: i64) -> CustomerAlerts {
    let mut customer = CustomerAlerts::new("Acme");
    open_or_extend(&mut customer.devices, SourceKind::Veeam, "disk", &alert(id, created, "ep-1", "Failed", "disk"));
    customer
}

#[test]
fn test_already_reported_incident_never_reemitted() {
    let mut customer = customer_with_incident("a1", 100);
    let reported = vec!["Veeam-a1".to_string()];

    let (updated, suppressed) = filter_unreported(&reported, &mut customer);
    assert_eq!(suppressed, 1);
    assert!(customer.devices.is_empty());
    assert_eq!(updated, vec!["Veeam-a1".to_string()]);
}

#[test]
fn test_preemptive_add_before_report() {
    let mut customer = customer_with_incident("a1", 100);

    let (updated, suppressed) = filter_unreported(&[], &mut customer);
    assert_eq!(suppressed, 0);
    // Remembered as seen even though nothing was reported yet.
    assert_eq!(updated, vec!["Veeam-a1".to_string()]);
    // Still in the outgoing report: it was not in the ORIGINAL set.
    assert_eq!(customer.incident_count(), 1);
}

#[test]
fn test_legacy_bare_alert_id_suppresses() {
    let mut customer = customer_with_incident("a1", 100);
    let reported = vec!["a1".to_string()];

    let (updated, suppressed) = filter_unreported(&reported, &mut customer);
    assert_eq!(suppressed, 1);
    assert!(customer.devices.is_empty());
    assert_eq!(updated, vec!["a1".to_string(), "Veeam-a1".to_string()]);
}

#[test]
fn test_empty_device_dropped_others_kept() {
    let mut customer = CustomerAlerts::new("Acme");
    open_or_extend(&mut customer.devices, SourceKind::Veeam, "disk", &alert("a1", 100, "ep-1", "Failed", "disk"));
    open_or_extend(&mut customer.devices, SourceKind::Veeam, "disk", &alert("a2", 100, "ep-2", "Failed", "disk"));

    let (_, suppressed) = filter_unreported(&["Veeam-a1".to_string()], &mut customer);
    assert_eq!(suppressed, 1);
    assert!(!customer.devices.contains_key("ep-1"));
    assert_eq!(customer.devices["ep-2"].len(), 1);
}

// ── Source profiles ─────────────────────────────────────────────────────────

#[test]
fn test_zabbix_severity_mapping_and_predicate() {
    assert_eq!(zabbix_severity_text("4"), "High");
    assert_eq!(zabbix_severity_text("0"), "Not classified");
    assert_eq!(zabbix_severity_text("weird"), "weird");

    let p = profile(SourceKind::Zabbix);
    assert!(!(p.is_active)(&alert("a", 0, "host-1", "1", "")));
    assert!((p.is_active)(&alert("a", 0, "host-1", "2", "")));
    assert!((p.is_active)(&alert("a", 0, "host-1", "5", "")));
    assert!(!(p.is_active)(&alert("a", 0, "host-1", "bogus", "")));
}

#[test]
fn test_backup_vendor_predicates() {
    let veeam = profile(SourceKind::Veeam);
    assert!(!(veeam.is_active)(&alert("a", 0, "job", "Success", "backup")));
    assert!(!(veeam.is_active)(&alert("a", 0, "job", "Running", "backup")));
    assert!((veeam.is_active)(&alert("a", 0, "job", "Failed", "backup")));

    let skykick = profile(SourceKind::Skykick);
    assert!(!(skykick.is_active)(&alert("a", 0, "sub", "Resolved", "backup")));
    assert!((skykick.is_active)(&alert("a", 0, "sub", "Open", "backup")));
}

// ── Collect cycle ───────────────────────────────────────────────────────────

struct FakeClient {
    tenants: Vec<Tenant>,
    alerts: HashMap<String, Vec<AlertRecord>>,
    fail_for: Option<String>,
}

impl VendorClient for FakeClient {
    fn list_tenants(&self) -> OpswatchResult<Vec<Tenant>> {
        Ok(self.tenants.clone())
    }

    fn list_alerts(&self, tenant_id: &str) -> OpswatchResult<Vec<AlertRecord>> {
        if self.fail_for.as_deref() == Some(tenant_id) {
            return Err(OpswatchError::Vendor("503 from portal".into()));
        }
        Ok(self.alerts.get(tenant_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct CollectingSink {
    tickets: Mutex<Vec<(String, String)>>,
}

impl TicketSink for CollectingSink {
    fn create_ticket(
        &self,
        title: &str,
        body: &str,
        _priority: TicketPriority,
        _tag: &str,
    ) -> OpswatchResult<String> {
        let mut tickets = self.tickets.lock();
        tickets.push((title.to_string(), body.to_string()));
        Ok(format!("T-{}", tickets.len()))
    }
}

#[test]
fn test_collect_cycle_reports_once_then_suppresses() {
    let store = Arc::new(CustomerStore::in_memory());
    store.ensure_entry("Acme", "Veeam");
    store.update("Acme", |e| e.create_ticket = true).unwrap();

    let client = FakeClient {
        tenants: vec![Tenant::new("t1", "Acme")],
        alerts: HashMap::from([(
            "t1".to_string(),
            vec![
                alert("a1", 1_700_000_000, "ep-1", "Failed", "disk"),
                alert("a2", 1_700_001_800, "ep-1", "Failed", "disk"),
                alert("a3", 1_700_001_000, "ep-1", "Success", "disk"),
            ],
        )]),
        fail_for: None,
    };
    let sink = CollectingSink::default();

    let engine = CollectEngine::new(profile(SourceKind::Veeam), store.clone()).with_pacing(|| {});
    let results = engine.run_cycle(&client, &sink).unwrap();

    assert_eq!(results.len(), 1);
    let incident = &results[0].devices["ep-1"]["disk"];
    assert_eq!(incident.start_time, 1_700_000_000);
    assert_eq!(incident.end_time, 1_700_001_800);
    assert_eq!(engine.tickets_created(), 1);

    let acme = store.find("Acme").unwrap();
    assert_eq!(acme.reported_alerts, vec!["Veeam-a2".to_string()]);

    // Same alerts next cycle: the incident is still open, nothing new.
    let results = engine.run_cycle(&client, &sink).unwrap();
    assert!(results[0].devices.is_empty());
    assert_eq!(engine.tickets_created(), 1);
    assert_eq!(engine.report().incidents_suppressed, 1);
}

#[test]
fn test_failed_tenant_skipped_not_pruned() {
    let store = Arc::new(CustomerStore::in_memory());
    store.ensure_entry("Acme", "Veeam");
    store.ensure_entry("Globex", "Veeam");

    let client = FakeClient {
        tenants: vec![Tenant::new("t1", "Acme"), Tenant::new("t2", "Globex")],
        alerts: HashMap::from([(
            "t1".to_string(),
            vec![alert("a1", 100, "ep-1", "Failed", "disk")],
        )]),
        fail_for: Some("t2".to_string()),
    };
    let sink = CollectingSink::default();

    let engine = CollectEngine::new(profile(SourceKind::Veeam), store.clone()).with_pacing(|| {});
    let results = engine.run_cycle(&client, &sink).unwrap();

    assert_eq!(results.len(), 1);
    let report = engine.report();
    assert_eq!(report.tenants_processed, 1);
    assert_eq!(report.tenants_failed, 1);
    // Globex was listed, so its entry survives the reconciliation pass.
    assert!(store.find("Globex").is_some());
}

#[test]
fn test_vanished_tenant_pruned_after_cycle() {
    let store = Arc::new(CustomerStore::in_memory());
    store.ensure_entry("Gone Corp", "Veeam");

    let client = FakeClient {
        tenants: vec![Tenant::new("t1", "Acme")],
        alerts: HashMap::new(),
        fail_for: None,
    };
    let sink = CollectingSink::default();

    let engine = CollectEngine::new(profile(SourceKind::Veeam), store.clone()).with_pacing(|| {});
    engine.run_cycle(&client, &sink).unwrap();

    assert!(store.find("Gone Corp").is_none());
    assert!(store.find("Acme").is_some());
}
