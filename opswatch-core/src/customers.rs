//! Customer Configuration Store — persisted per-customer monitoring state
//!
//! Features:
//! - One entry per customer: vendor source tags, monitor flags, ticket
//!   creation flag, SLA notifications, reported-incident memory
//! - JSON file persistence (pretty-printed, diff-friendly)
//! - Description matching: case-insensitive equality, then substring
//! - Lazy entry creation when a tenant is first seen for a source
//! - Touched-flag reconciliation pruning entries for vanished tenants
//! - Single-writer discipline: all mutation goes through the store lock

use crate::error::{OpswatchError, OpswatchResult};
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// A scheduled recurring or one-off reminder task tied to a customer.
/// `interval` is the persisted one-letter code (O/W/M/BM/Q/H/Y); it stays
/// a plain string so entries with codes this build does not recognize
/// survive load/save round-trips untouched.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Notification {
    pub task: String,
    pub interval: String,
    #[serde(default)]
    pub triggered: Option<NaiveDate>,
}

/// Persisted per-customer configuration entry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CustomerEntry {
    pub id: u64,
    pub description: String,
    #[serde(rename = "source", default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub monitor_backup: bool,
    #[serde(default)]
    pub monitor_endpoints: bool,
    #[serde(default)]
    pub monitor_connectivity: bool,
    #[serde(default)]
    pub monitor_dtc: bool,
    #[serde(default)]
    pub create_ticket: bool,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub reported_alerts: Vec<String>,
    #[serde(default)]
    pub last_backup: Option<i64>,
    /// Seen during the current reconciliation pass. Never persisted.
    #[serde(skip)]
    pub touched: bool,
}

impl CustomerEntry {
    pub fn new(id: u64, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            sources: Vec::new(),
            monitor_backup: false,
            monitor_endpoints: false,
            monitor_connectivity: false,
            monitor_dtc: false,
            create_ticket: false,
            notifications: Vec::new(),
            reported_alerts: Vec::new(),
            last_backup: None,
            touched: false,
        }
    }
}

/// Case-insensitive equality first, then substring containment in either
/// direction (vendor tenant names often carry a legal-form suffix the
/// configured description lacks, or the other way around).
pub fn matches_description(entry_description: &str, needle: &str) -> bool {
    if entry_description.eq_ignore_ascii_case(needle) {
        return true;
    }
    let a = entry_description.to_lowercase();
    let b = needle.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

// ── Customer Store ──────────────────────────────────────────────────────────

pub struct CustomerStore {
    path: Option<PathBuf>,
    entries: RwLock<Vec<CustomerEntry>>,
    total_saves: AtomicU64,
    entries_created: AtomicU64,
}

impl CustomerStore {
    /// In-memory store with no backing file; `save` is a no-op.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(Vec::new()),
            total_saves: AtomicU64::new(0),
            entries_created: AtomicU64::new(0),
        }
    }

    /// Load from a JSON file, failing when the file is absent or invalid.
    pub fn load(path: impl Into<PathBuf>) -> OpswatchResult<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;
        let entries: Vec<CustomerEntry> = serde_json::from_str(&content)?;
        info!(path = %path.display(), entries = entries.len(), "Customer store loaded");
        Ok(Self {
            path: Some(path),
            entries: RwLock::new(entries),
            total_saves: AtomicU64::new(0),
            entries_created: AtomicU64::new(0),
        })
    }

    /// Load from a JSON file, starting empty (but bound to the path) when
    /// the file does not exist yet.
    pub fn load_or_default(path: impl Into<PathBuf>) -> OpswatchResult<Self> {
        let path = path.into();
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "Customer file not found, starting empty");
            Ok(Self {
                path: Some(path),
                entries: RwLock::new(Vec::new()),
                total_saves: AtomicU64::new(0),
                entries_created: AtomicU64::new(0),
            })
        }
    }

    /// Persist the current entries to the backing file, if any.
    pub fn save(&self) -> OpswatchResult<()> {
        let Some(path) = &self.path else { return Ok(()) };
        let entries = self.entries.read();
        let json = serde_json::to_string_pretty(&*entries)?;
        std::fs::write(path, json)?;
        self.total_saves.fetch_add(1, Ordering::Relaxed);
        info!(path = %path.display(), entries = entries.len(), "Customer store saved");
        Ok(())
    }

    // ── Lookup ──────────────────────────────────────────────────────────

    pub fn find(&self, description: &str) -> Option<CustomerEntry> {
        let entries = self.entries.read();
        entries
            .iter()
            .find(|e| e.description.eq_ignore_ascii_case(description))
            .or_else(|| entries.iter().find(|e| matches_description(&e.description, description)))
            .cloned()
    }

    pub fn entries(&self) -> Vec<CustomerEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    // ── Mutation ────────────────────────────────────────────────────────

    /// Run `f` against the entry matching `description`. Returns
    /// `CustomerNotFound` when nothing matches.
    pub fn update<R>(
        &self,
        description: &str,
        f: impl FnOnce(&mut CustomerEntry) -> R,
    ) -> OpswatchResult<R> {
        let mut entries = self.entries.write();
        let idx = entries
            .iter()
            .position(|e| e.description.eq_ignore_ascii_case(description))
            .or_else(|| entries.iter().position(|e| matches_description(&e.description, description)))
            .ok_or_else(|| OpswatchError::CustomerNotFound(description.to_string()))?;
        Ok(f(&mut entries[idx]))
    }

    /// Run `f` against the full entry list under the write lock.
    pub fn with_entries_mut<R>(&self, f: impl FnOnce(&mut Vec<CustomerEntry>) -> R) -> R {
        f(&mut self.entries.write())
    }

    /// Find-or-create the entry for a tenant seen at `source`, tagging the
    /// source and marking the entry touched for this reconciliation pass.
    pub fn ensure_entry(&self, description: &str, source: &str) -> CustomerEntry {
        let mut entries = self.entries.write();
        let idx = entries
            .iter()
            .position(|e| e.description.eq_ignore_ascii_case(description))
            .or_else(|| entries.iter().position(|e| matches_description(&e.description, description)));
        let entry = match idx {
            Some(i) => &mut entries[i],
            None => {
                let id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
                info!(customer = %description, source = %source, "New customer entry");
                self.entries_created.fetch_add(1, Ordering::Relaxed);
                entries.push(CustomerEntry::new(id, description));
                let last = entries.len() - 1;
                &mut entries[last]
            }
        };
        if !entry.sources.iter().any(|s| s.eq_ignore_ascii_case(source)) {
            entry.sources.push(source.to_string());
        }
        entry.touched = true;
        entry.clone()
    }

    /// Replace a customer's reported-incident memory.
    pub fn set_reported(&self, description: &str, reported: Vec<String>) -> OpswatchResult<()> {
        self.update(description, |e| e.reported_alerts = reported)
    }

    /// Drop reported ids that no longer correspond to a live incident.
    /// Manual compaction hook; nothing calls this automatically.
    pub fn compact_reported(&self, description: &str, live_ids: &[String]) -> OpswatchResult<usize> {
        self.update(description, |e| {
            let before = e.reported_alerts.len();
            e.reported_alerts.retain(|id| live_ids.contains(id));
            before - e.reported_alerts.len()
        })
    }

    // ── Reconciliation ──────────────────────────────────────────────────

    /// Clear touched flags ahead of a source's tenant pass.
    pub fn begin_reconcile(&self) {
        for entry in self.entries.write().iter_mut() {
            entry.touched = false;
        }
    }

    /// Remove `source` from entries the pass did not touch; entries left
    /// with no sources are dropped entirely. Returns the number of
    /// entries affected.
    pub fn prune_untouched(&self, source: &str) -> usize {
        let mut entries = self.entries.write();
        let mut affected = 0;
        for entry in entries.iter_mut() {
            if !entry.touched && entry.sources.iter().any(|s| s.eq_ignore_ascii_case(source)) {
                warn!(customer = %entry.description, source = %source, "Tenant no longer present at vendor");
                entry.sources.retain(|s| !s.eq_ignore_ascii_case(source));
                affected += 1;
            }
        }
        entries.retain(|e| !e.sources.is_empty() || e.touched);
        affected
    }

    // ── Stats ───────────────────────────────────────────────────────────

    pub fn total_saves(&self) -> u64 {
        self.total_saves.load(Ordering::Relaxed)
    }

    pub fn entries_created(&self) -> u64 {
        self.entries_created.load(Ordering::Relaxed)
    }
}
