//! Feed Engine — seen-set deduplication and priority classification
//!
//! Features:
//! - Duplicate-envelope compression: upstream feeds repeat the same
//!   logical item under distinct GUIDs; items sharing a link collapse to
//!   one, last delivery winning the stored attributes
//! - Persistent monotonic seen-set (link or guid); an id once seen is
//!   never emitted again, regardless of later re-deliveries
//! - Publish-date gate: only items newer than the last-seen timestamp
//!   are emitted (but every unseen id is marked seen either way)
//! - Malformed items (no link/guid, no publish date) are skipped with a
//!   warning; the rest of the feed continues
//! - Per-feed priority classification by title keyword/regex
//! - Audience resolution from customer monitor flags

use opswatch_core::customers::CustomerEntry;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// One parsed feed entry, as delivered by the fetch layer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeedItem {
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub guid: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    /// Publish time, epoch seconds. Absent on malformed entries.
    #[serde(default)]
    pub published: Option<i64>,
}

impl FeedItem {
    /// Stable identity: the link, falling back to the guid.
    fn identity(&self) -> Option<&str> {
        if !self.link.is_empty() {
            Some(&self.link)
        } else if !self.guid.is_empty() {
            Some(&self.guid)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Priority {
    Normal,
    High,
}

/// A genuinely new advisory, classified and addressed.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Advisory {
    pub id: String,
    pub feed: String,
    pub title: String,
    pub summary: String,
    pub published: i64,
    pub priority: Priority,
    /// Customers configured to care about this feed.
    pub audience: Vec<String>,
}

/// Per-feed policy: name, what counts as high priority, and which
/// customers monitor the feed.
#[derive(Clone)]
pub struct FeedProfile {
    pub name: String,
    pub high_priority: Regex,
    pub cares: fn(&CustomerEntry) -> bool,
}

impl FeedProfile {
    /// Dutch NCSC advisories. Titles carry a chance/damage marker such
    /// as "[M/H]"; anything with damage potential H is high priority.
    pub fn ncsc() -> Self {
        Self {
            name: "NCSC".into(),
            high_priority: Regex::new(r"\[\w/H\]").expect("static pattern"),
            cares: |e| e.monitor_dtc,
        }
    }

    /// Digital Trust Center notices. No structured marker; keyword match.
    pub fn dtc() -> Self {
        Self {
            name: "DTC".into(),
            high_priority: Regex::new(r"(?i)(kritiek|critical|actief misbruikt|actively exploited|zero-?day)")
                .expect("static pattern"),
            cares: |e| e.monitor_dtc,
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FeedReport {
    pub feed: String,
    pub items_processed: u64,
    pub duplicates_collapsed: u64,
    pub malformed_skipped: u64,
    pub advisories_emitted: u64,
    pub seen_total: u64,
}

// ── Feed Engine ─────────────────────────────────────────────────────────────

pub struct FeedEngine {
    profile: FeedProfile,
    seen: RwLock<HashSet<String>>,
    items_processed: AtomicU64,
    duplicates_collapsed: AtomicU64,
    malformed_skipped: AtomicU64,
    emitted: AtomicU64,
}

impl FeedEngine {
    pub fn new(profile: FeedProfile) -> Self {
        Self {
            profile,
            seen: RwLock::new(HashSet::new()),
            items_processed: AtomicU64::new(0),
            duplicates_collapsed: AtomicU64::new(0),
            malformed_skipped: AtomicU64::new(0),
            emitted: AtomicU64::new(0),
        }
    }

    /// Restore the persisted seen-set.
    pub fn with_seen(self, ids: Vec<String>) -> Self {
        *self.seen.write() = ids.into_iter().collect();
        self
    }

    /// The seen-set for persistence. Sorted so the stored file is stable
    /// across runs.
    pub fn seen_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.seen.read().iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Process one poll of the feed: collapse duplicate envelopes, mark
    /// unseen ids, and emit the items published after `since`,
    /// classified and addressed to the monitoring customers.
    pub fn new_items_since(
        &self,
        items: &[FeedItem],
        since: i64,
        customers: &[CustomerEntry],
    ) -> Vec<Advisory> {
        let audience: Vec<String> = customers
            .iter()
            .filter(|e| (self.profile.cares)(e))
            .map(|e| e.description.clone())
            .collect();

        // Collapse by identity, last delivery winning.
        let mut order: Vec<String> = Vec::new();
        let mut compressed: HashMap<String, FeedItem> = HashMap::new();
        for item in items {
            self.items_processed.fetch_add(1, Ordering::Relaxed);
            let Some(id) = item.identity() else {
                warn!(feed = %self.profile.name, title = %item.title, "Feed item without link or guid skipped");
                self.malformed_skipped.fetch_add(1, Ordering::Relaxed);
                continue;
            };
            if item.published.is_none() {
                warn!(feed = %self.profile.name, id = %id, "Feed item without publish date skipped");
                self.malformed_skipped.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            if compressed.insert(id.to_string(), item.clone()).is_some() {
                self.duplicates_collapsed.fetch_add(1, Ordering::Relaxed);
            } else {
                order.push(id.to_string());
            }
        }

        let mut advisories = Vec::new();
        let mut seen = self.seen.write();
        for id in order {
            if !seen.insert(id.clone()) {
                continue;
            }
            let item = &compressed[&id];
            let published = item.published.unwrap_or_default();
            if published <= since {
                continue;
            }

            let priority = if self.profile.high_priority.is_match(&item.title) {
                Priority::High
            } else {
                Priority::Normal
            };
            self.emitted.fetch_add(1, Ordering::Relaxed);
            info!(feed = %self.profile.name, id = %id, priority = ?priority, "New advisory");
            advisories.push(Advisory {
                id,
                feed: self.profile.name.clone(),
                title: item.title.clone(),
                summary: item.summary.clone(),
                published,
                priority,
                audience: audience.clone(),
            });
        }
        advisories
    }

    // ── Stats ───────────────────────────────────────────────────────────

    pub fn report(&self) -> FeedReport {
        FeedReport {
            feed: self.profile.name.clone(),
            items_processed: self.items_processed.load(Ordering::Relaxed),
            duplicates_collapsed: self.duplicates_collapsed.load(Ordering::Relaxed),
            malformed_skipped: self.malformed_skipped.load(Ordering::Relaxed),
            advisories_emitted: self.emitted.load(Ordering::Relaxed),
            seen_total: self.seen.read().len() as u64,
        }
    }
}
