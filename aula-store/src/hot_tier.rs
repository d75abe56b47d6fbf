//! In-memory hot tier.
//!
//! A capacity-bounded map of the entries worth answering from without
//! touching SQLite. Membership is derived state — losing the process loses
//! nothing but latency. Readers (recall) and writers (store, the queue
//! consumer) run concurrently, hence the reader/writer lock.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::debug;

use aula_core::memory::MemoryEntry;
use aula_embeddings::cosine_similarity;

/// Outcome of offering an entry to the hot tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// Inserted; nothing had to leave.
    Admitted,
    /// Inserted after evicting the named entry.
    AdmittedEvicting(String),
    /// Not hot enough while the tier is full.
    Skipped,
}

pub struct HotTier {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    capacity: usize,
}

impl HotTier {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("hot tier lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<MemoryEntry> {
        self.entries
            .read()
            .expect("hot tier lock poisoned")
            .get(id)
            .cloned()
    }

    /// Entries whose embedding scores above `threshold` against `query`,
    /// best first, up to `limit`.
    pub fn search(&self, query: &[f32], threshold: f64, limit: usize) -> Vec<(MemoryEntry, f64)> {
        let guard = self.entries.read().expect("hot tier lock poisoned");
        let mut hits: Vec<(MemoryEntry, f64)> = guard
            .values()
            .filter_map(|e| {
                let sim = cosine_similarity(query, &e.embedding);
                (sim > threshold).then(|| (e.clone(), sim))
            })
            .collect();
        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        hits.truncate(limit);
        hits
    }

    /// Offer an entry. Under capacity it always enters; at capacity it only
    /// enters when `force` is set (caller decided the importance clears the
    /// promotion threshold), evicting the lowest-scored resident.
    ///
    /// Eviction score is `importance × access_count`; ties go to the entry
    /// least recently accessed, then lexicographically smallest id, so the
    /// choice is deterministic.
    pub fn admit(&self, entry: MemoryEntry, force: bool) -> AdmitOutcome {
        let mut guard = self.entries.write().expect("hot tier lock poisoned");

        // Replacing a resident never changes the population size.
        if guard.contains_key(&entry.id) || guard.len() < self.capacity {
            guard.insert(entry.id.clone(), entry);
            return AdmitOutcome::Admitted;
        }

        if !force {
            return AdmitOutcome::Skipped;
        }

        let victim = guard
            .values()
            .min_by(|a, b| {
                a.tier_score()
                    .partial_cmp(&b.tier_score())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.last_accessed.cmp(&b.last_accessed))
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|e| e.id.clone());

        match victim {
            Some(victim_id) => {
                guard.remove(&victim_id);
                guard.insert(entry.id.clone(), entry);
                debug!(evicted = %victim_id, "hot tier eviction");
                AdmitOutcome::AdmittedEvicting(victim_id)
            }
            // Unreachable with capacity > 0; kept total.
            None => AdmitOutcome::Skipped,
        }
    }

    /// Bump the resident copy's access counters so eviction scoring sees
    /// recent activity. The durable tier is updated by the queue consumer.
    pub fn touch(&self, id: &str, at: DateTime<Utc>) {
        let mut guard = self.entries.write().expect("hot tier lock poisoned");
        if let Some(e) = guard.get_mut(id) {
            e.access_count += 1;
            e.last_accessed = at;
        }
    }

    pub fn remove(&self, id: &str) -> bool {
        self.entries
            .write()
            .expect("hot tier lock poisoned")
            .remove(id)
            .is_some()
    }

    pub fn remove_many(&self, ids: &[String]) -> usize {
        let mut guard = self.entries.write().expect("hot tier lock poisoned");
        ids.iter().filter(|id| guard.remove(*id).is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use aula_core::memory::{Confidence, ContextType, EntryDetails, Importance};

    fn entry(id: &str, importance: f64, access: u64) -> MemoryEntry {
        MemoryEntry {
            id: id.to_string(),
            content: format!("content {id}"),
            context_type: ContextType::Fact,
            category: "test".into(),
            subcategory: None,
            owner: None,
            embedding: vec![1.0, 0.0, 0.0],
            importance: Importance::new(importance),
            access_count: access,
            created_at: Utc::now(),
            last_accessed: Utc::now(),
            details: EntryDetails::empty_for(ContextType::Fact),
            extra: BTreeMap::new(),
            related_ids: vec![],
            confidence: Confidence::default(),
            source: "test".into(),
        }
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let tier = HotTier::new(3);
        for i in 0..10 {
            tier.admit(entry(&format!("e{i}"), 0.9, i), true);
            assert!(tier.len() <= 3);
        }
        assert_eq!(tier.len(), 3);
    }

    #[test]
    fn full_tier_rejects_unforced_entries() {
        let tier = HotTier::new(2);
        assert_eq!(tier.admit(entry("a", 0.5, 1), false), AdmitOutcome::Admitted);
        assert_eq!(tier.admit(entry("b", 0.5, 1), false), AdmitOutcome::Admitted);
        assert_eq!(tier.admit(entry("c", 0.5, 1), false), AdmitOutcome::Skipped);
        assert!(tier.get("a").is_some());
        assert!(tier.get("b").is_some());
    }

    #[test]
    fn eviction_picks_lowest_importance_times_access() {
        let tier = HotTier::new(2);
        tier.admit(entry("weak", 0.2, 1), true); // score 0.2
        tier.admit(entry("strong", 0.9, 10), true); // score 9.0
        let outcome = tier.admit(entry("new", 0.8, 0), true);
        assert_eq!(outcome, AdmitOutcome::AdmittedEvicting("weak".into()));
        assert!(tier.get("strong").is_some());
        assert!(tier.get("new").is_some());
    }

    #[test]
    fn reinserting_resident_does_not_evict() {
        let tier = HotTier::new(2);
        tier.admit(entry("a", 0.5, 1), true);
        tier.admit(entry("b", 0.5, 1), true);
        assert_eq!(tier.admit(entry("a", 0.9, 5), false), AdmitOutcome::Admitted);
        assert_eq!(tier.len(), 2);
    }

    #[test]
    fn touch_bumps_resident_counters() {
        let tier = HotTier::new(2);
        tier.admit(entry("a", 0.5, 0), true);
        tier.touch("a", Utc::now());
        tier.touch("a", Utc::now());
        assert_eq!(tier.get("a").unwrap().access_count, 2);
    }

    #[test]
    fn search_orders_by_similarity() {
        let tier = HotTier::new(4);
        let mut close = entry("close", 0.5, 0);
        close.embedding = vec![1.0, 0.1, 0.0];
        let mut far = entry("far", 0.5, 0);
        far.embedding = vec![0.3, 1.0, 0.0];
        tier.admit(close, true);
        tier.admit(far, true);

        let hits = tier.search(&[1.0, 0.0, 0.0], 0.1, 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.id, "close");
        assert!(hits[0].1 > hits[1].1);
    }
}
