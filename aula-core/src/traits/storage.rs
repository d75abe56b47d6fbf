use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::errors::AulaResult;
use crate::memory::MemoryEntry;
use crate::models::FeedbackEvent;

/// Filter for durable scans. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub context_type: Option<crate::memory::ContextType>,
    pub category: Option<String>,
    pub owner: Option<String>,
}

/// Cleanup predicate: an entry is deleted only when it fails ALL floors.
#[derive(Debug, Clone, Copy)]
pub struct CleanupCriteria {
    pub last_accessed_before: DateTime<Utc>,
    pub access_count_below: u64,
    pub importance_below: f64,
}

/// An audited feedback interaction, persisted for review.
#[derive(Debug, Clone)]
pub struct FeedbackAudit {
    pub event: FeedbackEvent,
    pub needs_improvement: bool,
    pub matched_concepts: Vec<String>,
}

/// Aggregate counters for `insights()`.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub total_entries: usize,
    pub counts_by_category: HashMap<String, usize>,
    pub counts_by_context: HashMap<String, usize>,
    /// (entry id, access count), most accessed first.
    pub most_accessed: Vec<(String, u64)>,
}

/// Durable (cold tier) storage for memory entries.
///
/// Upsert-by-id, filtered scan, delete-by-predicate — everything the tiered
/// store needs from its persistence collaborator.
pub trait IDurableStore: Send + Sync {
    fn upsert(&self, entry: &MemoryEntry) -> AulaResult<()>;

    fn get(&self, id: &str) -> AulaResult<Option<MemoryEntry>>;

    /// Scan entries matching the filter, most recently accessed first,
    /// up to `limit`.
    fn scan(&self, filter: &EntryFilter, limit: usize) -> AulaResult<Vec<MemoryEntry>>;

    /// Delete entries matching ALL criteria floors. Returns deleted ids so
    /// the hot tier can be kept in sync.
    fn delete_matching(&self, criteria: &CleanupCriteria) -> AulaResult<Vec<String>>;

    /// Apply one access touch: bump `access_count`, set `last_accessed`.
    /// Idempotency is relaxed — a replay may over-count by at most one.
    fn apply_access(&self, id: &str, at: DateTime<Utc>) -> AulaResult<()>;

    /// Persist a feedback interaction for audit.
    fn record_feedback_audit(&self, audit: &FeedbackAudit) -> AulaResult<()>;

    fn stats(&self, most_accessed_limit: usize) -> AulaResult<StoreStats>;
}
