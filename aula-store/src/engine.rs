//! MemoryStore — the tiered store facade.
//!
//! Orchestrates: validation → embedding → durable write → hot-tier
//! promotion on the store path; hot search → durable re-score → merge on
//! the recall path. Soft mutations are handed to the background queue.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rayon::prelude::*;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use aula_core::config::StoreConfig;
use aula_core::constants::{
    DURABLE_CANDIDATE_MULTIPLIER, MAX_RELATED_AT_STORE, MAX_RELATED_PER_RESULT,
    RELATED_SIMILARITY_THRESHOLD,
};
use aula_core::errors::{AulaError, AulaResult, ValidationError};
use aula_core::memory::{Confidence, ContextType, EntryDetails, Importance, MemoryEntry};
use aula_core::models::{RelatedEntry, RetrievedEntry};
use aula_core::traits::{CleanupCriteria, EntryFilter, IDurableStore, StoreStats};
use aula_embeddings::{cosine_similarity, EmbeddingEngine};

use crate::hot_tier::HotTier;
use crate::queue::{PersistTask, PersistenceQueue, QueueReceivers, QueueWorker};

/// Everything needed to store one knowledge fragment.
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub content: String,
    pub details: EntryDetails,
    pub category: String,
    pub subcategory: Option<String>,
    pub owner: Option<String>,
    pub extra: BTreeMap<String, String>,
    pub importance: f64,
    pub confidence: f64,
    pub source: String,
}

impl StoreRequest {
    pub fn new(content: impl Into<String>, category: impl Into<String>, details: EntryDetails) -> Self {
        Self {
            content: content.into(),
            details,
            category: category.into(),
            subcategory: None,
            owner: None,
            extra: BTreeMap::new(),
            importance: 0.5,
            confidence: 1.0,
            source: "manual".into(),
        }
    }
}

/// A recall query with optional filters and a soft deadline.
#[derive(Debug, Clone)]
pub struct RecallRequest {
    pub query: String,
    pub context_type: Option<ContextType>,
    pub category: Option<String>,
    pub owner: Option<String>,
    pub max_results: usize,
    pub include_related: bool,
    /// When set and already passed after the hot pass, the durable tier is
    /// skipped and the hot-only partial result is returned.
    pub deadline: Option<Instant>,
    /// Cosine floor override; defaults to the configured recall threshold.
    pub similarity_threshold: Option<f64>,
}

impl RecallRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context_type: None,
            category: None,
            owner: None,
            max_results: 5,
            include_related: false,
            deadline: None,
            similarity_threshold: None,
        }
    }
}

/// The tiered memory store.
pub struct MemoryStore {
    config: StoreConfig,
    hot: Arc<HotTier>,
    durable: Arc<dyn IDurableStore>,
    embeddings: Arc<EmbeddingEngine>,
    queue: Mutex<Option<PersistenceQueue>>,
    worker: Mutex<Option<JoinHandle<u64>>>,
}

impl MemoryStore {
    /// Build the store and spawn the queue consumer. Must run inside a
    /// tokio runtime.
    pub fn new(
        config: StoreConfig,
        durable: Arc<dyn IDurableStore>,
        embeddings: Arc<EmbeddingEngine>,
    ) -> Self {
        let hot = Arc::new(HotTier::new(config.hot_capacity));
        let (queue, receivers) = PersistenceQueue::new(config.queue_capacity);
        let worker = Self::spawn_worker(
            receivers,
            Arc::clone(&durable),
            Arc::clone(&hot),
            config.hot_promotion_threshold,
        );
        Self {
            config,
            hot,
            durable,
            embeddings,
            queue: Mutex::new(Some(queue)),
            worker: Mutex::new(Some(worker)),
        }
    }

    fn spawn_worker(
        receivers: QueueReceivers,
        durable: Arc<dyn IDurableStore>,
        hot: Arc<HotTier>,
        promotion_threshold: f64,
    ) -> JoinHandle<u64> {
        QueueWorker::new(receivers, durable, hot, promotion_threshold).spawn()
    }

    pub fn hot_tier(&self) -> &HotTier {
        &self.hot
    }

    /// Store a fragment. Returns the new entry id.
    ///
    /// The durable write completes before the hot tier is touched, so a
    /// storage failure leaves the hot tier exactly as it was.
    pub async fn store(&self, request: StoreRequest) -> AulaResult<String> {
        if request.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }
        MemoryEntry::validate_extra(&request.extra)?;
        let importance = Importance::try_new(request.importance)?;

        let embedding = self.embeddings.embed(&request.content).await?;

        // Related entries come from the hot tier only: cheap, and the
        // durable tier would make every store an O(N) scan.
        let related_ids: Vec<String> = self
            .hot
            .search(&embedding, RELATED_SIMILARITY_THRESHOLD, MAX_RELATED_AT_STORE)
            .into_iter()
            .map(|(e, _)| e.id)
            .collect();

        let now = Utc::now();
        let entry = MemoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            content: request.content,
            context_type: request.details.context_type(),
            category: request.category,
            subcategory: request.subcategory,
            owner: request.owner,
            embedding,
            importance,
            access_count: 0,
            created_at: now,
            last_accessed: now,
            details: request.details,
            extra: request.extra,
            related_ids,
            confidence: Confidence::new(request.confidence),
            source: request.source,
        };

        // Durable first; only then the hot tier.
        self.durable.upsert(&entry)?;

        let id = entry.id.clone();
        let force = entry.importance.value() > self.config.hot_promotion_threshold;
        let outcome = self.hot.admit(entry, force);
        debug!(id = %id, ?outcome, "stored entry");
        Ok(id)
    }

    /// Recall fragments ranked by cosine similarity, hot tier first.
    pub async fn recall(&self, request: RecallRequest) -> AulaResult<Vec<RetrievedEntry>> {
        if request.query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        let threshold = request
            .similarity_threshold
            .unwrap_or(self.config.recall_similarity_threshold);

        let query_embedding = self.embeddings.embed(&request.query).await?;

        let mut merged: HashMap<String, (MemoryEntry, f64)> = HashMap::new();
        let mut cold_ids: Vec<String> = Vec::new();
        for (entry, sim) in self.hot.search(&query_embedding, threshold, usize::MAX) {
            if entry_matches(&entry, &request) {
                merged.insert(entry.id.clone(), (entry, sim));
            }
        }

        // Availability over completeness: a blown deadline returns whatever
        // the hot tier produced instead of failing the call.
        let expired = request.deadline.is_some_and(|d| Instant::now() >= d);
        if expired {
            debug!(hits = merged.len(), "deadline passed, returning hot-only partial");
        } else {
            let filter = EntryFilter {
                context_type: request.context_type,
                category: request.category.clone(),
                owner: request.owner.clone(),
            };
            let window = request.max_results * DURABLE_CANDIDATE_MULTIPLIER;
            let candidates = self.durable.scan(&filter, window)?;
            let rescored: Vec<(MemoryEntry, f64)> = candidates
                .into_par_iter()
                .filter_map(|e| {
                    let sim = cosine_similarity(&query_embedding, &e.embedding);
                    (sim > threshold).then_some((e, sim))
                })
                .collect();
            for (entry, sim) in rescored {
                // The hot copy wins: its access counters are fresher.
                if !merged.contains_key(&entry.id) {
                    cold_ids.push(entry.id.clone());
                    merged.insert(entry.id.clone(), (entry, sim));
                }
            }
        }

        let mut ranked: Vec<(MemoryEntry, f64)> = merged.into_values().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        ranked.truncate(request.max_results);

        let now = Utc::now();
        for (entry, _) in &ranked {
            self.enqueue_soft(PersistTask::AccessTouch {
                id: entry.id.clone(),
                at: now,
            });
            // A cold entry that just answered a query is worth caching.
            if cold_ids.contains(&entry.id) {
                self.enqueue_soft(PersistTask::Promote {
                    id: entry.id.clone(),
                });
            }
        }

        let mut results = Vec::with_capacity(ranked.len());
        for (entry, sim) in ranked {
            let related = if request.include_related {
                self.resolve_related(&entry)
            } else {
                Vec::new()
            };
            results.push(to_retrieved(entry, sim, related));
        }
        Ok(results)
    }

    /// Queue a cleanup pass to run off the query path.
    pub fn schedule_cleanup(&self, age_days: i64) -> AulaResult<()> {
        self.enqueue(PersistTask::Cleanup { age_days })
    }

    /// Delete entries older than `age_days` that additionally fall below
    /// BOTH activity floors. Returns the number deleted.
    pub fn cleanup(&self, age_days: i64) -> AulaResult<usize> {
        let criteria = CleanupCriteria {
            last_accessed_before: Utc::now() - chrono::Duration::days(age_days),
            access_count_below: aula_core::constants::CLEANUP_ACCESS_FLOOR,
            importance_below: aula_core::constants::CLEANUP_IMPORTANCE_FLOOR,
        };
        let ids = self.durable.delete_matching(&criteria)?;
        let dropped = self.hot.remove_many(&ids);
        info!(deleted = ids.len(), hot_dropped = dropped, age_days, "cleanup");
        Ok(ids.len())
    }

    pub fn stats(&self, most_accessed_limit: usize) -> AulaResult<StoreStats> {
        self.durable.stats(most_accessed_limit)
    }

    /// Look an entry up by id, hot tier first.
    pub fn get(&self, id: &str) -> AulaResult<Option<MemoryEntry>> {
        if let Some(entry) = self.hot.get(id) {
            return Ok(Some(entry));
        }
        self.durable.get(id)
    }

    /// Close the queue and wait up to `timeout` for the consumer to drain.
    /// Unprocessed work past the timeout is dropped with a warning.
    pub async fn shutdown(&self, timeout: Duration) {
        let pending = {
            let mut guard = self.queue.lock().expect("queue lock poisoned");
            match guard.take() {
                Some(queue) => queue.pending(),
                None => return,
            }
            // Dropping the queue closes both senders.
        };
        let handle = self.worker.lock().expect("worker lock poisoned").take();
        let Some(mut handle) = handle else { return };

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(processed)) => info!(processed, "persistence queue drained on shutdown"),
            Ok(Err(e)) => warn!(error = %e, "queue consumer panicked during drain"),
            Err(_) => {
                handle.abort();
                // Consistency warning: counters and promotions queued behind
                // the timeout are lost.
                warn!(pending, "queue drain timed out, dropping unprocessed work");
            }
        }
    }

    fn enqueue(&self, task: PersistTask) -> AulaResult<()> {
        let guard = self.queue.lock().expect("queue lock poisoned");
        match guard.as_ref() {
            Some(queue) => queue.enqueue(task),
            None => Err(AulaError::QueueClosed),
        }
    }

    /// Enqueue where failure is tolerable: saturation or shutdown just
    /// drops the task.
    fn enqueue_soft(&self, task: PersistTask) {
        if let Err(e) = self.enqueue(task) {
            warn!(error = %e, "dropping deferred mutation");
        }
    }

    fn resolve_related(&self, entry: &MemoryEntry) -> Vec<RelatedEntry> {
        entry
            .related_ids
            .iter()
            .take(MAX_RELATED_PER_RESULT)
            .filter_map(|id| match self.get(id) {
                Ok(Some(e)) => Some(RelatedEntry {
                    id: e.id,
                    content: e.content,
                    category: e.category,
                }),
                _ => None,
            })
            .collect()
    }
}

fn entry_matches(entry: &MemoryEntry, request: &RecallRequest) -> bool {
    if let Some(ct) = request.context_type {
        if entry.context_type != ct {
            return false;
        }
    }
    if let Some(cat) = &request.category {
        if &entry.category != cat {
            return false;
        }
    }
    if let Some(owner) = &request.owner {
        if entry.owner.as_deref() != Some(owner.as_str()) {
            return false;
        }
    }
    true
}

fn to_retrieved(entry: MemoryEntry, similarity: f64, related: Vec<RelatedEntry>) -> RetrievedEntry {
    RetrievedEntry {
        id: entry.id,
        content: entry.content,
        context_type: entry.context_type,
        category: entry.category,
        similarity,
        score: similarity,
        details: entry.details,
        extra: entry.extra,
        related,
    }
}
