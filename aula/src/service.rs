//! AulaService — one explicit service object wired at process start.
//!
//! Composition root for the engine: the embedding engine, the tiered
//! store, the concept graph, the hybrid ranker and the learning engine
//! are constructed once and injected here, not reached through globals.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use aula_core::config::AulaConfig;
use aula_core::errors::{AulaResult, ValidationError};
use aula_core::memory::ContextType;
use aula_core::models::{FeedbackEvent, FeedbackKind, MemoryInsights, RetrievedEntry};
use aula_core::traits::{FeedbackAudit, IDurableStore, IEmbeddingProvider};
use aula_embeddings::EmbeddingEngine;
use aula_graph::KnowledgeGraph;
use aula_learning::{LearningEngine, LearningOutcome};
use aula_retrieval::{HybridRanker, RankCandidate};
use aula_store::{MemoryStore, RecallRequest, SqliteStore, StoreRequest};

/// Filters narrowing a retrieval to a slice of the knowledge base.
#[derive(Debug, Clone, Default)]
pub struct RetrievalFilters {
    pub context_type: Option<ContextType>,
    pub category: Option<String>,
    pub owner: Option<String>,
    pub include_related: bool,
}

/// The assembled engine.
pub struct AulaService {
    config: AulaConfig,
    embeddings: Arc<EmbeddingEngine>,
    store: Arc<MemoryStore>,
    durable: Arc<dyn IDurableStore>,
    graph: RwLock<KnowledgeGraph>,
    ranker: HybridRanker,
    learning: Mutex<LearningEngine>,
    /// Recent (query, matched concepts) pairs for feedback attribution.
    recent: Mutex<VecDeque<(String, Vec<String>)>>,
}

impl AulaService {
    /// Build the full engine from configuration. Must run inside a tokio
    /// runtime — the background queue consumer is spawned here.
    pub async fn init(config: AulaConfig) -> AulaResult<Self> {
        let durable: Arc<dyn IDurableStore> = match &config.store.database_path {
            Some(path) => Arc::new(SqliteStore::open(path)?),
            None => Arc::new(SqliteStore::open_in_memory()?),
        };
        let embeddings = Arc::new(EmbeddingEngine::new(&config.embedding));
        Self::assemble(config, durable, embeddings)
    }

    /// Build with an injected embedding provider (a neural backend, or a
    /// scripted one in tests).
    pub async fn init_with_provider(
        config: AulaConfig,
        provider: Arc<dyn IEmbeddingProvider>,
    ) -> AulaResult<Self> {
        let durable: Arc<dyn IDurableStore> = match &config.store.database_path {
            Some(path) => Arc::new(SqliteStore::open(path)?),
            None => Arc::new(SqliteStore::open_in_memory()?),
        };
        let embeddings = Arc::new(EmbeddingEngine::with_provider(&config.embedding, provider));
        Self::assemble(config, durable, embeddings)
    }

    fn assemble(
        config: AulaConfig,
        durable: Arc<dyn IDurableStore>,
        embeddings: Arc<EmbeddingEngine>,
    ) -> AulaResult<Self> {
        let store = Arc::new(MemoryStore::new(
            config.store.clone(),
            Arc::clone(&durable),
            Arc::clone(&embeddings),
        ));
        let service = Self {
            graph: RwLock::new(KnowledgeGraph::new(config.graph.clone())),
            ranker: HybridRanker::new(config.retrieval.clone()),
            learning: Mutex::new(LearningEngine::new(&config.learning)),
            recent: Mutex::new(VecDeque::new()),
            embeddings,
            store,
            durable,
            config,
        };
        info!("aula service initialized");
        Ok(service)
    }

    /// Store one knowledge fragment. Durable before hot, so the entry is
    /// visible to any recall that starts after this returns.
    pub async fn store_entry(&self, request: StoreRequest) -> AulaResult<String> {
        self.store.store(request).await
    }

    /// Direct tiered recall without ranking — the raw similarity path.
    pub async fn recall(&self, request: RecallRequest) -> AulaResult<Vec<RetrievedEntry>> {
        self.store.recall(request).await
    }

    /// Add a named concept to the knowledge graph.
    pub async fn add_concept(
        &self,
        concept: &str,
        category: &str,
        metadata: std::collections::BTreeMap<String, String>,
    ) -> AulaResult<bool> {
        if concept.trim().is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }
        let embedding = self.embeddings.embed(concept).await?;
        let mut graph = self.graph.write().expect("graph lock poisoned");
        Ok(graph.insert_concept(concept, category, embedding, metadata))
    }

    /// The full retrieval pipeline: classify → recall under the adaptive
    /// threshold → expand the query with related concepts → hybrid
    /// re-rank → truncate to the kind's result count.
    pub async fn retrieve(
        &self,
        query: &str,
        filters: RetrievalFilters,
        deadline: Option<Instant>,
    ) -> AulaResult<Vec<RetrievedEntry>> {
        if query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }

        let kind = self.ranker.classify(query);
        let profile = kind.profile();
        let query_embedding = self.embeddings.embed(query).await?;

        // Concept expansion feeds the lexical half of the ranker and the
        // feedback-attribution window.
        let expansion: Vec<String> = {
            let mut graph = self.graph.write().expect("graph lock poisoned");
            graph
                .find_related(&query_embedding, 5, false)
                .into_iter()
                .map(|c| c.concept)
                .collect()
        };

        let request = RecallRequest {
            query: query.to_string(),
            context_type: filters.context_type,
            category: filters.category,
            owner: filters.owner,
            // Over-fetch so the lexical half can still reorder.
            max_results: profile.max_results * 2,
            include_related: filters.include_related,
            deadline,
            similarity_threshold: Some(profile.similarity_threshold),
        };
        let recalled = self.store.recall(request).await?;
        if recalled.is_empty() {
            debug!(?kind, "no candidates above the adaptive threshold");
            self.remember_interaction(query, &expansion);
            return Ok(Vec::new());
        }

        let expanded_query = if expansion.is_empty() {
            query.to_string()
        } else {
            format!("{query} {}", expansion.join(" "))
        };

        let candidates: Vec<RankCandidate> = recalled
            .iter()
            .map(|r| RankCandidate {
                id: r.id.clone(),
                content: r.content.clone(),
                semantic: r.similarity,
            })
            .collect();
        let mut ranked = self.ranker.rerank(&expanded_query, candidates);
        ranked.truncate(profile.max_results);

        // Rebuild the retrieved entries in hybrid order.
        let mut by_id: std::collections::HashMap<String, RetrievedEntry> =
            recalled.into_iter().map(|r| (r.id.clone(), r)).collect();
        let results: Vec<RetrievedEntry> = ranked
            .into_iter()
            .filter_map(|r| {
                by_id.remove(&r.id).map(|mut entry| {
                    entry.score = r.hybrid;
                    entry
                })
            })
            .collect();

        info!(
            ?kind,
            results = results.len(),
            expanded = !expansion.is_empty(),
            "retrieval complete"
        );
        self.remember_interaction(query, &expansion);
        Ok(results)
    }

    /// Fold a feedback signal into the learning loop.
    ///
    /// Positive scores reinforce the concepts matched by the most recent
    /// retrieval of this query; negative scores only audit-tag the
    /// interaction. Nothing is ever weakened.
    pub async fn record_feedback(&self, event: FeedbackEvent) -> AulaResult<LearningOutcome> {
        let kind = self.ranker.classify(&event.query);
        let query_embedding = self.embeddings.embed(&event.query).await?;

        let concepts = match self.lookup_interaction(&event.query) {
            Some(concepts) => concepts,
            None => {
                // No retrieval on record — attribute against the graph
                // directly.
                let mut graph = self.graph.write().expect("graph lock poisoned");
                graph
                    .find_related(&query_embedding, 3, false)
                    .into_iter()
                    .map(|c| c.concept)
                    .collect()
            }
        };

        let outcome = {
            let mut learning = self.learning.lock().expect("learning lock poisoned");
            learning.process(&event, kind, &concepts)
        };

        self.durable.record_feedback_audit(&FeedbackAudit {
            event: event.clone(),
            needs_improvement: outcome.needs_improvement,
            matched_concepts: concepts,
        })?;

        if outcome.kind == FeedbackKind::Positive && !outcome.reinforced.is_empty() {
            let mut graph = self.graph.write().expect("graph lock poisoned");
            graph.learn_from_interaction(
                &event.query,
                &query_embedding,
                &outcome.reinforced,
                outcome.feedback_score,
            );
        }

        Ok(outcome)
    }

    /// Aggregate operator view over the store and the graph.
    pub fn insights(&self) -> AulaResult<MemoryInsights> {
        let stats = self.store.stats(10)?;
        let graph = self.graph.read().expect("graph lock poisoned");
        Ok(MemoryInsights {
            total_entries: stats.total_entries,
            counts_by_category: stats.counts_by_category,
            counts_by_context: stats.counts_by_context,
            most_accessed: stats.most_accessed,
            graph_density: graph.density(),
            knowledge_gaps: graph.discover_gaps(),
        })
    }

    /// Synchronous cleanup pass; see [`MemoryStore::cleanup`].
    pub fn cleanup(&self, age_days: i64) -> AulaResult<usize> {
        self.store.cleanup(age_days)
    }

    /// Queue a cleanup to run off the query path.
    pub fn schedule_cleanup(&self, age_days: i64) -> AulaResult<()> {
        self.store.schedule_cleanup(age_days)
    }

    pub fn graph(&self) -> &RwLock<KnowledgeGraph> {
        &self.graph
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Flush-and-drain the background queue, bounded by the configured
    /// drain timeout.
    pub async fn shutdown(&self) {
        let timeout = Duration::from_secs(self.config.store.shutdown_drain_secs);
        self.store.shutdown(timeout).await;
        info!("aula service shut down");
    }

    fn remember_interaction(&self, query: &str, concepts: &[String]) {
        let mut recent = self.recent.lock().expect("recent lock poisoned");
        recent.push_front((normalize(query), concepts.to_vec()));
        recent.truncate(self.config.learning.interaction_window);
    }

    fn lookup_interaction(&self, query: &str) -> Option<Vec<String>> {
        let needle = normalize(query);
        let recent = self.recent.lock().expect("recent lock poisoned");
        recent
            .iter()
            .find(|(q, _)| *q == needle)
            .map(|(_, concepts)| concepts.clone())
    }
}

fn normalize(query: &str) -> String {
    query
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
