//! The concept graph: arena storage, semantic linking, expansion queries,
//! and the reinforce-only learning path.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use aula_core::config::GraphConfig;
use aula_core::memory::Confidence;
use aula_embeddings::cosine_similarity;

/// A named, embedded unit of institutional knowledge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptNode {
    pub concept: String,
    pub category: String,
    pub embedding: Vec<f32>,
    pub metadata: BTreeMap<String, String>,
    pub access_count: u64,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Created from embedding similarity at insertion time. Always stored
    /// reciprocally.
    Semantic,
    /// Created by feedback, directed query → concept.
    Learned,
}

/// A directed edge in the adjacency list. `target` indexes the node arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub target: usize,
    pub weight: f64,
    pub kind: EdgeKind,
}

/// One hit from an expansion query.
#[derive(Debug, Clone)]
pub struct RelatedConcept {
    pub concept: String,
    pub category: String,
    pub similarity: f64,
    pub access_count: u64,
    pub confidence: Confidence,
    /// Up to 3 direct neighbors, strongest edge first.
    pub neighbors: Vec<(String, f64)>,
}

/// Category given to synthetic per-query nodes created by learning.
pub(crate) const QUERY_CATEGORY: &str = "query";

/// Starting confidence for fresh concepts; feedback has to earn the rest.
const INITIAL_CONCEPT_CONFIDENCE: f64 = 0.5;

/// Similarity-linked knowledge graph.
///
/// Insertion is O(N) against all existing nodes — a documented scalability
/// boundary. An approximate nearest-neighbor index could replace the scan
/// without changing any caller.
pub struct KnowledgeGraph {
    config: GraphConfig,
    pub(crate) nodes: Vec<ConceptNode>,
    index: HashMap<String, usize>,
    pub(crate) adjacency: Vec<Vec<Edge>>,
}

impl KnowledgeGraph {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            index: HashMap::new(),
            adjacency: Vec::new(),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    pub fn get(&self, concept: &str) -> Option<&ConceptNode> {
        self.index.get(concept).map(|&i| &self.nodes[i])
    }

    /// Directed-edge density over ordered node pairs; 0 below two nodes.
    pub fn density(&self) -> f64 {
        let n = self.nodes.len();
        if n < 2 {
            return 0.0;
        }
        self.edge_count() as f64 / (n * (n - 1)) as f64
    }

    /// Insert or overwrite a concept. Returns `true` when the concept was
    /// new.
    ///
    /// Re-adding is last-write-wins for embedding, category and metadata;
    /// counters and existing edges survive. New nodes are linked to every
    /// sufficiently similar existing node, keeping the strongest
    /// `max_connections_per_node` candidates (ties broken by concept
    /// string) — an explicit, deterministic edge policy.
    pub fn insert_concept(
        &mut self,
        concept: &str,
        category: &str,
        embedding: Vec<f32>,
        metadata: BTreeMap<String, String>,
    ) -> bool {
        if let Some(&idx) = self.index.get(concept) {
            let node = &mut self.nodes[idx];
            node.category = category.to_string();
            node.embedding = embedding;
            node.metadata = metadata;
            debug!(concept, "concept overwritten");
            return false;
        }

        let new_idx = self.push_node(ConceptNode {
            concept: concept.to_string(),
            category: category.to_string(),
            embedding,
            metadata,
            access_count: 0,
            confidence: Confidence::new(INITIAL_CONCEPT_CONFIDENCE),
        });

        self.link_semantic_neighbors(new_idx);
        true
    }

    fn push_node(&mut self, node: ConceptNode) -> usize {
        let idx = self.nodes.len();
        self.index.insert(node.concept.clone(), idx);
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
        idx
    }

    /// Score the new node against every other node and wire reciprocal
    /// semantic edges for the strongest matches.
    fn link_semantic_neighbors(&mut self, new_idx: usize) {
        let threshold = self.config.edge_creation_threshold;
        let cap = self.config.max_connections_per_node;
        let embedding = self.nodes[new_idx].embedding.clone();

        let mut candidates: Vec<(usize, f64)> = self
            .nodes
            .par_iter()
            .enumerate()
            .filter(|(i, node)| *i != new_idx && node.category != QUERY_CATEGORY)
            .filter_map(|(i, node)| {
                let sim = cosine_similarity(&embedding, &node.embedding);
                (sim > threshold).then_some((i, sim))
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.nodes[a.0].concept.cmp(&self.nodes[b.0].concept))
        });

        let mut linked = 0usize;
        for (neighbor, sim) in candidates {
            if linked >= cap {
                break;
            }
            if self.semantic_degree(neighbor) >= cap {
                // A full neighbor only accepts a stronger edge than its
                // current weakest; otherwise the pair is skipped so the cap
                // and reciprocity both hold everywhere.
                match self.weakest_semantic_edge(neighbor) {
                    Some((other, weight)) if weight < sim => {
                        self.unlink_semantic(neighbor, other);
                    }
                    _ => continue,
                }
            }
            self.link_semantic(new_idx, neighbor, sim);
            linked += 1;
        }
        if linked > 0 {
            debug!(
                concept = %self.nodes[new_idx].concept,
                edges = linked,
                "semantic edges created"
            );
        }
    }

    pub(crate) fn semantic_degree(&self, idx: usize) -> usize {
        self.adjacency[idx]
            .iter()
            .filter(|e| e.kind == EdgeKind::Semantic)
            .count()
    }

    /// (target, weight) of the weakest semantic edge at `idx`.
    fn weakest_semantic_edge(&self, idx: usize) -> Option<(usize, f64)> {
        self.adjacency[idx]
            .iter()
            .filter(|e| e.kind == EdgeKind::Semantic)
            .min_by(|a, b| {
                a.weight
                    .partial_cmp(&b.weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|e| (e.target, e.weight))
    }

    fn link_semantic(&mut self, a: usize, b: usize, weight: f64) {
        debug_assert_ne!(a, b, "self-loops are excluded by construction");
        self.adjacency[a].push(Edge {
            target: b,
            weight,
            kind: EdgeKind::Semantic,
        });
        self.adjacency[b].push(Edge {
            target: a,
            weight,
            kind: EdgeKind::Semantic,
        });
    }

    fn unlink_semantic(&mut self, a: usize, b: usize) {
        self.adjacency[a].retain(|e| !(e.kind == EdgeKind::Semantic && e.target == b));
        self.adjacency[b].retain(|e| !(e.kind == EdgeKind::Semantic && e.target == a));
    }

    /// Expansion query: concepts similar to the query embedding.
    ///
    /// Uses the looser exploration threshold — recall is widened at query
    /// time relative to the stricter edge-creation threshold. Returned
    /// concepts get their access counters bumped.
    pub fn find_related(
        &mut self,
        query_embedding: &[f32],
        max_results: usize,
        include_neighbors: bool,
    ) -> Vec<RelatedConcept> {
        let threshold = self.config.exploration_threshold;
        let mut hits: Vec<(usize, f64)> = self
            .nodes
            .par_iter()
            .enumerate()
            .filter(|(_, node)| node.category != QUERY_CATEGORY)
            .filter_map(|(i, node)| {
                let sim = cosine_similarity(query_embedding, &node.embedding);
                (sim > threshold).then_some((i, sim))
            })
            .collect();

        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.nodes[b.0].access_count.cmp(&self.nodes[a.0].access_count))
                .then_with(|| self.nodes[a.0].concept.cmp(&self.nodes[b.0].concept))
        });
        hits.truncate(max_results);

        hits.into_iter()
            .map(|(idx, sim)| {
                self.nodes[idx].access_count += 1;
                let node = &self.nodes[idx];
                let neighbors = if include_neighbors {
                    self.strongest_neighbors(idx, 3)
                } else {
                    Vec::new()
                };
                RelatedConcept {
                    concept: node.concept.clone(),
                    category: node.category.clone(),
                    similarity: sim,
                    access_count: node.access_count,
                    confidence: node.confidence,
                    neighbors,
                }
            })
            .collect()
    }

    fn strongest_neighbors(&self, idx: usize, limit: usize) -> Vec<(String, f64)> {
        let mut edges: Vec<&Edge> = self.adjacency[idx].iter().collect();
        edges.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        edges
            .into_iter()
            .take(limit)
            .map(|e| (self.nodes[e.target].concept.clone(), e.weight))
            .collect()
    }

    /// Fold a feedback signal into the graph.
    ///
    /// Each successful concept's confidence is reinforced, and a directed
    /// learned edge from a synthetic per-query node is created or
    /// strengthened. This path only ever increases weights.
    pub fn learn_from_interaction(
        &mut self,
        query: &str,
        query_embedding: &[f32],
        successful_concepts: &[String],
        feedback_score: f64,
    ) {
        let query_key = format!("query:{}", normalize_query(query));
        let query_idx = match self.index.get(&query_key) {
            Some(&i) => i,
            None => self.push_node(ConceptNode {
                concept: query_key.clone(),
                category: QUERY_CATEGORY.to_string(),
                embedding: query_embedding.to_vec(),
                metadata: BTreeMap::new(),
                access_count: 0,
                confidence: Confidence::new(INITIAL_CONCEPT_CONFIDENCE),
            }),
        };

        for concept in successful_concepts {
            let Some(&concept_idx) = self.index.get(concept) else {
                continue;
            };
            self.nodes[concept_idx].confidence =
                self.nodes[concept_idx].confidence.reinforce(feedback_score);

            let existing = self.adjacency[query_idx]
                .iter()
                .position(|e| e.kind == EdgeKind::Learned && e.target == concept_idx);
            match existing {
                Some(pos) => {
                    let edge = &mut self.adjacency[query_idx][pos];
                    edge.weight = (edge.weight + 0.1).min(1.0);
                }
                None => {
                    let weight = cosine_similarity(
                        &self.nodes[query_idx].embedding,
                        &self.nodes[concept_idx].embedding,
                    );
                    self.adjacency[query_idx].push(Edge {
                        target: concept_idx,
                        weight,
                        kind: EdgeKind::Learned,
                    });
                }
            }
        }
    }

    /// Weight of the learned edge query → concept, if any.
    pub fn learned_edge_weight(&self, query: &str, concept: &str) -> Option<f64> {
        let query_key = format!("query:{}", normalize_query(query));
        let &query_idx = self.index.get(&query_key)?;
        let &concept_idx = self.index.get(concept)?;
        self.adjacency[query_idx]
            .iter()
            .find(|e| e.kind == EdgeKind::Learned && e.target == concept_idx)
            .map(|e| e.weight)
    }
}

fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph::new(GraphConfig::default())
    }

    /// Unit vector at an angle in the plane; cos(angle between) is exact.
    fn unit(angle_deg: f64) -> Vec<f32> {
        let rad = angle_deg.to_radians();
        vec![rad.cos() as f32, rad.sin() as f32]
    }

    #[test]
    fn similar_concepts_get_a_reciprocal_edge() {
        let mut g = graph();
        // cos(26°) ≈ 0.9 — above the 0.75 creation threshold.
        g.insert_concept("TNE", "tarjetas", unit(0.0), BTreeMap::new());
        g.insert_concept(
            "Tarjeta Nacional Estudiantil",
            "tarjetas",
            unit(26.0),
            BTreeMap::new(),
        );

        assert_eq!(g.semantic_degree(0), 1);
        assert_eq!(g.semantic_degree(1), 1);

        let hits = g.find_related(&unit(0.0), 5, true);
        assert_eq!(hits[0].concept, "TNE");
        assert!(hits
            .iter()
            .any(|h| h.concept == "Tarjeta Nacional Estudiantil"));
        assert_eq!(hits[0].neighbors[0].0, "Tarjeta Nacional Estudiantil");
    }

    #[test]
    fn dissimilar_concepts_stay_unlinked() {
        let mut g = graph();
        g.insert_concept("biblioteca", "servicios", unit(0.0), BTreeMap::new());
        // cos(60°) = 0.5 < 0.75.
        g.insert_concept("deportes", "servicios", unit(60.0), BTreeMap::new());
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn no_self_loops_ever() {
        let mut g = graph();
        g.insert_concept("wifi", "red", unit(0.0), BTreeMap::new());
        // Overwrite with an identical embedding — still no self edge.
        g.insert_concept("wifi", "red", unit(0.0), BTreeMap::new());
        assert_eq!(g.edge_count(), 0);
        for (idx, edges) in g.adjacency.iter().enumerate() {
            assert!(edges.iter().all(|e| e.target != idx));
        }
    }

    #[test]
    fn edge_cap_holds_immediately_after_insertion() {
        let cfg = GraphConfig {
            max_connections_per_node: 3,
            ..Default::default()
        };
        let mut g = KnowledgeGraph::new(cfg);
        // Ten near-identical concepts; every pair clears the threshold.
        for i in 0..10 {
            g.insert_concept(&format!("c{i}"), "cat", unit(i as f64 * 0.5), BTreeMap::new());
            for idx in 0..g.node_count() {
                assert!(g.semantic_degree(idx) <= 3, "node {idx} exceeded the cap");
            }
        }
    }

    #[test]
    fn reinsert_overwrites_but_keeps_counters() {
        let mut g = graph();
        g.insert_concept("TNE", "tarjetas", unit(0.0), BTreeMap::new());
        g.find_related(&unit(0.0), 1, false);
        assert_eq!(g.get("TNE").unwrap().access_count, 1);

        let fresh = g.insert_concept("TNE", "credenciales", unit(5.0), BTreeMap::new());
        assert!(!fresh);
        let node = g.get("TNE").unwrap();
        assert_eq!(node.category, "credenciales");
        assert_eq!(node.access_count, 1);
    }

    #[test]
    fn exploration_threshold_is_looser_than_creation() {
        let mut g = graph();
        g.insert_concept("matricula", "tramites", unit(0.0), BTreeMap::new());
        // cos(45°) ≈ 0.707: no edge at creation (needs > 0.75), but still
        // explorable (needs > 0.6).
        g.insert_concept("beca", "tramites", unit(45.0), BTreeMap::new());
        assert_eq!(g.edge_count(), 0);

        let hits = g.find_related(&unit(0.0), 5, false);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn learned_edges_strengthen_and_saturate() {
        let mut g = graph();
        g.insert_concept("TNE", "tarjetas", unit(0.0), BTreeMap::new());

        let q = unit(10.0);
        g.learn_from_interaction("como saco la tne", &q, &["TNE".into()], 5.0);
        let first = g.learned_edge_weight("como saco la tne", "TNE").unwrap();
        assert!((first - cosine_similarity(&q, &unit(0.0))).abs() < 1e-6);

        for _ in 0..20 {
            g.learn_from_interaction("como saco la tne", &q, &["TNE".into()], 5.0);
        }
        let final_weight = g.learned_edge_weight("como saco la tne", "TNE").unwrap();
        assert!(final_weight <= 1.0);
        assert!(final_weight > first);
    }

    #[test]
    fn confidence_monotonically_rises_and_clamps() {
        let mut g = graph();
        g.insert_concept("TNE", "tarjetas", unit(0.0), BTreeMap::new());
        // Start somewhere below 1.0 so growth is observable.
        let idx = *g.index.get("TNE").unwrap();
        g.nodes[idx].confidence = Confidence::new(0.4);

        let mut previous = 0.4;
        for _ in 0..15 {
            g.learn_from_interaction("tne", &unit(0.0), &["TNE".into()], 4.0);
            let now = g.get("TNE").unwrap().confidence.value();
            assert!(now >= previous);
            assert!(now <= 1.0);
            previous = now;
        }
        assert!((previous - 1.0).abs() < 1e-9, "should saturate at 1.0");
    }

    #[test]
    fn query_nodes_never_join_semantic_linking_or_results() {
        let mut g = graph();
        g.insert_concept("TNE", "tarjetas", unit(0.0), BTreeMap::new());
        g.learn_from_interaction("tne", &unit(0.0), &["TNE".into()], 5.0);

        // A new concept identical to the query embedding must not link to
        // the synthetic query node.
        g.insert_concept("pase escolar", "tarjetas", unit(1.0), BTreeMap::new());
        let hits = g.find_related(&unit(0.0), 10, false);
        assert!(hits.iter().all(|h| !h.concept.starts_with("query:")));
    }
}
