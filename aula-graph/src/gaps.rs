//! Knowledge-gap discovery: frequently-hit but poorly-connected concepts,
//! and categories with too little coverage.

use std::collections::HashMap;

use aula_core::models::KnowledgeGap;

use crate::graph::{KnowledgeGraph, QUERY_CATEGORY};

impl KnowledgeGraph {
    /// Flag concepts users keep reaching that the graph barely connects
    /// (degree < 2 with access_count above the configured floor), plus
    /// categories holding less than the configured fraction of all nodes.
    ///
    /// Synthetic query nodes are bookkeeping, not knowledge; they are
    /// excluded from both checks.
    pub fn discover_gaps(&self) -> Vec<KnowledgeGap> {
        let mut gaps = Vec::new();

        let real_nodes: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].category != QUERY_CATEGORY)
            .collect();

        for &idx in &real_nodes {
            let node = &self.nodes[idx];
            let degree = self.adjacency[idx].len();
            if degree < 2 && node.access_count > self.config().gap_access_floor {
                gaps.push(KnowledgeGap::IsolatedConcept {
                    concept: node.concept.clone(),
                    degree,
                    access_count: node.access_count,
                });
            }
        }

        let total = real_nodes.len();
        if total > 0 {
            let floor = (total as f64 * self.config().sparse_category_ratio).ceil() as usize;
            let mut by_category: HashMap<&str, usize> = HashMap::new();
            for &idx in &real_nodes {
                *by_category
                    .entry(self.nodes[idx].category.as_str())
                    .or_default() += 1;
            }
            let mut sparse: Vec<(&str, usize)> = by_category
                .into_iter()
                .filter(|(_, count)| *count < floor)
                .collect();
            sparse.sort();
            for (category, node_count) in sparse {
                gaps.push(KnowledgeGap::SparseCategory {
                    category: category.to_string(),
                    node_count,
                });
            }
        }

        gaps
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use aula_core::config::GraphConfig;

    use super::*;

    fn unit(angle_deg: f64) -> Vec<f32> {
        let rad = angle_deg.to_radians();
        vec![rad.cos() as f32, rad.sin() as f32]
    }

    #[test]
    fn busy_but_isolated_concepts_are_flagged() {
        let mut g = KnowledgeGraph::new(GraphConfig::default());
        // Isolated: nothing similar enough to link against.
        g.insert_concept("casino", "alimentacion", unit(0.0), BTreeMap::new());
        g.insert_concept("certificados", "tramites", unit(80.0), BTreeMap::new());

        // Six lookups push "casino" past the access floor of 5.
        for _ in 0..6 {
            g.find_related(&unit(0.0), 1, false);
        }

        let gaps = g.discover_gaps();
        assert!(gaps.iter().any(|gap| matches!(
            gap,
            KnowledgeGap::IsolatedConcept { concept, .. } if concept == "casino"
        )));
        // "certificados" was never accessed — not a gap.
        assert!(!gaps.iter().any(|gap| matches!(
            gap,
            KnowledgeGap::IsolatedConcept { concept, .. } if concept == "certificados"
        )));
    }

    #[test]
    fn tiny_categories_are_flagged_as_sparse() {
        let mut g = KnowledgeGraph::new(GraphConfig {
            sparse_category_ratio: 0.2,
            ..Default::default()
        });
        // 9 nodes in one category, 1 in another: floor = ceil(10 × 0.2) = 2.
        for i in 0..9 {
            g.insert_concept(
                &format!("tramite{i}"),
                "tramites",
                unit(i as f64 * 17.0),
                BTreeMap::new(),
            );
        }
        g.insert_concept("casino", "alimentacion", unit(171.0), BTreeMap::new());

        let gaps = g.discover_gaps();
        assert!(gaps.iter().any(|gap| matches!(
            gap,
            KnowledgeGap::SparseCategory { category, .. } if category == "alimentacion"
        )));
        assert!(!gaps.iter().any(|gap| matches!(
            gap,
            KnowledgeGap::SparseCategory { category, .. } if category == "tramites"
        )));
    }

    #[test]
    fn empty_graph_reports_no_gaps() {
        let g = KnowledgeGraph::new(GraphConfig::default());
        assert!(g.discover_gaps().is_empty());
        assert_eq!(g.density(), 0.0);
    }
}
