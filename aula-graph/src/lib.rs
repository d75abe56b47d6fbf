//! # aula-graph
//!
//! A similarity-linked network of named concepts. Nodes live in an arena
//! (`Vec<ConceptNode>`) with a side index mapping concept string → slot,
//! and per-node adjacency lists — no reference cycles, cheap to serialize.

mod gaps;
mod graph;

pub use graph::{ConceptNode, Edge, EdgeKind, KnowledgeGraph, RelatedConcept};
