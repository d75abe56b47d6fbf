//! Default values shared by the config structs.

// Store
pub const DEFAULT_HOT_CAPACITY: usize = 100;
pub const DEFAULT_HOT_PROMOTION_THRESHOLD: f64 = 0.7;
pub const DEFAULT_RECALL_SIMILARITY_THRESHOLD: f64 = 0.7;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_SHUTDOWN_DRAIN_SECS: u64 = 5;

// Graph
pub const DEFAULT_EDGE_CREATION_THRESHOLD: f64 = 0.75;
pub const DEFAULT_EXPLORATION_THRESHOLD: f64 = 0.6;
pub const DEFAULT_MAX_CONNECTIONS_PER_NODE: usize = 10;
pub const DEFAULT_GAP_ACCESS_FLOOR: u64 = 5;
pub const DEFAULT_SPARSE_CATEGORY_RATIO: f64 = 0.05;

// Retrieval
pub const DEFAULT_SEMANTIC_WEIGHT: f64 = 0.6;
pub const DEFAULT_BM25_K1: f64 = 1.5;
pub const DEFAULT_BM25_B: f64 = 0.75;

// Learning
pub const DEFAULT_SUCCESS_RATE_ALPHA: f64 = 0.3;
pub const DEFAULT_INTERACTION_WINDOW: usize = 64;

// Embedding
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 256;
pub const DEFAULT_EMBEDDING_CACHE_SIZE: u64 = 4096;
pub const DEFAULT_MAX_CONCURRENT_EMBEDDINGS: usize = 4;
