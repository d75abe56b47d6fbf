/// Aula system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of keys allowed in an entry's escape-hatch metadata map.
pub const MAX_EXTRA_METADATA_KEYS: usize = 16;

/// Maximum number of related entries attached to a recall result.
pub const MAX_RELATED_PER_RESULT: usize = 3;

/// Maximum number of related entries linked at store time.
pub const MAX_RELATED_AT_STORE: usize = 5;

/// Cosine similarity floor for linking related entries at store time.
pub const RELATED_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Durable candidate window multiplier for recall (window = 3 × max_results).
pub const DURABLE_CANDIDATE_MULTIPLIER: usize = 3;

/// Access-count floor below which cleanup may delete an entry.
pub const CLEANUP_ACCESS_FLOOR: u64 = 5;

/// Importance floor below which cleanup may delete an entry.
pub const CLEANUP_IMPORTANCE_FLOOR: f64 = 0.3;
