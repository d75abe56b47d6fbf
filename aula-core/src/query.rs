//! Query kinds and their adaptive retrieval profiles.
//!
//! Classification itself lives in `aula-retrieval`; the kinds and the
//! per-kind `(similarity_threshold, max_results)` pairs are defined here so
//! every crate agrees on them.

use serde::{Deserialize, Serialize};

/// The bucket a free-text query falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Location,
    Contact,
    Procedure,
    General,
    Technical,
}

/// Per-kind retrieval profile: a similarity cutoff and a result count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryProfile {
    pub similarity_threshold: f64,
    pub max_results: usize,
}

impl QueryKind {
    /// The adaptive profile for this kind.
    ///
    /// Location queries use the lowest threshold — recall matters most for
    /// "where is X" questions. Technical queries use the highest — a wrong
    /// answer about VPN setup is worse than no answer.
    pub fn profile(self) -> QueryProfile {
        match self {
            QueryKind::Location => QueryProfile {
                similarity_threshold: 0.20,
                max_results: 5,
            },
            QueryKind::Contact => QueryProfile {
                similarity_threshold: 0.25,
                max_results: 3,
            },
            QueryKind::Procedure => QueryProfile {
                similarity_threshold: 0.30,
                max_results: 5,
            },
            QueryKind::General => QueryProfile {
                similarity_threshold: 0.35,
                max_results: 4,
            },
            QueryKind::Technical => QueryProfile {
                similarity_threshold: 0.45,
                max_results: 3,
            },
        }
    }
}

impl Default for QueryKind {
    fn default() -> Self {
        QueryKind::General
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_is_loosest_technical_is_strictest() {
        let kinds = [
            QueryKind::Location,
            QueryKind::Contact,
            QueryKind::Procedure,
            QueryKind::General,
            QueryKind::Technical,
        ];
        for kind in kinds {
            let p = kind.profile();
            assert!(p.similarity_threshold >= QueryKind::Location.profile().similarity_threshold);
            assert!(p.similarity_threshold <= QueryKind::Technical.profile().similarity_threshold);
            assert!((3..=5).contains(&p.max_results));
        }
    }
}
