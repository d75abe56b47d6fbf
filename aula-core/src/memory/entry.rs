use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::Confidence;
use super::importance::Importance;
use crate::constants::MAX_EXTRA_METADATA_KEYS;
use crate::errors::ValidationError;

/// The kind of knowledge an entry carries. Each kind has its own
/// details struct (see [`EntryDetails`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    Fact,
    Location,
    Contact,
    Procedure,
    Schedule,
    General,
}

impl ContextType {
    /// Stable lowercase name, used as the SQLite column value.
    pub fn as_str(self) -> &'static str {
        match self {
            ContextType::Fact => "fact",
            ContextType::Location => "location",
            ContextType::Contact => "contact",
            ContextType::Procedure => "procedure",
            ContextType::Schedule => "schedule",
            ContextType::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fact" => Some(ContextType::Fact),
            "location" => Some(ContextType::Location),
            "contact" => Some(ContextType::Contact),
            "procedure" => Some(ContextType::Procedure),
            "schedule" => Some(ContextType::Schedule),
            "general" => Some(ContextType::General),
            _ => None,
        }
    }
}

/// Typed details wrapper — each context type has its own struct.
/// Serialized as a tagged enum so the type is preserved in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum EntryDetails {
    Fact(FactDetails),
    Location(LocationDetails),
    Contact(ContactDetails),
    Procedure(ProcedureDetails),
    Schedule(ScheduleDetails),
    General,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactDetails {
    /// What the fact is about, when known.
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationDetails {
    pub building: Option<String>,
    pub room: Option<String>,
    pub floor: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub office_hours: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDetails {
    /// Ordered steps, when the source material provides them.
    pub steps: Vec<String>,
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDetails {
    pub opens: Option<String>,
    pub closes: Option<String>,
    pub days: Option<String>,
}

impl EntryDetails {
    /// The context type these details belong to.
    pub fn context_type(&self) -> ContextType {
        match self {
            EntryDetails::Fact(_) => ContextType::Fact,
            EntryDetails::Location(_) => ContextType::Location,
            EntryDetails::Contact(_) => ContextType::Contact,
            EntryDetails::Procedure(_) => ContextType::Procedure,
            EntryDetails::Schedule(_) => ContextType::Schedule,
            EntryDetails::General => ContextType::General,
        }
    }

    /// Empty details for a given context type.
    pub fn empty_for(context_type: ContextType) -> Self {
        match context_type {
            ContextType::Fact => EntryDetails::Fact(FactDetails::default()),
            ContextType::Location => EntryDetails::Location(LocationDetails::default()),
            ContextType::Contact => EntryDetails::Contact(ContactDetails::default()),
            ContextType::Procedure => EntryDetails::Procedure(ProcedureDetails::default()),
            ContextType::Schedule => EntryDetails::Schedule(ScheduleDetails::default()),
            ContextType::General => EntryDetails::General,
        }
    }
}

/// A knowledge fragment held by the tiered memory store.
///
/// The store exclusively owns these records; `related_ids` are weak
/// lookups, never ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// UUID v4 identifier.
    pub id: String,
    /// The raw text of the fragment.
    pub content: String,
    /// Derived from `details`, duplicated for cheap filtering.
    pub context_type: ContextType,
    pub category: String,
    pub subcategory: Option<String>,
    /// User or session the entry belongs to, if scoped.
    pub owner: Option<String>,
    /// Fixed-dimension embedding of `content`.
    pub embedding: Vec<f32>,
    pub importance: Importance,
    /// Monotonically non-decreasing; incremented via the background queue.
    pub access_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    /// Schema'd per-context-type details.
    pub details: EntryDetails,
    /// Bounded escape hatch for forward compatibility.
    pub extra: BTreeMap<String, String>,
    /// Weak references to similar entries discovered at store time.
    pub related_ids: Vec<String>,
    pub confidence: Confidence,
    /// Where the fragment came from (ingestion tag).
    pub source: String,
}

impl MemoryEntry {
    /// Eviction score used by the hot tier: importance × access count.
    pub fn tier_score(&self) -> f64 {
        self.importance.value() * self.access_count as f64
    }

    /// Validate the bounded metadata map. Called before any I/O.
    pub fn validate_extra(extra: &BTreeMap<String, String>) -> Result<(), ValidationError> {
        if extra.len() > MAX_EXTRA_METADATA_KEYS {
            return Err(ValidationError::MetadataTooLarge {
                keys: extra.len(),
                max: MAX_EXTRA_METADATA_KEYS,
            });
        }
        Ok(())
    }
}

/// Identity equality: two entries are equal if they have the same ID.
impl PartialEq for MemoryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
