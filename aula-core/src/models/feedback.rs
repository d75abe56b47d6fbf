use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// How a feedback score is interpreted.
///
/// Scores of 4-5 reinforce; scores of 1-2 only tag the interaction for
/// review. A score of 3 is neutral and recorded without any adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Positive,
    Neutral,
    Negative,
}

/// A feedback signal emitted by the feedback source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub query: String,
    /// 1-5 inclusive.
    pub score: u8,
    pub owner: Option<String>,
    pub category: Option<String>,
    pub comment: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl FeedbackEvent {
    pub fn new(query: impl Into<String>, score: u8) -> Result<Self, ValidationError> {
        if !(1..=5).contains(&score) {
            return Err(ValidationError::FeedbackScoreOutOfRange { score });
        }
        Ok(Self {
            query: query.into(),
            score,
            owner: None,
            category: None,
            comment: None,
            received_at: Utc::now(),
        })
    }

    pub fn kind(&self) -> FeedbackKind {
        match self.score {
            s if s >= 4 => FeedbackKind::Positive,
            s if s < 3 => FeedbackKind::Negative,
            _ => FeedbackKind::Neutral,
        }
    }
}
