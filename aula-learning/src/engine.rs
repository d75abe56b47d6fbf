//! LearningEngine: feedback in, reinforcement instructions out.

use tracing::{debug, info};

use aula_core::config::LearningConfig;
use aula_core::models::{FeedbackEvent, FeedbackKind};
use aula_core::query::QueryKind;

use crate::patterns::PatternBook;

/// What a feedback event asks the rest of the system to do.
///
/// `reinforced` names the concepts whose confidence and learned edges
/// should rise; it is empty for anything but positive feedback. Negative
/// feedback only sets `needs_improvement` — by design nothing ever gets
/// weaker.
#[derive(Debug, Clone)]
pub struct LearningOutcome {
    pub kind: FeedbackKind,
    pub needs_improvement: bool,
    pub reinforced: Vec<String>,
    /// Raw 1-5 score as a float, fed to the graph's reinforcement formula.
    pub feedback_score: f64,
}

pub struct LearningEngine {
    patterns: PatternBook,
}

impl LearningEngine {
    pub fn new(config: &LearningConfig) -> Self {
        Self {
            patterns: PatternBook::new(config.success_rate_alpha),
        }
    }

    /// Classify the event, update the matching context pattern, and emit
    /// the reinforcement instruction.
    pub fn process(
        &mut self,
        event: &FeedbackEvent,
        query_kind: QueryKind,
        matched_concepts: &[String],
    ) -> LearningOutcome {
        let kind = event.kind();

        let category = event.category.as_deref().unwrap_or("general");
        let key = format!("{query_kind:?}|{category}").to_lowercase();
        let trigger = vec![format!("{query_kind:?}").to_lowercase(), category.to_string()];
        self.patterns.observe(
            &key,
            &trigger,
            matched_concepts,
            kind == FeedbackKind::Positive,
        );

        let outcome = match kind {
            FeedbackKind::Positive => {
                info!(
                    query = %event.query,
                    score = event.score,
                    concepts = matched_concepts.len(),
                    "positive feedback, reinforcing"
                );
                LearningOutcome {
                    kind,
                    needs_improvement: false,
                    reinforced: matched_concepts.to_vec(),
                    feedback_score: event.score as f64,
                }
            }
            FeedbackKind::Negative => {
                // Tag for review; never weaken what exists.
                info!(query = %event.query, score = event.score, "negative feedback, tagged for review");
                LearningOutcome {
                    kind,
                    needs_improvement: true,
                    reinforced: Vec::new(),
                    feedback_score: event.score as f64,
                }
            }
            FeedbackKind::Neutral => {
                debug!(query = %event.query, "neutral feedback recorded");
                LearningOutcome {
                    kind,
                    needs_improvement: false,
                    reinforced: Vec::new(),
                    feedback_score: event.score as f64,
                }
            }
        };
        outcome
    }

    pub fn patterns(&self) -> &PatternBook {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> LearningEngine {
        LearningEngine::new(&LearningConfig::default())
    }

    fn event(score: u8) -> FeedbackEvent {
        let mut e = FeedbackEvent::new("como renuevo la tne", score).unwrap();
        e.category = Some("tarjetas".into());
        e
    }

    #[test]
    fn positive_feedback_reinforces_matched_concepts() {
        let mut engine = engine();
        let outcome = engine.process(&event(5), QueryKind::Procedure, &["TNE".into()]);
        assert_eq!(outcome.kind, FeedbackKind::Positive);
        assert_eq!(outcome.reinforced, vec!["TNE".to_string()]);
        assert!(!outcome.needs_improvement);
    }

    #[test]
    fn negative_feedback_only_tags_for_review() {
        let mut engine = engine();
        let outcome = engine.process(&event(1), QueryKind::Procedure, &["TNE".into()]);
        assert_eq!(outcome.kind, FeedbackKind::Negative);
        assert!(outcome.needs_improvement);
        assert!(outcome.reinforced.is_empty(), "nothing is ever weakened or punished");
    }

    #[test]
    fn neutral_feedback_neither_tags_nor_reinforces() {
        let mut engine = engine();
        let outcome = engine.process(&event(3), QueryKind::Procedure, &[]);
        assert_eq!(outcome.kind, FeedbackKind::Neutral);
        assert!(!outcome.needs_improvement);
        assert!(outcome.reinforced.is_empty());
    }

    #[test]
    fn every_event_feeds_the_pattern_book() {
        let mut engine = engine();
        engine.process(&event(5), QueryKind::Procedure, &["TNE".into()]);
        engine.process(&event(1), QueryKind::Procedure, &["TNE".into()]);
        engine.process(&event(3), QueryKind::Procedure, &[]);

        let pattern = engine.patterns().get("procedure|tarjetas").unwrap();
        assert_eq!(pattern.usage_count, 3);
        // One success out of three, EMA-smoothed: strictly between 0 and 1.
        assert!(pattern.success_rate > 0.0 && pattern.success_rate < 1.0);
    }
}
