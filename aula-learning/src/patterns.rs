//! Context patterns: which query shapes succeed against which knowledge.
//!
//! Patterns are created on the first qualifying event and never deleted;
//! the success rate is an exponential moving average so old outcomes fade
//! without ever being dropped.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextPattern {
    /// What fired this pattern (query kind, category).
    pub trigger_conditions: Vec<String>,
    /// Knowledge elements seen under this trigger.
    pub context_elements: Vec<String>,
    /// EMA of success outcomes in [0, 1].
    pub success_rate: f64,
    pub usage_count: u64,
    pub last_used: DateTime<Utc>,
}

/// All patterns, keyed by trigger signature.
pub struct PatternBook {
    alpha: f64,
    patterns: HashMap<String, ContextPattern>,
}

impl PatternBook {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            patterns: HashMap::new(),
        }
    }

    /// Record one observation for the keyed pattern, creating it on first
    /// sight.
    pub fn observe(
        &mut self,
        key: &str,
        trigger_conditions: &[String],
        context_elements: &[String],
        success: bool,
    ) {
        let outcome = if success { 1.0 } else { 0.0 };
        let now = Utc::now();
        match self.patterns.get_mut(key) {
            Some(pattern) => {
                pattern.usage_count += 1;
                pattern.success_rate =
                    self.alpha * outcome + (1.0 - self.alpha) * pattern.success_rate;
                pattern.last_used = now;
                for element in context_elements {
                    if !pattern.context_elements.contains(element) {
                        pattern.context_elements.push(element.clone());
                    }
                }
            }
            None => {
                self.patterns.insert(
                    key.to_string(),
                    ContextPattern {
                        trigger_conditions: trigger_conditions.to_vec(),
                        context_elements: context_elements.to_vec(),
                        success_rate: outcome,
                        usage_count: 1,
                        last_used: now,
                    },
                );
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ContextPattern> {
        self.patterns.get(key)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContextPattern)> {
        self.patterns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_creates_the_pattern() {
        let mut book = PatternBook::new(0.3);
        book.observe(
            "location|biblioteca",
            &["location".into(), "biblioteca".into()],
            &["Biblioteca Central".into()],
            true,
        );
        let p = book.get("location|biblioteca").unwrap();
        assert_eq!(p.usage_count, 1);
        assert_eq!(p.success_rate, 1.0);
    }

    #[test]
    fn success_rate_moves_but_never_jumps() {
        let mut book = PatternBook::new(0.3);
        book.observe("k", &[], &[], true);
        book.observe("k", &[], &[], false);
        let after_failure = book.get("k").unwrap().success_rate;
        assert!((after_failure - 0.7).abs() < 1e-9);

        book.observe("k", &[], &[], true);
        let recovered = book.get("k").unwrap().success_rate;
        assert!(recovered > after_failure);
        assert!(recovered < 1.0);
    }

    #[test]
    fn context_elements_accumulate_without_duplicates() {
        let mut book = PatternBook::new(0.3);
        book.observe("k", &[], &["TNE".into()], true);
        book.observe("k", &[], &["TNE".into(), "pase escolar".into()], true);
        let p = book.get("k").unwrap();
        assert_eq!(p.context_elements, vec!["TNE".to_string(), "pase escolar".to_string()]);
    }

    #[test]
    fn patterns_are_never_deleted() {
        let mut book = PatternBook::new(0.3);
        for i in 0..50 {
            book.observe(&format!("k{i}"), &[], &[], false);
        }
        // Failures accumulate history; they never remove patterns.
        assert_eq!(book.len(), 50);
    }
}
