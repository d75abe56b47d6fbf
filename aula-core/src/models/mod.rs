mod feedback;
mod insights;
mod retrieved;

pub use feedback::{FeedbackEvent, FeedbackKind};
pub use insights::{KnowledgeGap, MemoryInsights};
pub use retrieved::{RelatedEntry, RetrievedEntry};
