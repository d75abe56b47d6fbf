/// Input validation errors, raised before any I/O.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("entry content must not be empty")]
    EmptyContent,

    #[error("importance score must be finite, got {value}")]
    NonFiniteImportance { value: f64 },

    #[error("metadata map holds {keys} keys, maximum is {max}")]
    MetadataTooLarge { keys: usize, max: usize },

    #[error("feedback score {score} outside the 1-5 range")]
    FeedbackScoreOutOfRange { score: u8 },
}
