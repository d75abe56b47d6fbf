mod confidence;
mod entry;
mod importance;

pub use confidence::Confidence;
pub use entry::{
    ContactDetails, ContextType, EntryDetails, FactDetails, LocationDetails, MemoryEntry,
    ProcedureDetails, ScheduleDetails,
};
pub use importance::Importance;
