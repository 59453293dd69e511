// File: ./src/model/mod.rs
pub mod entry;
pub mod job;
pub mod parser;

pub use entry::{CalendarEntry, EntrySettings, EventTime, ExtendedProperties};
pub use job::{JobRecord, SourcePost};
pub use parser::TemporalHint;
