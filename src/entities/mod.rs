//! Entity type definitions
//!
//! - [`Record`] - A scored idea with its score vector and lifecycle status
//! - [`NewRecord`] - The fields supplied when proposing an idea
//! - [`Draft`] - An editable overlay of a record's mutable fields

pub mod record;

pub use record::{Draft, FieldError, FieldValue, NewRecord, Record, RecordField, RecordId, Scores};
