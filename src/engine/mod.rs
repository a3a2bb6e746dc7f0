//! Types supplied by the query engine.
//!
//! # Responsibilities
//! - Describe the data the engine hands to tracer hooks at start time
//! - Describe the errors the engine hands to finish continuations
//!
//! # Design Decisions
//! - Start events borrow engine data; nothing here owns or mutates it
//! - Errors are plain data: tracers only read them

pub mod errors;
pub mod events;

pub use errors::{Location, PathSegment, QueryError};
pub use events::{FieldStart, QueryStart, TypeMetadata, Variables};
