//! Retrieval-augmented answering over indexed courses.
//!
//! [`RagSystem`] wires the chunker, index, tools and sessions together and
//! drives the tool-calling conversation with the reasoning service.

mod ingest;
mod system;
pub mod types;

pub use system::RagSystem;
pub use types::{DocumentOutcome, RagResponse};
