//! Data pipeline for chat-recap.
//!
//! Responsible for reading a conversation export, extracting per-conversation
//! metadata, aggregating it into time and model buckets and assembling the
//! final report.

pub mod aggregator;
pub mod analysis;
pub mod extractor;
pub mod reader;

pub use recap_core as core;
