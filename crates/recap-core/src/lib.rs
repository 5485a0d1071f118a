//! Shared building blocks for chat-recap.
//!
//! Record types, the error enum, timestamp and timezone handling, number
//! formatting, summary statistics and CLI settings used by the data layer and
//! the binary.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod statistics;
pub mod time_utils;

pub use error::{FieldError, RecapError, Result};
