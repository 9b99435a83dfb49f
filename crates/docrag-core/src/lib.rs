//! Shared domain types, error taxonomy, component traits and configuration
//! for the document question-answering engine.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
