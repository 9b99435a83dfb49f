//! LanceDB-backed passage index.
//!
//! One table per index directory, one row per passage:
//! `{id, text, source, owner_id, indexed_at, vector}`. Searches are cosine
//! similarity with an owner pre-filter.

pub mod index;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use index::LanceVectorIndex;
