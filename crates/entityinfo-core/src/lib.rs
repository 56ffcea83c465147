//! # entityinfo-core
//!
//! Core types, rules, and traits for the EntityInfo metadata service.
//!
//! This crate holds the manifest and attribute data model, the attribute
//! admissibility rules, the file listing query builder, and the trait seams
//! for the relational store and the graph-store and search-index
//! collaborators.

pub mod defaults;
pub mod error;
pub mod listing;
pub mod logging;
pub mod models;
pub mod rules;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use listing::{ListingParams, ListingZone, SourceType};
pub use models::*;
pub use rules::RuleViolation;
pub use traits::*;
