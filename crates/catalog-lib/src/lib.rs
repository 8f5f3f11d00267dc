//! Catalog library entry points.
//!
//! This crate owns the catalog content served by the API: the static service
//! and software tables, the read-only [`CatalogStore`] built from them, and
//! the generators behind the simulated AI endpoints. The HTTP crates only
//! depend on what is exported here and never reach into the tables directly.

pub mod catalog;
pub mod data;
pub mod error;
pub mod simulation;

pub use catalog::{parse_entry_id, Catalog, CatalogEntry, CatalogStore, Category, EntryId};
pub use error::{Error, Result};
pub use simulation::{AnalysisType, AssessmentScope, Choice, OptimizationTarget, WorkflowType};
