//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - the closed category and scope enums (`EmissionCategory`, `Scope`)
//! - typed per-category input records and the ordered `Questionnaire`
//! - computed outputs (`EmissionResult`, `TotalEmissions`, `Recommendation`)

pub mod lenient;
pub mod records;
pub mod types;

pub use records::*;
pub use types::*;
