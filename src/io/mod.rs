//! Input/output helpers.
//!
//! - questionnaire JSON input, file or stdin (`input`)
//! - result exports: CSV, JSON report, mailto link (`export`)

pub mod export;
pub mod input;

pub use export::*;
pub use input::*;
