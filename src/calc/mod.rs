//! Emissions aggregation.
//!
//! Pure functions only: a questionnaire and a factor table go in, totals come
//! out. Persistence and caching live with the callers (`store`, `cache`).

pub mod category;
pub mod total;

pub use category::*;
pub use total::*;
