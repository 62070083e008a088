//! Static emission factors.
//!
//! The aggregator only ever reads from an `EmissionFactorTable`; a field whose
//! factor is missing contributes nothing.

pub mod table;

pub use table::*;
