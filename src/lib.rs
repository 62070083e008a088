//! `ges-bilan` library crate.
//!
//! The binary (`ges`) is a thin wrapper around this library so that:
//!
//! - the aggregation core is testable without spawning processes
//! - modules are reusable (e.g., a web front-end or batch jobs)

pub mod app;
pub mod cache;
pub mod calc;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod factors;
pub mod io;
pub mod plot;
pub mod report;
pub mod store;
