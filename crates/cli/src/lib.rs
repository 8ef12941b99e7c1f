//! Section Match Filter CLI
//!
//! Job configuration and command implementations for the `section-match-filter`
//! binary.

pub mod commands;
pub mod config;

pub use config::{load_config, FilterSettings, JobArgs, JobConfig};
