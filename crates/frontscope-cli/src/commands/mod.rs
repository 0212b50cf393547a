//! CLI command implementations.

pub mod aec_filter;
pub mod coherence;
pub mod common;
pub mod correlate;
pub mod enum_table;
pub mod nlmodel;
