//! Integration test modules for polytouch
//!
//! - engine: lifecycle, control thread, configuration
//! - allocation: voice allocation, stealing, mono/poly semantics
//! - modulation: end-to-end modulation through the public API

pub mod allocation;
pub mod modulation;
