//! # Workflows Module
//!
//! High-level entry points that drive a complete modeling run.
//!
//! - **Quick Model** ([`quick_model`]) - Resolves a target and its templates, then aligns,
//!   builds, clusters, refines and optionally packages models in one synchronous pass.

pub mod quick_model;
