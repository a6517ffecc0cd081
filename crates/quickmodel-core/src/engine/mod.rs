//! # Engine Module
//!
//! The plumbing between a run configuration and the external structural-modeling toolkit.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - The validated run configuration and its builder
//! - **Error Handling** ([`error`]) - Configuration and engine error types
//! - **Progress Monitoring** ([`progress`]) - Phase events for user feedback
//! - **Toolkit Seam** ([`toolkit`]) - The trait every external collaborator call goes through
//! - **Command-Line Toolkit** ([`ensembler`]) - A [`toolkit::Toolkit`] that drives the toolkit's executable
//! - **Template Selection** ([`selection`]) - Sequence-identity cutoffs, interactive or fixed

pub mod config;
pub mod ensembler;
pub mod error;
pub mod progress;
pub mod selection;
pub mod toolkit;
