//! # Core Module
//!
//! Stateless building blocks shared by the engine and the workflows.
//!
//! - **Project Layout** ([`project`]) - Directory names and well-known files of a modeling project
//! - **File I/O** ([`io`]) - Readers for FASTA sequence files and sequence-identity reports
//! - **Units** ([`units`]) - The simulation length quantity passed to the refinement stages

pub mod io;
pub mod project;
pub mod units;
