//! # QuickModel Core Library
//!
//! A driver library that takes a protein target from a bare identifier to a set of refined,
//! optionally packaged, homology models by sequencing calls into an external
//! structural-modeling toolkit.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that the pipeline logic stays testable without
//! the external toolkit installed.
//!
//! - **[`core`]: The Foundation.** Stateless pieces: the on-disk project layout, readers for the
//!   toolkit's FASTA and sequence-identity reports, and the simulation time quantity.
//!
//! - **[`engine`]: The Plumbing.** Run configuration and its builder, error types, progress
//!   reporting, the [`engine::toolkit::Toolkit`] seam to the external collaborators (with a
//!   command-line backed implementation), and sequence-identity template selection.
//!
//! - **[`workflows`]: The Public API.** The quick-model workflow, which resolves the target and
//!   template set and drives the modeling and refinement stages in order.

pub mod core;
pub mod engine;
pub mod workflows;
