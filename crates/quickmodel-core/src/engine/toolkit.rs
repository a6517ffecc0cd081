use super::config::ChainIds;
use crate::core::io::fasta::{FastaError, SequenceRecord};
use crate::core::units::SimLength;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("Toolkit executable '{executable}' was not found. Is it installed and on PATH?")]
    ToolNotFound { executable: String },

    #[error("Toolkit command '{subcommand}' failed ({status}): {stderr}")]
    CommandFailed {
        subcommand: String,
        status: String,
        stderr: String,
    },

    #[error("Could not run toolkit command '{subcommand}': {source}")]
    Io {
        subcommand: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read toolkit output '{path}': {source}", path = path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: FastaError,
    },
}

/// The external structural-modeling collaborators a quick-model run is built from.
///
/// Each method maps to one operation of the toolkit. Implementations own the project
/// directory the operations read and write; the workflow only inspects the reports they leave
/// behind through [`crate::core::project::ProjectLayout`].
pub trait Toolkit {
    /// Creates the project directory tree.
    fn init_project(&mut self) -> Result<(), ToolkitError>;

    /// Retrieves targets matching a UniProt query and returns them in discovery order.
    fn gather_targets(
        &mut self,
        query: &str,
        domain_regex: &str,
    ) -> Result<Vec<SequenceRecord>, ToolkitError>;

    fn gather_templates_from_pdb(
        &mut self,
        pdb_ids: &[String],
        domain_regex: Option<&str>,
        chain_ids: &ChainIds,
        structure_dirs: &[PathBuf],
    ) -> Result<(), ToolkitError>;

    fn gather_templates_from_uniprot(
        &mut self,
        query: &str,
        domain_regex: Option<&str>,
        structure_dirs: &[PathBuf],
    ) -> Result<(), ToolkitError>;

    fn model_template_loops(&mut self, template_ids: &[String]) -> Result<(), ToolkitError>;

    /// Aligns a target against the given templates, or against every template in the project
    /// when `template_ids` is `None`.
    fn align(
        &mut self,
        target_id: &str,
        template_ids: Option<&[String]>,
    ) -> Result<(), ToolkitError>;

    fn build_models(&mut self, target_id: &str, template_ids: &[String])
    -> Result<(), ToolkitError>;

    fn cluster_models(&mut self, target_id: &str) -> Result<(), ToolkitError>;

    fn refine_implicit(
        &mut self,
        target_id: &str,
        template_ids: &[String],
        sim_length: SimLength,
    ) -> Result<(), ToolkitError>;

    fn solvate_models(
        &mut self,
        target_id: &str,
        template_ids: &[String],
    ) -> Result<(), ToolkitError>;

    /// Determines how many water molecules each solvated model needs.
    fn determine_nwaters(
        &mut self,
        target_id: &str,
        template_ids: &[String],
    ) -> Result<(), ToolkitError>;

    fn refine_explicit(
        &mut self,
        target_id: &str,
        template_ids: &[String],
        sim_length: SimLength,
    ) -> Result<(), ToolkitError>;

    /// Packages refined models as Folding@home work units.
    fn package_for_fah(&mut self, target_id: &str, nclones: u32) -> Result<(), ToolkitError>;
}
