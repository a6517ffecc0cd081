use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use super::toolkit::ToolkitError;
use crate::core::io::fasta::FastaError;
use crate::core::io::seqid::SeqIdParseError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Toolkit(#[from] ToolkitError),

    #[error("Failed to read sequence file '{path}': {source}", path = path.display())]
    Fasta {
        path: PathBuf,
        #[source]
        source: FastaError,
    },

    #[error("Failed to read sequence identity report '{path}': {source}", path = path.display())]
    SeqIdReport {
        path: PathBuf,
        #[source]
        source: SeqIdParseError,
    },

    #[error("Target discovery for query '{query}' returned no targets")]
    NoTargetsDiscovered { query: String },

    #[error("Template selection aborted: {0}")]
    Selection(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
