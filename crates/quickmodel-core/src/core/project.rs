use std::path::{Path, PathBuf};

pub const TARGETS_DIR: &str = "targets";
pub const TEMPLATES_DIR: &str = "templates";
pub const STRUCTURES_DIR: &str = "structures";
pub const MODELS_DIR: &str = "models";
pub const PACKAGED_MODELS_DIR: &str = "packaged_models";

const STRUCTURES_PDB_DIR: &str = "structures/pdb";
const STRUCTURES_SIFTS_DIR: &str = "structures/sifts";
const TEMPLATES_RESOLVED_DIR: &str = "templates/structures-resolved";
const TEMPLATES_MODELED_LOOPS_DIR: &str = "templates/structures-modeled-loops";

const TARGETS_FASTA: &str = "targets.fa";
const TEMPLATES_RESOLVED_FASTA: &str = "templates-resolved-seq.fa";
const SEQUENCE_IDENTITIES_REPORT: &str = "sequence-identities.txt";

/// The top-level directories whose presence marks an initialized project.
const TOPLEVEL_DIRS: [&str; 5] = [
    TARGETS_DIR,
    TEMPLATES_DIR,
    STRUCTURES_DIR,
    MODELS_DIR,
    PACKAGED_MODELS_DIR,
];

/// The directory tree of a modeling project.
///
/// The tree itself is created and populated by the external toolkit; this type only knows
/// where things live so the workflow can inspect the toolkit's reports between stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `true` when every top-level project directory exists under the root.
    pub fn is_initialized(&self) -> bool {
        TOPLEVEL_DIRS.iter().all(|dir| self.root.join(dir).is_dir())
    }

    /// All directories an initialized project contains, top-level ones first.
    pub fn directories(&self) -> Vec<PathBuf> {
        TOPLEVEL_DIRS
            .iter()
            .chain(&[
                STRUCTURES_PDB_DIR,
                STRUCTURES_SIFTS_DIR,
                TEMPLATES_RESOLVED_DIR,
                TEMPLATES_MODELED_LOOPS_DIR,
            ])
            .map(|dir| self.root.join(dir))
            .collect()
    }

    pub fn targets_fasta(&self) -> PathBuf {
        self.root.join(TARGETS_DIR).join(TARGETS_FASTA)
    }

    pub fn templates_resolved_fasta(&self) -> PathBuf {
        self.root.join(TEMPLATES_DIR).join(TEMPLATES_RESOLVED_FASTA)
    }

    pub fn target_models_dir(&self, target_id: &str) -> PathBuf {
        self.root.join(MODELS_DIR).join(target_id)
    }

    /// Location of the `(template id, sequence identity %)` report written by the alignment
    /// stage for one target.
    pub fn sequence_identities_report(&self, target_id: &str) -> PathBuf {
        self.target_models_dir(target_id)
            .join(SEQUENCE_IDENTITIES_REPORT)
    }
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self::new(".")
    }
}
