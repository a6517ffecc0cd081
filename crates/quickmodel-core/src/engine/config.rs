use crate::core::units::SimLength;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Clone count used when packaging is requested without one.
pub const DEFAULT_FAH_CLONES: u32 = 1;

/// Chain ids to keep per structure id when gathering templates from PDB entries.
pub type ChainIds = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Must specify either a target id or a target UniProt entry name, not both.")]
    ConflictingTarget,

    #[error("Must specify either a target id or a target UniProt entry name.")]
    MissingTarget,

    #[error(
        "If no target id is given, both a target UniProt entry name and a UniProt domain regex are required."
    )]
    MissingDomainRegex,

    #[error("No existing templates found in '{0}'.")]
    NoExistingTemplates(String),

    #[error("A sequence identity cutoff is required when no interactive prompt is available.")]
    MissingSeqidCutoff,

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelection {
    /// A target already present in the project.
    Id(String),
    /// A target to discover from UniProt by entry name (mnemonic).
    Discover { uniprot_entry_name: String },
}

/// Where the template set of a run comes from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource<'a> {
    Explicit(&'a [String]),
    Pdb(&'a [String]),
    UniprotQuery(&'a str),
    Existing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuickModelConfig {
    pub target: TargetSelection,
    pub uniprot_domain_regex: Option<String>,
    pub template_ids: Vec<String>,
    pub pdb_ids: Vec<String>,
    pub chain_ids: ChainIds,
    pub template_uniprot_query: Option<String>,
    pub seqid_cutoff: Option<f64>,
    pub loopmodel: bool,
    pub package_for_fah: bool,
    pub fah_clones: Option<u32>,
    pub structure_dirs: Vec<PathBuf>,
    pub sim_length: SimLength,
}

impl QuickModelConfig {
    pub fn template_source(&self) -> TemplateSource<'_> {
        if !self.template_ids.is_empty() {
            TemplateSource::Explicit(&self.template_ids)
        } else if !self.pdb_ids.is_empty() {
            TemplateSource::Pdb(&self.pdb_ids)
        } else if let Some(query) = &self.template_uniprot_query {
            TemplateSource::UniprotQuery(query)
        } else {
            TemplateSource::Existing
        }
    }

    /// The clone count handed to the packaging stage; zero or unset means one clone.
    pub fn effective_fah_clones(&self) -> u32 {
        self.fah_clones
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_FAH_CLONES)
    }
}

pub struct QuickModelConfigBuilder {
    target_id: Option<String>,
    target_uniprot_entry_name: Option<String>,
    uniprot_domain_regex: Option<String>,
    template_ids: Vec<String>,
    pdb_ids: Vec<String>,
    chain_ids: ChainIds,
    template_uniprot_query: Option<String>,
    seqid_cutoff: Option<f64>,
    loopmodel: bool,
    package_for_fah: bool,
    fah_clones: Option<u32>,
    structure_dirs: Vec<PathBuf>,
    sim_length: SimLength,
}

impl Default for QuickModelConfigBuilder {
    fn default() -> Self {
        Self {
            target_id: None,
            target_uniprot_entry_name: None,
            uniprot_domain_regex: None,
            template_ids: Vec::new(),
            pdb_ids: Vec::new(),
            chain_ids: ChainIds::new(),
            template_uniprot_query: None,
            seqid_cutoff: None,
            loopmodel: true,
            package_for_fah: false,
            fah_clones: None,
            structure_dirs: Vec::new(),
            sim_length: SimLength::default(),
        }
    }
}

impl QuickModelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_id(mut self, id: impl Into<String>) -> Self {
        self.target_id = Some(id.into());
        self
    }
    pub fn target_uniprot_entry_name(mut self, name: impl Into<String>) -> Self {
        self.target_uniprot_entry_name = Some(name.into());
        self
    }
    pub fn uniprot_domain_regex(mut self, regex: impl Into<String>) -> Self {
        self.uniprot_domain_regex = Some(regex.into());
        self
    }
    pub fn template_ids(mut self, ids: Vec<String>) -> Self {
        self.template_ids = ids;
        self
    }
    pub fn pdb_ids(mut self, ids: Vec<String>) -> Self {
        self.pdb_ids = ids;
        self
    }
    pub fn chain_ids(mut self, chain_ids: ChainIds) -> Self {
        self.chain_ids = chain_ids;
        self
    }
    pub fn template_uniprot_query(mut self, query: impl Into<String>) -> Self {
        self.template_uniprot_query = Some(query.into());
        self
    }
    pub fn seqid_cutoff(mut self, cutoff: f64) -> Self {
        self.seqid_cutoff = Some(cutoff);
        self
    }
    pub fn loopmodel(mut self, enabled: bool) -> Self {
        self.loopmodel = enabled;
        self
    }
    pub fn package_for_fah(mut self, enabled: bool) -> Self {
        self.package_for_fah = enabled;
        self
    }
    pub fn fah_clones(mut self, n: u32) -> Self {
        self.fah_clones = Some(n);
        self
    }
    pub fn structure_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.structure_dirs = dirs;
        self
    }
    pub fn sim_length(mut self, length: SimLength) -> Self {
        self.sim_length = length;
        self
    }

    pub fn build(self) -> Result<QuickModelConfig, ConfigError> {
        let target_id = non_blank(self.target_id);
        let entry_name = non_blank(self.target_uniprot_entry_name);
        let uniprot_domain_regex = non_blank(self.uniprot_domain_regex);

        let target = match (target_id, entry_name) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingTarget),
            (None, None) => return Err(ConfigError::MissingTarget),
            (Some(id), None) => TargetSelection::Id(id),
            (None, Some(uniprot_entry_name)) => {
                if uniprot_domain_regex.is_none() {
                    return Err(ConfigError::MissingDomainRegex);
                }
                TargetSelection::Discover { uniprot_entry_name }
            }
        };

        if let Some(cutoff) = self.seqid_cutoff {
            if !cutoff.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: "seqid_cutoff",
                    reason: format!("expected a finite percentage, got {}", cutoff),
                });
            }
        }

        if let Some(dir) = self.structure_dirs.iter().find(|d| is_blank_path(d)) {
            return Err(ConfigError::InvalidParameter {
                name: "structure_dirs",
                reason: format!("empty structure directory path {:?}", dir),
            });
        }

        Ok(QuickModelConfig {
            target,
            uniprot_domain_regex,
            template_ids: self.template_ids,
            pdb_ids: self.pdb_ids,
            chain_ids: self.chain_ids,
            template_uniprot_query: non_blank(self.template_uniprot_query),
            seqid_cutoff: self.seqid_cutoff,
            loopmodel: self.loopmodel,
            package_for_fah: self.package_for_fah,
            fah_clones: self.fah_clones,
            structure_dirs: self.structure_dirs,
            sim_length: self.sim_length,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn is_blank_path(path: &Path) -> bool {
    path.as_os_str().is_empty()
}
