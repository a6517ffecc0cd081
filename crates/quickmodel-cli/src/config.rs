mod defaults;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use defaults::DefaultsConfig;
use quickmodel::core::units::SimLength;
use quickmodel::engine::config::{self as core_config, ChainIds};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialTargetConfig {
    id: Option<String>,
    uniprot_entry_name: Option<String>,
    domain_regex: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialTemplatesConfig {
    ids: Option<Vec<String>>,
    pdb_ids: Option<Vec<String>>,
    chain_ids: Option<ChainIds>,
    uniprot_query: Option<String>,
    seqid_cutoff: Option<f64>,
    structure_dirs: Option<Vec<PathBuf>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialModelingConfig {
    loopmodel: Option<bool>,
    sim_length: Option<SimLength>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialPackagingConfig {
    fah: Option<bool>,
    clones: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialToolkitConfig {
    executable: Option<String>,
}

/// A run file as read from TOML. Every field is optional; gaps are filled from the
/// command line and then from [`DefaultsConfig`].
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    target: Option<PartialTargetConfig>,
    templates: Option<PartialTemplatesConfig>,
    modeling: Option<PartialModelingConfig>,
    packaging: Option<PartialPackagingConfig>,
    toolkit: Option<PartialToolkitConfig>,
}

/// Files, flags and defaults merged, with the run parameters not yet validated.
pub struct MergedRunConfig {
    builder: core_config::QuickModelConfigBuilder,
    pub executable: String,
}

impl MergedRunConfig {
    pub fn validate(self) -> Result<RunConfig> {
        let quick_model = self
            .builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(RunConfig {
            quick_model,
            executable: self.executable,
        })
    }
}

/// Everything the `run` command needs once the merged settings are validated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub quick_model: core_config::QuickModelConfig,
    pub executable: String,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(mut self, args: &RunArgs) -> Result<MergedRunConfig> {
        self.apply_set_values(&args.set_values)?;
        debug!("Run file after --set overrides: {:?}", &self);

        let defaults = DefaultsConfig::default();
        let target = self.target.unwrap_or_default();
        let templates = self.templates.unwrap_or_default();
        let modeling = self.modeling.unwrap_or_default();
        let packaging = self.packaging.unwrap_or_default();
        let toolkit = self.toolkit.unwrap_or_default();

        let mut builder = core_config::QuickModelConfigBuilder::new();

        // A target named on the command line replaces the run file's target entirely.
        let (target_id, entry_name) =
            if args.target_id.is_some() || args.target_entry_name.is_some() {
                (args.target_id.clone(), args.target_entry_name.clone())
            } else {
                (target.id, target.uniprot_entry_name)
            };
        if let Some(id) = target_id {
            builder = builder.target_id(id);
        }
        if let Some(name) = entry_name {
            builder = builder.target_uniprot_entry_name(name);
        }
        if let Some(regex) = args.domain_regex.clone().or(target.domain_regex) {
            builder = builder.uniprot_domain_regex(regex);
        }

        let template_ids = non_empty(&args.template_ids)
            .or(templates.ids)
            .unwrap_or_default();
        let pdb_ids = non_empty(&args.pdb_ids)
            .or(templates.pdb_ids)
            .unwrap_or_default();
        let mut chain_ids = templates.chain_ids.unwrap_or_default();
        chain_ids.extend(
            parser::parse_chain_specs(&args.chains)
                .map_err(|e| CliError::Argument(e.to_string()))?,
        );
        let structure_dirs = non_empty(&args.structure_dirs)
            .or(templates.structure_dirs)
            .unwrap_or_default();

        builder = builder
            .template_ids(template_ids)
            .pdb_ids(pdb_ids)
            .chain_ids(chain_ids)
            .structure_dirs(structure_dirs);
        if let Some(query) = args.template_query.clone().or(templates.uniprot_query) {
            builder = builder.template_uniprot_query(query);
        }
        if let Some(cutoff) = args.seqid_cutoff.or(templates.seqid_cutoff) {
            builder = builder.seqid_cutoff(cutoff);
        }

        let loopmodel = args
            .loop_modeling
            .as_override()
            .or(modeling.loopmodel)
            .unwrap_or(defaults.loopmodel);
        let sim_length = args
            .sim_length
            .or(modeling.sim_length)
            .unwrap_or(defaults.sim_length);
        builder = builder.loopmodel(loopmodel).sim_length(sim_length);

        let package_for_fah = args
            .fah_packaging
            .as_override()
            .or(packaging.fah)
            .unwrap_or(defaults.package_for_fah);
        builder = builder.package_for_fah(package_for_fah);
        if let Some(clones) = args.fah_clones.or(packaging.clones) {
            builder = builder.fah_clones(clones);
        }

        let executable = args
            .executable
            .clone()
            .or(toolkit.executable)
            .unwrap_or(defaults.executable);

        Ok(MergedRunConfig {
            builder,
            executable,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) =
                parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

            match key {
                "templates.seqid-cutoff" => {
                    self.templates
                        .get_or_insert_with(Default::default)
                        .seqid_cutoff = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                    })?);
                }
                "modeling.sim-length" => {
                    self.modeling
                        .get_or_insert_with(Default::default)
                        .sim_length = Some(value_str.parse().map_err(|e| {
                        CliError::Config(format!("Invalid value for {}: {}", key, e))
                    })?);
                }
                "modeling.loopmodel" => {
                    self.modeling.get_or_insert_with(Default::default).loopmodel =
                        Some(parse_bool_for(key, value_str)?);
                }
                "packaging.fah" => {
                    self.packaging.get_or_insert_with(Default::default).fah =
                        Some(parse_bool_for(key, value_str)?);
                }
                "packaging.clones" => {
                    self.packaging.get_or_insert_with(Default::default).clones =
                        Some(value_str.parse().map_err(|_| {
                            CliError::Config(format!(
                                "Invalid integer value for {}: {}",
                                key, value_str
                            ))
                        })?);
                }
                "toolkit.executable" => {
                    self.toolkit.get_or_insert_with(Default::default).executable =
                        Some(value_str.to_string());
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unknown or unsupported key for --set: {}",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn non_empty<T: Clone>(values: &[T]) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}

fn parse_bool_for(key: &str, value: &str) -> Result<bool> {
    parser::parse_bool(value)
        .map_err(|e| CliError::Config(format!("Invalid value for {}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use once_cell::sync::Lazy;
    use quickmodel::engine::config::{TargetSelection, TemplateSource};
    use std::fs;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    fn write_config_file(name: &str, content: &str) -> PathBuf {
        let file_path = TEST_DIR.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["quickmodel", "run"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            other => panic!("expected the run command, got {:?}", other),
        }
    }

    fn load_and_merge(name: &str, content: &str, extra: &[&str]) -> Result<RunConfig> {
        let path = write_config_file(name, content);
        PartialRunConfig::from_file(&path)?
            .merge_with_cli(&run_args(extra))?
            .validate()
    }

    #[test]
    fn run_file_values_are_merged_with_defaults() {
        let config = load_and_merge(
            "full.toml",
            r#"
            [target]
            uniprot-entry-name = "EGFR_HUMAN"
            domain-regex = "^Protein kinase"

            [templates]
            uniprot-query = "domain:\"Protein kinase\" AND reviewed:yes"
            seqid-cutoff = 50.0
            structure-dirs = ["/data/pdb"]

            [modeling]
            sim-length = "1ns"

            [packaging]
            fah = true
            clones = 4
            "#,
            &[],
        )
        .unwrap();

        let qm = &config.quick_model;
        assert_eq!(
            qm.target,
            TargetSelection::Discover {
                uniprot_entry_name: "EGFR_HUMAN".to_string()
            }
        );
        assert_eq!(qm.uniprot_domain_regex.as_deref(), Some("^Protein kinase"));
        assert!(matches!(
            qm.template_source(),
            TemplateSource::UniprotQuery(q) if q.starts_with("domain:")
        ));
        assert_eq!(qm.seqid_cutoff, Some(50.0));
        assert_eq!(qm.structure_dirs, vec![PathBuf::from("/data/pdb")]);
        assert!(qm.loopmodel);
        assert_eq!(qm.sim_length.picoseconds(), 1000.0);
        assert!(qm.package_for_fah);
        assert_eq!(qm.effective_fah_clones(), 4);
        assert_eq!(config.executable, "ensembler");
    }

    #[test]
    fn cli_arguments_override_file_values() {
        let config = load_and_merge(
            "override.toml",
            r#"
            [target]
            uniprot-entry-name = "EGFR_HUMAN"
            domain-regex = "^Protein kinase"

            [templates]
            ids = ["OLD_TEMPLATE"]
            seqid-cutoff = 50.0

            [modeling]
            loopmodel = true
            sim-length = 200

            [toolkit]
            executable = "/opt/ensembler/bin/ensembler"
            "#,
            &[
                "--target-id",
                "EGFR_HUMAN_D0",
                "--template-id",
                "KC1D_HUMAN_D0_4KB8_D",
                "--seqid-cutoff",
                "70",
                "--no-loopmodel",
                "--sim-length",
                "50ps",
                "--executable",
                "ensembler-dev",
            ],
        )
        .unwrap();

        let qm = &config.quick_model;
        assert_eq!(qm.target, TargetSelection::Id("EGFR_HUMAN_D0".to_string()));
        assert_eq!(qm.template_ids, vec!["KC1D_HUMAN_D0_4KB8_D"]);
        assert_eq!(qm.seqid_cutoff, Some(70.0));
        assert!(!qm.loopmodel);
        assert_eq!(qm.sim_length.picoseconds(), 50.0);
        assert_eq!(config.executable, "ensembler-dev");
    }

    #[test]
    fn chain_mappings_from_file_and_cli_are_combined() {
        let config = load_and_merge(
            "chains.toml",
            r#"
            [target]
            id = "EGFR_HUMAN_D0"

            [templates]
            pdb-ids = ["2H8H", "1OPJ"]

            [templates.chain-ids]
            2H8H = ["A"]
            1OPJ = ["B"]
            "#,
            &["--chain", "2H8H:A,B"],
        )
        .unwrap();

        let qm = &config.quick_model;
        assert!(matches!(qm.template_source(), TemplateSource::Pdb(ids) if ids.len() == 2));
        assert_eq!(qm.chain_ids["2H8H"], vec!["A", "B"]);
        assert_eq!(qm.chain_ids["1OPJ"], vec!["B"]);
    }

    #[test]
    fn set_values_override_file_and_defaults() {
        let config = load_and_merge(
            "set.toml",
            r#"
            [target]
            id = "EGFR_HUMAN_D0"

            [modeling]
            loopmodel = true
            "#,
            &[
                "-S",
                "templates.seqid-cutoff=35.5",
                "-S",
                "modeling.loopmodel=false",
                "-S",
                "modeling.sim-length=2 ns",
                "-S",
                "packaging.fah=yes",
                "-S",
                "packaging.clones=10",
                "-S",
                "toolkit.executable=/usr/local/bin/ensembler",
            ],
        )
        .unwrap();

        let qm = &config.quick_model;
        assert_eq!(qm.seqid_cutoff, Some(35.5));
        assert!(!qm.loopmodel);
        assert_eq!(qm.sim_length.picoseconds(), 2000.0);
        assert!(qm.package_for_fah);
        assert_eq!(qm.effective_fah_clones(), 10);
        assert_eq!(config.executable, "/usr/local/bin/ensembler");
    }

    #[test]
    fn cli_flag_disables_packaging_enabled_in_run_file() {
        let content = r#"
            [target]
            id = "EGFR_HUMAN_D0"

            [packaging]
            fah = true
            clones = 4
            "#;

        let disabled = load_and_merge("fah-off.toml", content, &["--no-package-for-fah"]).unwrap();
        assert!(!disabled.quick_model.package_for_fah);

        let kept = load_and_merge("fah-kept.toml", content, &[]).unwrap();
        assert!(kept.quick_model.package_for_fah);
    }

    #[test]
    fn unknown_set_key_is_rejected() {
        let result = PartialRunConfig::default()
            .merge_with_cli(&run_args(&["--target-id", "T", "-S", "modeling.nsteps=5"]));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("modeling.nsteps")));
    }

    #[test]
    fn invalid_set_value_is_rejected() {
        let result = PartialRunConfig::default().merge_with_cli(&run_args(&[
            "--target-id",
            "T",
            "-S",
            "packaging.clones=many",
        ]));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("packaging.clones")));
    }

    #[test]
    fn unknown_run_file_field_is_rejected() {
        let path = write_config_file(
            "unknown.toml",
            r#"
            [modeling]
            temperature = 300
            "#,
        );
        let result = PartialRunConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn missing_run_file_is_a_file_parsing_error() {
        let result = PartialRunConfig::from_file(&TEST_DIR.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn conflicting_target_in_run_file_is_a_config_error() {
        let result = load_and_merge(
            "conflict.toml",
            r#"
            [target]
            id = "EGFR_HUMAN_D0"
            uniprot-entry-name = "EGFR_HUMAN"
            domain-regex = "^Protein kinase"
            "#,
            &[],
        );
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn cli_target_replaces_conflicting_run_file_target() {
        let config = load_and_merge(
            "replace.toml",
            r#"
            [target]
            id = "EGFR_HUMAN_D0"
            "#,
            &["--target-entry-name", "ABL1_HUMAN", "--domain-regex", "^Protein kinase"],
        )
        .unwrap();
        assert_eq!(
            config.quick_model.target,
            TargetSelection::Discover {
                uniprot_entry_name: "ABL1_HUMAN".to_string()
            }
        );
    }

    #[test]
    fn missing_target_is_a_config_error() {
        let result = PartialRunConfig::default()
            .merge_with_cli(&run_args(&[]))
            .and_then(MergedRunConfig::validate);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn malformed_chain_mapping_is_an_argument_error() {
        let result = PartialRunConfig::default()
            .merge_with_cli(&run_args(&["--target-id", "T", "--chain", "2H8H"]));
        assert!(matches!(result, Err(CliError::Argument(_))));
    }
}
