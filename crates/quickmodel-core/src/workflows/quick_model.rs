use crate::core::io::fasta::{self, SequenceRecord};
use crate::core::io::seqid::SeqIdTable;
use crate::core::project::ProjectLayout;
use crate::engine::config::{ConfigError, QuickModelConfig, TargetSelection, TemplateSource};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::selection::{self, ThresholdChooser};
use crate::engine::toolkit::{Toolkit, ToolkitError};
use std::fmt;
use tracing::{info, instrument, warn};

/// The modeling and refinement stages, in the order a run executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    LoopModeling,
    Alignment,
    ModelBuilding,
    Clustering,
    ImplicitRefinement,
    Solvation,
    WaterCount,
    ExplicitRefinement,
    Packaging,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::LoopModeling => "Modeling template loops",
            Stage::Alignment => "Aligning target and templates",
            Stage::ModelBuilding => "Building models",
            Stage::Clustering => "Clustering models",
            Stage::ImplicitRefinement => "Refining models in implicit solvent",
            Stage::Solvation => "Solvating models",
            Stage::WaterCount => "Determining water counts",
            Stage::ExplicitRefinement => "Refining models in explicit solvent",
            Stage::Packaging => "Packaging models for Folding@home",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuickModelOutcome {
    /// Every stage ran for the selected templates.
    Completed {
        target_id: String,
        template_ids: Vec<String>,
        stages: Vec<Stage>,
    },
    /// Template resolution produced nothing to model; no stage ran.
    NoTemplates { target_id: String },
}

impl QuickModelOutcome {
    pub fn target_id(&self) -> &str {
        match self {
            QuickModelOutcome::Completed { target_id, .. }
            | QuickModelOutcome::NoTemplates { target_id } => target_id,
        }
    }
}

#[instrument(skip_all, name = "quick_model_workflow")]
pub fn run<T, C>(
    config: &QuickModelConfig,
    layout: &ProjectLayout,
    toolkit: &mut T,
    chooser: &mut C,
    reporter: &ProgressReporter,
) -> Result<QuickModelOutcome, EngineError>
where
    T: Toolkit + ?Sized,
    C: ThresholdChooser + ?Sized,
{
    // === Phase 0: Project directory ===
    if !layout.is_initialized() {
        info!("No project found in {:?}; initializing one.", layout.root());
        run_phase(reporter, "Initializing project", || toolkit.init_project())?;
    }

    // === Phase 1: Target ===
    let target_id = resolve_target(config, toolkit, reporter)?;
    info!(target_id = %target_id, "Target resolved.");

    // === Phase 2: Templates ===
    let existing_templates = has_existing_templates(layout)?;
    let template_ids = resolve_templates(
        config,
        layout,
        &target_id,
        existing_templates,
        toolkit,
        chooser,
        reporter,
    )?;

    if template_ids.is_empty() {
        warn!("No templates found for target {}. Exiting.", target_id);
        reporter.report(Progress::Message(format!(
            "No templates found for target {}.",
            target_id
        )));
        return Ok(QuickModelOutcome::NoTemplates { target_id });
    }

    // === Phase 3: Modeling and refinement ===
    let stages = run_modeling_sequence(config, &target_id, &template_ids, toolkit, reporter)?;

    info!(
        "Workflow complete. Modeled target {} on {} template(s).",
        target_id,
        template_ids.len()
    );
    Ok(QuickModelOutcome::Completed {
        target_id,
        template_ids,
        stages,
    })
}

fn resolve_target<T: Toolkit + ?Sized>(
    config: &QuickModelConfig,
    toolkit: &mut T,
    reporter: &ProgressReporter,
) -> Result<String, EngineError> {
    let uniprot_entry_name = match &config.target {
        TargetSelection::Id(id) => return Ok(id.clone()),
        TargetSelection::Discover { uniprot_entry_name } => uniprot_entry_name,
    };
    let domain_regex = config
        .uniprot_domain_regex
        .as_deref()
        .ok_or(ConfigError::MissingDomainRegex)?;

    let query = format!("mnemonic:{}", uniprot_entry_name);
    let targets = run_phase(reporter, "Gathering targets", || {
        toolkit.gather_targets(&query, domain_regex)
    })?;

    let first = targets
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::NoTargetsDiscovered {
            query: query.clone(),
        })?;
    Ok(first.id)
}

fn has_existing_templates(layout: &ProjectLayout) -> Result<bool, EngineError> {
    if !layout.templates_resolved_fasta().is_file() {
        return Ok(false);
    }
    Ok(!read_resolved_templates(layout)?.is_empty())
}

fn read_resolved_templates(layout: &ProjectLayout) -> Result<Vec<SequenceRecord>, EngineError> {
    let path = layout.templates_resolved_fasta();
    fasta::read_records_from_path(&path).map_err(|source| EngineError::Fasta { path, source })
}

fn no_existing_templates(layout: &ProjectLayout) -> EngineError {
    ConfigError::NoExistingTemplates(layout.templates_resolved_fasta().display().to_string()).into()
}

fn resolve_templates<T, C>(
    config: &QuickModelConfig,
    layout: &ProjectLayout,
    target_id: &str,
    existing_templates: bool,
    toolkit: &mut T,
    chooser: &mut C,
    reporter: &ProgressReporter,
) -> Result<Vec<String>, EngineError>
where
    T: Toolkit + ?Sized,
    C: ThresholdChooser + ?Sized,
{
    let domain_regex = config.uniprot_domain_regex.as_deref();

    match config.template_source() {
        TemplateSource::Explicit(template_ids) => {
            if !existing_templates {
                return Err(no_existing_templates(layout));
            }
            Ok(template_ids.to_vec())
        }
        TemplateSource::Pdb(pdb_ids) => {
            run_phase(reporter, "Gathering templates from PDB", || {
                toolkit.gather_templates_from_pdb(
                    pdb_ids,
                    domain_regex,
                    &config.chain_ids,
                    &config.structure_dirs,
                )
            })?;
            Ok(read_resolved_templates(layout)?
                .into_iter()
                .map(|record| record.id)
                .collect())
        }
        TemplateSource::UniprotQuery(query) => {
            run_phase(reporter, "Gathering templates from UniProt", || {
                toolkit.gather_templates_from_uniprot(query, domain_regex, &config.structure_dirs)
            })?;
            align_all_and_select(config, layout, target_id, toolkit, chooser, reporter)
        }
        TemplateSource::Existing => {
            if !existing_templates {
                return Err(no_existing_templates(layout));
            }
            align_all_and_select(config, layout, target_id, toolkit, chooser, reporter)
        }
    }
}

fn align_all_and_select<T, C>(
    config: &QuickModelConfig,
    layout: &ProjectLayout,
    target_id: &str,
    toolkit: &mut T,
    chooser: &mut C,
    reporter: &ProgressReporter,
) -> Result<Vec<String>, EngineError>
where
    T: Toolkit + ?Sized,
    C: ThresholdChooser + ?Sized,
{
    run_phase(reporter, "Aligning target against all templates", || {
        toolkit.align(target_id, None)
    })?;

    let path = layout.sequence_identities_report(target_id);
    let table = SeqIdTable::read_from_path(&path)
        .map_err(|source| EngineError::SeqIdReport { path, source })?;

    selection::select_templates(target_id, &table, config.seqid_cutoff, chooser)
}

fn run_modeling_sequence<T: Toolkit + ?Sized>(
    config: &QuickModelConfig,
    target_id: &str,
    template_ids: &[String],
    toolkit: &mut T,
    reporter: &ProgressReporter,
) -> Result<Vec<Stage>, EngineError> {
    let mut completed = Vec::new();
    let sim_length = config.sim_length;

    if config.loopmodel {
        run_stage(reporter, &mut completed, Stage::LoopModeling, || {
            toolkit.model_template_loops(template_ids)
        })?;
    }
    run_stage(reporter, &mut completed, Stage::Alignment, || {
        toolkit.align(target_id, Some(template_ids))
    })?;
    run_stage(reporter, &mut completed, Stage::ModelBuilding, || {
        toolkit.build_models(target_id, template_ids)
    })?;
    run_stage(reporter, &mut completed, Stage::Clustering, || {
        toolkit.cluster_models(target_id)
    })?;
    run_stage(reporter, &mut completed, Stage::ImplicitRefinement, || {
        toolkit.refine_implicit(target_id, template_ids, sim_length)
    })?;
    run_stage(reporter, &mut completed, Stage::Solvation, || {
        toolkit.solvate_models(target_id, template_ids)
    })?;
    run_stage(reporter, &mut completed, Stage::WaterCount, || {
        toolkit.determine_nwaters(target_id, template_ids)
    })?;
    run_stage(reporter, &mut completed, Stage::ExplicitRefinement, || {
        toolkit.refine_explicit(target_id, template_ids, sim_length)
    })?;
    if config.package_for_fah {
        let nclones = config.effective_fah_clones();
        run_stage(reporter, &mut completed, Stage::Packaging, || {
            toolkit.package_for_fah(target_id, nclones)
        })?;
    }

    Ok(completed)
}

fn run_stage(
    reporter: &ProgressReporter,
    completed: &mut Vec<Stage>,
    stage: Stage,
    op: impl FnOnce() -> Result<(), ToolkitError>,
) -> Result<(), EngineError> {
    run_phase(reporter, stage.name(), op)?;
    completed.push(stage);
    Ok(())
}

fn run_phase<R>(
    reporter: &ProgressReporter,
    name: &'static str,
    op: impl FnOnce() -> Result<R, ToolkitError>,
) -> Result<R, EngineError> {
    reporter.report(Progress::PhaseStart { name });
    info!("{}...", name);
    let result = op()?;
    reporter.report(Progress::PhaseFinish);
    Ok(result)
}
