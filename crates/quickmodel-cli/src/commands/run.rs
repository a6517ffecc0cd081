use super::ensembler_for;
use crate::cli::RunArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use quickmodel::{
    core::project::ProjectLayout,
    engine::{
        progress::ProgressReporter,
        selection::{ConsoleChooser, HeadlessChooser, ThresholdChooser},
        toolkit::Toolkit,
    },
    workflows::{self, quick_model::QuickModelOutcome},
};
use std::io::{self, IsTerminal};
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: RunArgs, project_dir: &Path) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => {
            info!("Loading run file {:?}", path);
            PartialRunConfig::from_file(path)?
        }
        None => PartialRunConfig::default(),
    };
    info!("Merging configuration from run file and CLI arguments...");
    let merged = partial_config.merge_with_cli(&args)?;

    std::fs::create_dir_all(project_dir)?;
    let layout = ProjectLayout::new(project_dir);
    let mut toolkit = ensembler_for(&merged.executable, layout.clone())?;

    // The project is initialized before the run parameters are validated.
    if !layout.is_initialized() {
        info!("No project found in {:?}; initializing one.", project_dir);
        toolkit.init_project()?;
    }
    let run_config = merged.validate()?;

    let mut chooser = chooser_for(run_config.quick_model.seqid_cutoff.is_some());

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting quick-model run in {}...", project_dir.display());
    info!("Invoking the quick-model workflow...");

    let outcome = workflows::quick_model::run(
        &run_config.quick_model,
        &layout,
        &mut toolkit,
        chooser.as_mut(),
        &reporter,
    )
    .inspect_err(|_| progress_handler.abandon())?;

    match outcome {
        QuickModelOutcome::Completed {
            target_id,
            template_ids,
            stages,
        } => {
            info!(
                "Workflow finished: {} stage(s) run for target {}.",
                stages.len(),
                target_id
            );
            println!(
                "✓ Modeled target {} from {} template(s). Results are in {}",
                target_id,
                template_ids.len(),
                layout.target_models_dir(&target_id).display()
            );
        }
        QuickModelOutcome::NoTemplates { target_id } => {
            warn!("Workflow completed but selected no templates.");
            println!(
                "Warning: no templates were selected for target {}. Nothing was modeled.",
                target_id
            );
        }
    }

    Ok(())
}

/// Prompts on the console only when a cutoff is still needed and a person can answer.
fn chooser_for(has_cutoff: bool) -> Box<dyn ThresholdChooser> {
    let stdin = io::stdin();
    if !has_cutoff && stdin.is_terminal() {
        Box::new(ConsoleChooser::new(stdin.lock(), io::stdout()))
    } else {
        Box::new(HeadlessChooser)
    }
}
