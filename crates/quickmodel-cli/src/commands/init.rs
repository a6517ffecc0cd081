use super::ensembler_for;
use crate::cli::InitArgs;
use crate::error::Result;
use quickmodel::core::project::ProjectLayout;
use quickmodel::engine::ensembler::DEFAULT_EXECUTABLE;
use quickmodel::engine::toolkit::Toolkit;
use std::path::Path;
use tracing::info;

pub fn run(args: InitArgs, project_dir: &Path) -> Result<()> {
    let layout = ProjectLayout::new(project_dir);
    if layout.is_initialized() {
        info!("Project at {:?} is already initialized.", project_dir);
        println!("Project already initialized at {}", project_dir.display());
        return Ok(());
    }

    std::fs::create_dir_all(project_dir)?;
    let executable = args.executable.as_deref().unwrap_or(DEFAULT_EXECUTABLE);
    let mut toolkit = ensembler_for(executable, layout)?;
    toolkit.init_project()?;

    println!("✓ Initialized project at {}", project_dir.display());
    Ok(())
}
