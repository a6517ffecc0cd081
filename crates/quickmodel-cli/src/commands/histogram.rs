use crate::cli::HistogramArgs;
use crate::error::{CliError, Result};
use quickmodel::core::io::seqid::SeqIdTable;
use quickmodel::core::project::ProjectLayout;
use quickmodel::engine::selection;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

pub fn run(args: HistogramArgs, project_dir: &Path) -> Result<()> {
    let stdout = io::stdout();
    write_report(&args, project_dir, &mut stdout.lock())
}

fn write_report(args: &HistogramArgs, project_dir: &Path, out: &mut impl Write) -> Result<()> {
    let layout = ProjectLayout::new(project_dir);
    let path = layout.sequence_identities_report(&args.target);
    info!("Reading sequence identities from {:?}", &path);

    let table = SeqIdTable::read_from_path(&path).map_err(|e| CliError::FileParsing {
        path: path.clone(),
        source: e.into(),
    })?;

    writeln!(
        out,
        "Sequence identities for target {} ({} templates):",
        args.target,
        table.len()
    )?;
    selection::write_histogram(&table, out)?;

    if let Some(cutoff) = args.cutoff {
        let selected = table.select_above(cutoff);
        writeln!(
            out,
            "Templates with seqid > {}: {}",
            cutoff,
            selected.len()
        )?;
        for template_id in selected {
            writeln!(out, "  {}", template_id)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn project_with_report(target: &str, report: &str) -> tempfile::TempDir {
        let project = tempdir().unwrap();
        let path = ProjectLayout::new(project.path()).sequence_identities_report(target);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, report).unwrap();
        project
    }

    #[test]
    fn prints_histogram_and_selection_for_cutoff() {
        let project = project_with_report("TGT", "T1 95.0\nT2 40.0\nT3 10.0\n");
        let args = HistogramArgs {
            target: "TGT".to_string(),
            cutoff: Some(30.0),
        };

        let mut out = Vec::new();
        write_report(&args, project.path(), &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();

        assert!(printed.starts_with("Sequence identities for target TGT (3 templates):"));
        assert!(printed.contains("Number of templates with seqid > 90: 1"));
        assert!(printed.contains("Templates with seqid > 30: 2\n  T1\n  T2\n"));
    }

    #[test]
    fn missing_report_is_a_file_parsing_error() {
        let project = tempdir().unwrap();
        let args = HistogramArgs {
            target: "TGT".to_string(),
            cutoff: None,
        };

        let result = write_report(&args, project.path(), &mut Vec::new());
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
