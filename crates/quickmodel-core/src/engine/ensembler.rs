use super::config::ChainIds;
use super::toolkit::{Toolkit, ToolkitError};
use crate::core::io::fasta::{self, SequenceRecord};
use crate::core::project::ProjectLayout;
use crate::core::units::SimLength;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, info, trace};

pub const DEFAULT_EXECUTABLE: &str = "ensembler";

/// Lines of stderr kept in a [`ToolkitError::CommandFailed`].
const STDERR_TAIL_LINES: usize = 20;

/// A [`Toolkit`] that runs each operation as a subcommand of the toolkit's command-line
/// program, with the project root as working directory.
#[derive(Debug, Clone)]
pub struct EnsemblerCli {
    program: OsString,
    leading_args: Vec<OsString>,
    layout: ProjectLayout,
}

impl EnsemblerCli {
    pub fn new(program: impl Into<OsString>, layout: ProjectLayout) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            layout,
        }
    }

    /// Arguments placed before the subcommand, e.g. `["run", "-n", "ensembler", "ensembler"]`
    /// for a program of `conda`.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    fn execute(&self, subcommand: &str, args: &[String]) -> Result<(), ToolkitError> {
        info!("Running toolkit command '{}'.", subcommand);
        debug!(
            program = ?self.program,
            leading_args = ?self.leading_args,
            ?args,
            cwd = ?self.layout.root(),
            "Spawning toolkit process."
        );

        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(subcommand)
            .args(args)
            .current_dir(self.layout.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    ToolkitError::ToolNotFound {
                        executable: self.program.to_string_lossy().into_owned(),
                    }
                } else {
                    ToolkitError::Io {
                        subcommand: subcommand.to_string(),
                        source: e,
                    }
                }
            })?;

        // Both pipes are drained concurrently.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout_lines, stderr_tail) = thread::scope(|scope| {
            let stderr_reader = scope.spawn(move || {
                stderr
                    .map(|pipe| read_tail(BufReader::new(pipe), STDERR_TAIL_LINES))
                    .unwrap_or_default()
            });
            let stdout_lines = stdout
                .map(|pipe| forward_lines(BufReader::new(pipe), subcommand))
                .unwrap_or(0);
            (stdout_lines, stderr_reader.join().unwrap_or_default())
        });

        let status = child.wait().map_err(|source| ToolkitError::Io {
            subcommand: subcommand.to_string(),
            source,
        })?;

        if !status.success() {
            return Err(ToolkitError::CommandFailed {
                subcommand: subcommand.to_string(),
                status: status.to_string(),
                stderr: stderr_tail,
            });
        }

        debug!(subcommand, stdout_lines, "Toolkit command finished.");
        Ok(())
    }
}

impl Toolkit for EnsemblerCli {
    fn init_project(&mut self) -> Result<(), ToolkitError> {
        self.execute("init", &[])
    }

    fn gather_targets(
        &mut self,
        query: &str,
        domain_regex: &str,
    ) -> Result<Vec<SequenceRecord>, ToolkitError> {
        self.execute(
            "gather_targets",
            &[
                "--query".to_string(),
                query.to_string(),
                "--uniprot_domain_regex".to_string(),
                domain_regex.to_string(),
            ],
        )?;

        let path = self.layout.targets_fasta();
        fasta::read_records_from_path(&path).map_err(|source| ToolkitError::Output { path, source })
    }

    fn gather_templates_from_pdb(
        &mut self,
        pdb_ids: &[String],
        domain_regex: Option<&str>,
        chain_ids: &ChainIds,
        structure_dirs: &[PathBuf],
    ) -> Result<(), ToolkitError> {
        let mut args = vec![
            "--gather_from".to_string(),
            "pdb".to_string(),
            "--query".to_string(),
            pdb_ids.join(","),
        ];
        push_domain_regex(&mut args, domain_regex);
        for (pdb_id, chains) in chain_ids {
            args.push("--chainids".to_string());
            args.push(format!("{}:{}", pdb_id, chains.join(",")));
        }
        push_structure_dirs(&mut args, structure_dirs);
        self.execute("gather_templates", &args)
    }

    fn gather_templates_from_uniprot(
        &mut self,
        query: &str,
        domain_regex: Option<&str>,
        structure_dirs: &[PathBuf],
    ) -> Result<(), ToolkitError> {
        let mut args = vec![
            "--gather_from".to_string(),
            "uniprot".to_string(),
            "--query".to_string(),
            query.to_string(),
        ];
        push_domain_regex(&mut args, domain_regex);
        push_structure_dirs(&mut args, structure_dirs);
        self.execute("gather_templates", &args)
    }

    fn model_template_loops(&mut self, template_ids: &[String]) -> Result<(), ToolkitError> {
        self.execute("loopmodel", &templates_args(template_ids))
    }

    fn align(
        &mut self,
        target_id: &str,
        template_ids: Option<&[String]>,
    ) -> Result<(), ToolkitError> {
        let mut args = targets_args(target_id);
        if let Some(ids) = template_ids {
            args.extend(templates_args(ids));
        }
        self.execute("align", &args)
    }

    fn build_models(
        &mut self,
        target_id: &str,
        template_ids: &[String],
    ) -> Result<(), ToolkitError> {
        self.execute("build_models", &target_and_templates(target_id, template_ids))
    }

    fn cluster_models(&mut self, target_id: &str) -> Result<(), ToolkitError> {
        self.execute("cluster", &targets_args(target_id))
    }

    fn refine_implicit(
        &mut self,
        target_id: &str,
        template_ids: &[String],
        sim_length: SimLength,
    ) -> Result<(), ToolkitError> {
        let mut args = target_and_templates(target_id, template_ids);
        push_sim_length(&mut args, sim_length);
        self.execute("refine_implicit", &args)
    }

    fn solvate_models(
        &mut self,
        target_id: &str,
        template_ids: &[String],
    ) -> Result<(), ToolkitError> {
        self.execute("solvate", &target_and_templates(target_id, template_ids))
    }

    fn determine_nwaters(
        &mut self,
        target_id: &str,
        template_ids: &[String],
    ) -> Result<(), ToolkitError> {
        self.execute(
            "determine_nwaters",
            &target_and_templates(target_id, template_ids),
        )
    }

    fn refine_explicit(
        &mut self,
        target_id: &str,
        template_ids: &[String],
        sim_length: SimLength,
    ) -> Result<(), ToolkitError> {
        let mut args = target_and_templates(target_id, template_ids);
        push_sim_length(&mut args, sim_length);
        self.execute("refine_explicit", &args)
    }

    fn package_for_fah(&mut self, target_id: &str, nclones: u32) -> Result<(), ToolkitError> {
        let mut args = vec!["--package_for".to_string(), "FAH".to_string()];
        args.extend(targets_args(target_id));
        args.push("--nFAHclones".to_string());
        args.push(nclones.to_string());
        self.execute("package_models", &args)
    }
}

fn targets_args(target_id: &str) -> Vec<String> {
    vec!["--targets".to_string(), target_id.to_string()]
}

fn templates_args(template_ids: &[String]) -> Vec<String> {
    vec!["--templates".to_string(), template_ids.join(",")]
}

fn target_and_templates(target_id: &str, template_ids: &[String]) -> Vec<String> {
    let mut args = targets_args(target_id);
    args.extend(templates_args(template_ids));
    args
}

fn push_domain_regex(args: &mut Vec<String>, domain_regex: Option<&str>) {
    if let Some(regex) = domain_regex {
        args.push("--uniprot_domain_regex".to_string());
        args.push(regex.to_string());
    }
}

fn push_structure_dirs(args: &mut Vec<String>, structure_dirs: &[PathBuf]) {
    if structure_dirs.is_empty() {
        return;
    }
    let joined = structure_dirs
        .iter()
        .map(|d| d.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(",");
    args.push("--structure_paths".to_string());
    args.push(joined);
}

fn push_sim_length(args: &mut Vec<String>, sim_length: SimLength) {
    args.push("--simlength".to_string());
    args.push(sim_length.picoseconds().to_string());
}

/// Sends each output line to the log as it arrives and returns how many there were.
fn forward_lines(reader: impl BufRead, subcommand: &str) -> usize {
    let mut count = 0;
    for line in reader.lines().map_while(Result::ok) {
        debug!(subcommand, "{}", line);
        count += 1;
    }
    count
}

/// Reads to the end, keeping only the last `max_lines` lines.
fn read_tail(reader: impl BufRead, max_lines: usize) -> String {
    let mut tail = VecDeque::with_capacity(max_lines + 1);
    for line in reader.lines().map_while(Result::ok) {
        trace!("toolkit stderr: {}", line);
        tail.push_back(line);
        if tail.len() > max_lines {
            tail.pop_front();
        }
    }
    Vec::from(tail).join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::{TempDir, tempdir};

    /// A toolkit whose program is `sh` running a script that appends its arguments to
    /// `calls.log` in the project root.
    fn scripted_toolkit(script_body: &str) -> (TempDir, EnsemblerCli) {
        let dir = tempdir().unwrap();
        let script = dir.path().join("fake-ensembler.sh");
        fs::write(
            &script,
            format!("echo \"$@\" >> calls.log\n{}\n", script_body),
        )
        .unwrap();
        let toolkit = EnsemblerCli::new("sh", ProjectLayout::new(dir.path()))
            .with_leading_args([script.into_os_string()]);
        (dir, toolkit)
    }

    fn logged_calls(dir: &TempDir) -> Vec<String> {
        fs::read_to_string(dir.path().join("calls.log"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn read_tail_keeps_last_lines() {
        assert_eq!(read_tail(Cursor::new("a\nb\nc\n"), 2), "b\nc");
        assert_eq!(read_tail(Cursor::new("only"), 5), "only");
        assert_eq!(read_tail(Cursor::new(""), 5), "");
    }

    #[test]
    fn forward_lines_counts_streamed_output() {
        assert_eq!(forward_lines(Cursor::new("step 1\nstep 2\n"), "solvate"), 2);
    }

    #[cfg(unix)]
    #[test]
    fn modeling_commands_pass_targets_templates_and_sim_length() {
        let (dir, mut toolkit) = scripted_toolkit("exit 0");
        let templates = ids(&["T1", "T2"]);
        let length: SimLength = "1ns".parse().unwrap();

        toolkit.model_template_loops(&templates).unwrap();
        toolkit.align("TGT", Some(&templates)).unwrap();
        toolkit.align("TGT", None).unwrap();
        toolkit.refine_implicit("TGT", &templates, length).unwrap();
        toolkit.package_for_fah("TGT", 3).unwrap();

        assert_eq!(
            logged_calls(&dir),
            vec![
                "loopmodel --templates T1,T2",
                "align --targets TGT --templates T1,T2",
                "align --targets TGT",
                "refine_implicit --targets TGT --templates T1,T2 --simlength 1000",
                "package_models --package_for FAH --targets TGT --nFAHclones 3",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn pdb_template_gathering_passes_chain_ids_and_structure_dirs() {
        let (dir, mut toolkit) = scripted_toolkit("exit 0");
        let mut chain_ids = ChainIds::new();
        chain_ids.insert("2H8H".to_string(), ids(&["A", "B"]));

        toolkit
            .gather_templates_from_pdb(
                &ids(&["2H8H", "2HCK"]),
                Some("^Protein kinase"),
                &chain_ids,
                &[PathBuf::from("/data/pdb"), PathBuf::from("/data/sifts")],
            )
            .unwrap();

        assert_eq!(
            logged_calls(&dir),
            vec![
                "gather_templates --gather_from pdb --query 2H8H,2HCK --uniprot_domain_regex ^Protein kinase --chainids 2H8H:A,B --structure_paths /data/pdb,/data/sifts"
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn gather_targets_reads_the_targets_fasta() {
        let (_dir, mut toolkit) = scripted_toolkit(
            "mkdir -p targets && printf '>ABL1_HUMAN_D0\\nMLEICLK\\n>ABL1_HUMAN_D1\\nGGG\\n' > targets/targets.fa",
        );

        let targets = toolkit
            .gather_targets("mnemonic:ABL1_HUMAN", "^Protein kinase")
            .unwrap();

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].id, "ABL1_HUMAN_D0");
        assert_eq!(targets[0].sequence, "MLEICLK");
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_reports_status_and_stderr() {
        let (_dir, mut toolkit) = scripted_toolkit("echo 'MODELLER license missing' >&2\nexit 3");

        let err = toolkit.build_models("TGT", &ids(&["T1"])).unwrap_err();
        match err {
            ToolkitError::CommandFailed {
                subcommand,
                status,
                stderr,
            } => {
                assert_eq!(subcommand, "build_models");
                assert!(status.contains('3'));
                assert_eq!(stderr, "MODELLER license missing");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn long_output_on_both_streams_is_drained_and_stderr_is_truncated() {
        let (_dir, mut toolkit) = scripted_toolkit(
            "i=0\nwhile [ $i -lt 20000 ]; do echo \"out $i\"; echo \"err $i\" >&2; i=$((i+1)); done\nexit 4",
        );

        let err = toolkit.solvate_models("TGT", &ids(&["T1"])).unwrap_err();
        match err {
            ToolkitError::CommandFailed { stderr, .. } => {
                let lines: Vec<&str> = stderr.lines().collect();
                assert_eq!(lines.len(), STDERR_TAIL_LINES);
                assert_eq!(lines.first(), Some(&"err 19980"));
                assert_eq!(lines.last(), Some(&"err 19999"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn missing_program_is_reported_as_tool_not_found() {
        let dir = tempdir().unwrap();
        let mut toolkit = EnsemblerCli::new(
            "quickmodel-test-no-such-program",
            ProjectLayout::new(dir.path()),
        );

        let err = toolkit.cluster_models("TGT").unwrap_err();
        assert!(matches!(err, ToolkitError::ToolNotFound { executable } if executable == "quickmodel-test-no-such-program"));
    }
}
