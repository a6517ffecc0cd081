use super::config::ConfigError;
use super::error::EngineError;
use crate::core::io::seqid::SeqIdTable;
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

/// Decides the sequence identity cutoff when a run was not given one.
pub trait ThresholdChooser {
    fn choose_cutoff(&mut self, target_id: &str, table: &SeqIdTable) -> Result<f64, EngineError>;
}

/// Writes one `Number of templates with seqid > N: count` line per histogram step.
pub fn write_histogram(table: &SeqIdTable, out: &mut impl Write) -> io::Result<()> {
    for (cutoff, count) in table.histogram() {
        writeln!(out, "Number of templates with seqid > {}: {}", cutoff, count)?;
    }
    Ok(())
}

/// Picks the templates whose sequence identity is strictly above the cutoff.
///
/// With no `cutoff`, the `chooser` is asked for one. The returned ids keep the table's order.
pub fn select_templates<C: ThresholdChooser + ?Sized>(
    target_id: &str,
    table: &SeqIdTable,
    cutoff: Option<f64>,
    chooser: &mut C,
) -> Result<Vec<String>, EngineError> {
    let cutoff = match cutoff {
        Some(c) => c,
        None => chooser.choose_cutoff(target_id, table)?,
    };
    let selected = table.select_above(cutoff);
    info!(
        target_id,
        cutoff,
        selected = selected.len(),
        total = table.len(),
        "Selected templates by sequence identity."
    );
    Ok(selected)
}

/// Prints the cutoff histogram and asks on the console until a cutoff is confirmed.
pub struct ConsoleChooser<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleChooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn prompt(&mut self, question: &str) -> Result<String, EngineError> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Err(EngineError::Selection(
                "input ended before a sequence identity cutoff was confirmed".to_string(),
            ));
        }
        Ok(answer.trim().to_string())
    }
}

impl<R: BufRead, W: Write> ThresholdChooser for ConsoleChooser<R, W> {
    fn choose_cutoff(&mut self, target_id: &str, table: &SeqIdTable) -> Result<f64, EngineError> {
        write_histogram(table, &mut self.output)?;

        loop {
            let answer = self.prompt(&format!(
                "Choose a sequence identity cutoff for target {} (confirm at next step): ",
                target_id
            ))?;
            let cutoff = match answer.parse::<f64>() {
                Ok(value) if value.is_finite() => value,
                _ => {
                    writeln!(self.output, "'{}' is not a valid cutoff.", answer)?;
                    continue;
                }
            };

            writeln!(
                self.output,
                "Number of templates chosen by sequence identity cutoff ({:.1}): {}",
                cutoff,
                table.count_above(cutoff)
            )?;

            let confirm = self.prompt("Use this sequence identity cutoff? (y|N): ")?;
            if matches!(confirm.to_lowercase().as_str(), "y" | "yes") {
                debug!(cutoff, "Sequence identity cutoff confirmed.");
                return Ok(cutoff);
            }
        }
    }
}

/// A chooser for runs without a terminal: a missing cutoff is a configuration error.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessChooser;

impl ThresholdChooser for HeadlessChooser {
    fn choose_cutoff(&mut self, _target_id: &str, _table: &SeqIdTable) -> Result<f64, EngineError> {
        Err(ConfigError::MissingSeqidCutoff.into())
    }
}
