use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Step between the cutoffs listed by [`SeqIdTable::histogram`].
pub const HISTOGRAM_STEP: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SeqIdEntry {
    pub template_id: String,
    /// Sequence identity with the target, in percent.
    pub seqid: f64,
}

#[derive(Debug, Error)]
pub enum SeqIdParseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: SeqIdParseErrorKind,
    },
}

#[derive(Debug, Error)]
pub enum SeqIdParseErrorKind {
    #[error("expected 'TEMPLATE_ID SEQID' but found {found} column(s)")]
    MissingColumn { found: usize },
    #[error("invalid sequence identity value '{value}'")]
    InvalidSeqId { value: String },
}

/// Template sequence identities for one target, in report order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeqIdTable {
    entries: Vec<SeqIdEntry>,
}

impl SeqIdTable {
    pub fn new(entries: Vec<SeqIdEntry>) -> Self {
        Self { entries }
    }

    /// Parses a whitespace-delimited `TEMPLATE_ID SEQID` report. Blank lines are skipped and
    /// columns after the second are ignored.
    pub fn read_from(reader: impl BufRead) -> Result<Self, SeqIdParseError> {
        let mut entries = Vec::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let mut columns = line.split_whitespace();
            let Some(template_id) = columns.next() else {
                continue;
            };
            let value = columns.next().ok_or(SeqIdParseError::Parse {
                line: line_num + 1,
                kind: SeqIdParseErrorKind::MissingColumn { found: 1 },
            })?;
            let seqid = value.parse::<f64>().map_err(|_| SeqIdParseError::Parse {
                line: line_num + 1,
                kind: SeqIdParseErrorKind::InvalidSeqId {
                    value: value.to_string(),
                },
            })?;

            entries.push(SeqIdEntry {
                template_id: template_id.to_string(),
                seqid,
            });
        }

        Ok(Self { entries })
    }

    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self, SeqIdParseError> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    pub fn entries(&self) -> &[SeqIdEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of templates whose identity is strictly above `cutoff`.
    pub fn count_above(&self, cutoff: f64) -> usize {
        self.entries.iter().filter(|e| e.seqid > cutoff).count()
    }

    /// Ids of the templates whose identity is strictly above `cutoff`, in report order.
    pub fn select_above(&self, cutoff: f64) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.seqid > cutoff)
            .map(|e| e.template_id.clone())
            .collect()
    }

    /// `(cutoff, count_above(cutoff))` for cutoffs 0, 10, ..., 100.
    pub fn histogram(&self) -> Vec<(u32, usize)> {
        (0..=100)
            .step_by(HISTOGRAM_STEP as usize)
            .map(|cutoff| (cutoff, self.count_above(f64::from(cutoff))))
            .collect()
    }
}
