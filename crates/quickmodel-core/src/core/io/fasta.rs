use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub id: String,
    pub sequence: String,
}

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: sequence data found before any '>' header")]
    SequenceBeforeHeader { line: usize },
    #[error("Parse error on line {line}: header has no identifier")]
    EmptyHeader { line: usize },
}

/// Reads every record of a FASTA stream.
///
/// The record id is the first whitespace-separated word of the header; the rest of the header
/// is dropped. Sequence lines are concatenated with surrounding whitespace removed.
pub fn read_records(reader: impl BufRead) -> Result<Vec<SequenceRecord>, FastaError> {
    let mut records: Vec<SequenceRecord> = Vec::new();

    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(header) = trimmed.strip_prefix('>') {
            let id = header
                .split_whitespace()
                .next()
                .ok_or(FastaError::EmptyHeader { line: line_num + 1 })?;
            records.push(SequenceRecord {
                id: id.to_string(),
                sequence: String::new(),
            });
        } else {
            let record = records
                .last_mut()
                .ok_or(FastaError::SequenceBeforeHeader { line: line_num + 1 })?;
            record.sequence.push_str(trimmed);
        }
    }

    Ok(records)
}

pub fn read_records_from_path(path: impl AsRef<Path>) -> Result<Vec<SequenceRecord>, FastaError> {
    let file = File::open(path)?;
    read_records(BufReader::new(file))
}
