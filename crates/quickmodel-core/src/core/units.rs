use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const FS_PER_PS: f64 = 1.0e3;
const PS_PER_NS: f64 = 1.0e3;
const PS_PER_US: f64 = 1.0e6;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum SimLengthError {
    #[error("Simulation length '{0}' is empty")]
    Empty(String),
    #[error("Invalid number in simulation length '{0}'")]
    InvalidNumber(String),
    #[error("Unknown time unit '{unit}' in '{input}'. Expected one of fs, ps, ns, us")]
    UnknownUnit { input: String, unit: String },
    #[error("Simulation length must be finite and greater than zero (got {0} ps)")]
    NotPositive(f64),
}

/// Length of an MD refinement run, stored in picoseconds.
///
/// Parses from strings such as `"100ps"`, `"1 ns"` or `"500fs"`; a bare number is read as
/// picoseconds. Deserializes from either a string or a number.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize)]
#[serde(try_from = "RawSimLength")]
pub struct SimLength {
    picoseconds: f64,
}

impl SimLength {
    pub fn from_picoseconds(picoseconds: f64) -> Result<Self, SimLengthError> {
        if !picoseconds.is_finite() || picoseconds <= 0.0 {
            return Err(SimLengthError::NotPositive(picoseconds));
        }
        Ok(Self { picoseconds })
    }

    pub fn picoseconds(&self) -> f64 {
        self.picoseconds
    }
}

impl Default for SimLength {
    fn default() -> Self {
        Self {
            picoseconds: 100.0,
        }
    }
}

impl fmt::Display for SimLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ps", self.picoseconds)
    }
}

impl FromStr for SimLength {
    type Err = SimLengthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SimLengthError::Empty(s.to_string()));
        }

        let split_at = trimmed.trim_end_matches(char::is_alphabetic).len();
        let (number, unit) = trimmed.split_at(split_at);
        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| SimLengthError::InvalidNumber(s.to_string()))?;

        let picoseconds = match unit {
            "" | "ps" => value,
            "fs" => value / FS_PER_PS,
            "ns" => value * PS_PER_NS,
            "us" | "µs" => value * PS_PER_US,
            other => {
                return Err(SimLengthError::UnknownUnit {
                    input: s.to_string(),
                    unit: other.to_string(),
                });
            }
        };

        Self::from_picoseconds(picoseconds)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSimLength {
    Picoseconds(f64),
    Text(String),
}

impl TryFrom<RawSimLength> for SimLength {
    type Error = SimLengthError;

    fn try_from(raw: RawSimLength) -> Result<Self, Self::Error> {
        match raw {
            RawSimLength::Picoseconds(ps) => Self::from_picoseconds(ps),
            RawSimLength::Text(text) => text.parse(),
        }
    }
}
