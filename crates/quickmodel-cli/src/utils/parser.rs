use quickmodel::engine::config::ChainIds;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid chain mapping '{0}'. Expected 'PDBID:CHAINS' (e.g., '2H8H:A,B').")]
    InvalidChainSpec(String),

    #[error("Component '{component}' cannot be empty in chain mapping '{spec}'.")]
    EmptyComponent {
        component: &'static str,
        spec: String,
    },

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidSetValue(String),

    #[error("Invalid boolean '{0}'. Expected true/false, yes/no or 1/0.")]
    InvalidBool(String),
}

/// Parses a `PDBID:A,B` chain mapping into the PDB id and its chain ids.
pub fn parse_chain_spec(spec: &str) -> Result<(String, Vec<String>), ParseError> {
    let (pdb_id, chains) = spec
        .split_once(':')
        .ok_or_else(|| ParseError::InvalidChainSpec(spec.to_string()))?;

    let pdb_id = pdb_id.trim();
    if pdb_id.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "PDB id",
            spec: spec.to_string(),
        });
    }

    let chains: Vec<String> = chains
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if chains.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "chains",
            spec: spec.to_string(),
        });
    }

    Ok((pdb_id.to_string(), chains))
}

/// Folds a list of chain mappings into `ChainIds`. A repeated PDB id replaces the earlier one.
pub fn parse_chain_specs<S: AsRef<str>>(specs: &[S]) -> Result<ChainIds, ParseError> {
    let mut chain_ids = ChainIds::new();
    for spec in specs {
        let (pdb_id, chains) = parse_chain_spec(spec.as_ref())?;
        chain_ids.insert(pdb_id, chains);
    }
    Ok(chain_ids)
}

pub fn parse_key_value(pair: &str) -> Result<(&str, &str), ParseError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidSetValue(pair.to_string())),
    }
}

pub fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ParseError::InvalidBool(value.to_string())),
    }
}
