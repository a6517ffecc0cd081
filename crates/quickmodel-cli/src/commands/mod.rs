pub mod histogram;
pub mod init;
pub mod run;

use crate::error::{CliError, Result};
use quickmodel::core::project::ProjectLayout;
use quickmodel::engine::ensembler::EnsemblerCli;

/// Builds the toolkit runner for an executable setting such as `ensembler` or
/// `conda run -n ensembler ensembler`. Words after the first become leading arguments.
fn ensembler_for(executable: &str, layout: ProjectLayout) -> Result<EnsemblerCli> {
    let mut words = executable.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| CliError::Config("The toolkit executable cannot be empty".to_string()))?;
    Ok(EnsemblerCli::new(program, layout).with_leading_args(words))
}
