//! Schemas command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the schemas command.
pub async fn execute_schemas(config: &Config, formatter: &Formatter) -> Result<()> {
    let registry = config.registry()?;
    println!("{}", formatter.format_schemas(&registry)?);
    Ok(())
}
