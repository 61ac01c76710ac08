//! Rules command implementation.

use super::load_rules;
use crate::cli::RulesArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the rules command.
pub fn execute_rules(args: RulesArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let rules = load_rules(&args.source, config)?;
    println!("{}", formatter.format_rules(&rules)?);
    Ok(())
}
