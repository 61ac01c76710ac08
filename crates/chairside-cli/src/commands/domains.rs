//! Domains command implementation.

use crate::error::Result;
use crate::output::Formatter;
use chairside_presets::Domain;

/// Execute the domains command.
pub fn execute_domains(formatter: &Formatter) -> Result<()> {
    let mut rows = Vec::with_capacity(Domain::ALL.len());
    for domain in Domain::ALL {
        let rules = domain.rule_set()?;
        rows.push((
            domain.as_str().to_string(),
            rules.description().to_string(),
            rules.rules().len(),
        ));
    }
    println!("{}", formatter.format_domains(&rows)?);
    Ok(())
}
