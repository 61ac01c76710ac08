//! Check command implementation.

use crate::cli::CheckArgs;
use crate::error::Result;
use crate::output::Formatter;
use chairside_engine::RuleSet;

/// Execute the check command.
///
/// A rule file that fails validation is reported as an error, so the
/// process exits non-zero.
pub fn execute_check(args: CheckArgs, formatter: &Formatter) -> Result<()> {
    let rules = RuleSet::from_file(&args.file)?;
    println!(
        "{}",
        formatter.success(&format!(
            "{}: {} rules for domain '{}'",
            args.file,
            rules.rules().len(),
            rules.domain()
        ))
    );
    Ok(())
}
