//! Evaluate command implementation.

use super::{apply_sets, load_rules, read_case, read_external};
use crate::cli::EvaluateArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use chairside_engine::Evaluator;
use tracing::info;

/// Execute the evaluate command.
pub fn execute_evaluate(args: EvaluateArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let rules = load_rules(&args.source, config)?;
    let evaluator = Evaluator::new(rules);

    let mut case = read_case(args.case.as_deref())?;
    apply_sets(&mut case, &args.set)?;

    let unused = evaluator.unused_fields(&case);
    if !unused.is_empty() {
        eprintln!(
            "{}",
            formatter.warning(&format!("Ignoring fields no rule reads: {}", unused.join(", ")))
        );
    }

    match args.external {
        Some(path) => {
            let outcome = read_external(&path);
            let decision = evaluator.evaluate_with_external(&case, outcome)?;
            info!(authority = %decision.authority, tier = %decision.final_result().final_tier, "Case evaluated");
            println!("{}", formatter.format_decision(&decision)?);
        }
        None => {
            let assessment = evaluator.evaluate(&case)?;
            info!(tier = %assessment.result.final_tier, "Case evaluated");
            println!("{}", formatter.format_assessment(&assessment)?);
        }
    }

    Ok(())
}
