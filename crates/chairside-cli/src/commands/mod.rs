//! Command implementations.

pub mod check;
pub mod domains;
pub mod evaluate;
pub mod rules;

pub use self::check::execute_check;
pub use self::domains::execute_domains;
pub use self::evaluate::execute_evaluate;
pub use self::rules::execute_rules;

use crate::cli::RuleSourceArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use chairside_domain::{CaseInput, InputValue};
use chairside_engine::{ExternalOutcome, RuleSet};
use chairside_presets::Domain;
use std::fs;
use std::io::Read;
use tracing::debug;

/// Load the rule set named on the command line, or the configured default domain.
pub fn load_rules(source: &RuleSourceArgs, config: &Config) -> Result<RuleSet> {
    if let Some(path) = &source.rules {
        debug!(path = %path, "Loading rule file");
        return Ok(RuleSet::from_file(path)?);
    }
    let name = source
        .domain
        .as_deref()
        .unwrap_or(&config.settings.default_domain);
    let domain: Domain = name.parse()?;
    debug!(domain = %domain, "Loading built-in rules");
    Ok(domain.rule_set()?)
}

/// Read a case from a JSON file, from stdin for `-`, or start empty.
pub fn read_case(path: Option<&str>) -> Result<CaseInput> {
    let contents = match path {
        None => return Ok(CaseInput::new()),
        Some("-") => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        Some(path) => fs::read_to_string(path)?,
    };
    parse_case(&contents)
}

/// Parse case JSON; the top level must be an object of field values.
pub fn parse_case(contents: &str) -> Result<CaseInput> {
    let value: serde_json::Value = serde_json::from_str(contents)?;
    if !value.is_object() {
        return Err(CliError::InvalidInput(
            "Case must be a JSON object of field values".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

/// Apply `KEY=VALUE` overrides to a case.
pub fn apply_sets(case: &mut CaseInput, sets: &[String]) -> Result<()> {
    for assignment in sets {
        let (key, value) = parse_assignment(assignment)?;
        case.set(key, value);
    }
    Ok(())
}

/// Split a `KEY=VALUE` assignment; the value is parsed loosely.
pub fn parse_assignment(assignment: &str) -> Result<(String, InputValue)> {
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| CliError::InvalidInput(format!("Expected KEY=VALUE, got '{}'", assignment)))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::InvalidInput(format!("Missing key in '{}'", assignment)));
    }
    Ok((key.to_string(), InputValue::parse_loose(value)))
}

/// Read an external assessment; read failures become a failed outcome.
pub fn read_external(path: &str) -> ExternalOutcome {
    match fs::read_to_string(path) {
        Ok(contents) => ExternalOutcome::from_json_str(&contents),
        Err(e) => ExternalOutcome::Failed(format!("{}: {}", path, e)),
    }
}
