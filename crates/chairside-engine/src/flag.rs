//! Flag classification of boolean and categorical inputs
//!
//! Presence flags treat an unset field as absent. Categorical flags treat
//! an unset field as their default category, or as insufficient data when
//! they have none, and reject any value their rule does not map.

use crate::error::EngineError;
use crate::range::format_value;
use chairside_domain::{ClassificationResult, FlagKind, FlagRule, InputValue, Outcome, SignalStatus};

/// Classify one flag input against its rule
pub fn classify(value: Option<&InputValue>, rule: &FlagRule) -> Result<ClassificationResult, EngineError> {
    match rule.kind() {
        FlagKind::Presence { present, absent } => {
            let is_present = match value {
                None | Some(InputValue::Missing) => false,
                Some(InputValue::Bool(b)) => *b,
                Some(InputValue::Number(n)) if *n == 1.0 => true,
                Some(InputValue::Number(n)) if *n == 0.0 => false,
                Some(InputValue::Number(n)) => return Err(unmapped(rule, format_value(*n))),
                Some(InputValue::Text(text)) => match presence_word(text) {
                    Some(b) => b,
                    None => return Err(unmapped(rule, text.trim().to_string())),
                },
            };
            let (outcome, state) = if is_present {
                (present, "present")
            } else {
                (absent, "not reported")
            };
            Ok(from_outcome(rule, outcome, state))
        }
        FlagKind::Categorical { .. } => {
            let text = match value {
                None | Some(InputValue::Missing) => None,
                Some(InputValue::Text(text)) if text.trim().is_empty() => None,
                Some(InputValue::Text(text)) => Some(text.trim().to_string()),
                Some(InputValue::Number(n)) => Some(format_value(*n)),
                Some(InputValue::Bool(true)) => Some("yes".to_string()),
                Some(InputValue::Bool(false)) => Some("no".to_string()),
            };
            let (category, assumed) = match text {
                Some(text) => (rule.category(&text).ok_or_else(|| unmapped(rule, text.clone()))?, false),
                None => match rule.default_category() {
                    Some(category) => (category, true),
                    None => {
                        return Ok(ClassificationResult::insufficient_data(
                            rule.key(),
                            rule.name(),
                            format!("Insufficient data: {} not recorded", rule.name()),
                        ))
                    }
                },
            };
            let value = if assumed {
                format!("{} (not recorded, assumed)", category.value)
            } else {
                category.value.clone()
            };
            let rationale = match &category.detail {
                Some(detail) => format!("{}: {}. {}", rule.name(), value, detail),
                None => format!("{}: {}", rule.name(), value),
            };
            Ok(ClassificationResult {
                source: rule.key().to_string(),
                name: rule.name().to_string(),
                label: category.label.clone(),
                tier: category.tier,
                margin: None,
                rationale,
                status: SignalStatus::Assessed,
            })
        }
    }
}

fn from_outcome(rule: &FlagRule, outcome: &Outcome, state: &str) -> ClassificationResult {
    let rationale = match &outcome.detail {
        Some(detail) => format!("{}: {}. {}", rule.name(), state, detail),
        None => format!("{}: {}", rule.name(), state),
    };
    ClassificationResult {
        source: rule.key().to_string(),
        name: rule.name().to_string(),
        label: outcome.label.clone(),
        tier: outcome.tier,
        margin: None,
        rationale,
        status: SignalStatus::Assessed,
    }
}

fn presence_word(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" | "present" => Some(true),
        "no" | "n" | "false" | "0" | "absent" | "" => Some(false),
        _ => None,
    }
}

fn unmapped(rule: &FlagRule, value: String) -> EngineError {
    EngineError::UnmappedCategory {
        rule: rule.key().to_string(),
        value,
    }
}
