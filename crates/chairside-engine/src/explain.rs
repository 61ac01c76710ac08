//! Explanation of aggregate results
//!
//! Pure formatting: every tier decision has already been made upstream.

use chairside_domain::{AggregateResult, ClassificationResult, ConfigurationError, Explanation, Tier};
use serde::{Deserialize, Serialize};

/// Recommended actions per final tier
///
/// The three lists must be disjoint so each tier reads differently.
/// Missing lists in a rule file fall back to the generic defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTemplates {
    /// Actions when every signal is Normal
    #[serde(default = "default_normal")]
    pub normal: Vec<String>,
    /// Actions when the case is Borderline
    #[serde(default = "default_borderline")]
    pub borderline: Vec<String>,
    /// Actions when the case is Critical
    #[serde(default = "default_critical")]
    pub critical: Vec<String>,
}

fn default_normal() -> Vec<String> {
    vec![
        "Continue routine care".to_string(),
        "Reassess at the next scheduled visit".to_string(),
    ]
}

fn default_borderline() -> Vec<String> {
    vec![
        "Review the flagged findings before proceeding".to_string(),
        "Schedule a follow-up assessment".to_string(),
    ]
}

fn default_critical() -> Vec<String> {
    vec![
        "Escalate for urgent clinical review".to_string(),
        "Do not proceed until the critical findings are addressed".to_string(),
    ]
}

impl Default for ActionTemplates {
    fn default() -> Self {
        Self {
            normal: default_normal(),
            borderline: default_borderline(),
            critical: default_critical(),
        }
    }
}

impl ActionTemplates {
    /// Actions for a final tier
    pub fn for_tier(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Normal => &self.normal,
            Tier::Borderline => &self.borderline,
            Tier::Critical => &self.critical,
        }
    }

    /// Check that no action appears under two tiers
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (i, first) in Tier::ALL.iter().enumerate() {
            for second in &Tier::ALL[i + 1..] {
                let shared = self
                    .for_tier(*first)
                    .iter()
                    .find(|a| self.for_tier(*second).iter().any(|b| b.trim().eq_ignore_ascii_case(a.trim())));
                if let Some(action) = shared {
                    return Err(ConfigurationError::OverlappingActions {
                        action: action.clone(),
                        first: *first,
                        second: *second,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Formats aggregate results into summary lines and actions
#[derive(Debug, Clone, Default)]
pub struct ExplanationBuilder {
    templates: ActionTemplates,
}

impl ExplanationBuilder {
    /// Create a builder with the given action templates
    pub fn new(templates: ActionTemplates) -> Self {
        Self { templates }
    }

    /// The action templates in use
    pub fn templates(&self) -> &ActionTemplates {
        &self.templates
    }

    /// Explain an aggregate result
    ///
    /// The summary starts with the overall status, then one line per
    /// contributing result naming the rule and its rationale, then any
    /// flagged results below the final tier.
    pub fn explain(&self, result: &AggregateResult) -> Explanation {
        let mut summary = Vec::with_capacity(result.contributing.len() + 1);
        summary.push(format!(
            "Overall status: {} ({} of {} signals at this tier)",
            result.final_tier,
            result.contributing.len(),
            result.signal_count(),
        ));
        summary.extend(result.contributing.iter().map(finding_line));
        summary.extend(result.secondary().map(|r| format!("Also noted: {}", finding_line(r))));

        let mut actions = self.templates.for_tier(result.final_tier).to_vec();
        let missing: Vec<&str> = result.insufficient().map(|r| r.name.as_str()).collect();
        if !missing.is_empty() {
            actions.push(format!("Record missing data: {}", missing.join(", ")));
        }

        Explanation { summary, actions }
    }
}

fn finding_line(result: &ClassificationResult) -> String {
    if result.label == result.name {
        format!("{}: {}", result.label, result.rationale)
    } else {
        format!("{} ({}): {}", result.label, result.name, result.rationale)
    }
}
