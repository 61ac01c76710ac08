//! Rule sets: one domain's rules, safety triggers and action templates
//!
//! A rule set is written as TOML:
//!
//! ```toml
//! domain = "chairside"
//! safety_triggers = ["pain_score"]
//!
//! [actions]
//! critical = ["Refer for urgent triage"]
//!
//! [[rule]]
//! kind = "range"
//! key = "pain_score"
//! name = "Pain score"
//!
//! [[rule.bands]]
//! lower = 0.0
//! upper = 3.0
//! tier = "normal"
//! label = "Pain controlled"
//! ```

use crate::error::EngineError;
use crate::explain::ActionTemplates;
use chairside_domain::{ConfigurationError, Rule, RuleSpec, Tier};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Unvalidated rule set, as written in a rule file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetSpec {
    /// Domain name (e.g. "endodontic")
    pub domain: String,
    /// One-line description
    #[serde(default)]
    pub description: String,
    /// Rule keys whose Critical results are never downgraded externally
    #[serde(default)]
    pub safety_triggers: Vec<String>,
    /// Recommended actions per tier
    #[serde(default)]
    pub actions: ActionTemplates,
    /// Rules in declaration order
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleSpec>,
}

/// A validated rule set
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    domain: String,
    description: String,
    rules: Vec<Rule>,
    safety_triggers: Vec<String>,
    actions: ActionTemplates,
}

impl RuleSet {
    /// Validate a spec into a rule set
    pub fn new(spec: RuleSetSpec) -> Result<Self, ConfigurationError> {
        let rules = spec
            .rules
            .into_iter()
            .map(Rule::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        if rules.is_empty() {
            return Err(ConfigurationError::EmptyRuleSet { domain: spec.domain });
        }

        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.key()) {
                return Err(ConfigurationError::DuplicateRule {
                    domain: spec.domain,
                    rule: rule.key().to_string(),
                });
            }
        }

        for trigger in &spec.safety_triggers {
            let Some(rule) = rules.iter().find(|r| r.key() == trigger) else {
                return Err(ConfigurationError::UnknownTrigger {
                    domain: spec.domain,
                    rule: trigger.clone(),
                });
            };
            if rule.max_tier() != Tier::Critical {
                return Err(ConfigurationError::TriggerNeverCritical { rule: trigger.clone() });
            }
        }

        spec.actions.validate()?;

        Ok(Self {
            domain: spec.domain,
            description: spec.description,
            rules,
            safety_triggers: spec.safety_triggers,
            actions: spec.actions,
        })
    }

    /// Parse and validate a TOML rule set
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        let spec: RuleSetSpec = toml::from_str(text)?;
        Ok(Self::new(spec)?)
    }

    /// Load and validate a TOML rule file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        debug!("Loading rule set from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Domain name
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// One-line description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Rules in declaration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Find a rule by key
    pub fn rule(&self, key: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.key() == key)
    }

    /// Hard safety trigger rule keys
    pub fn safety_triggers(&self) -> &[String] {
        &self.safety_triggers
    }

    /// Whether a rule is a hard safety trigger
    pub fn is_safety_trigger(&self, key: &str) -> bool {
        self.safety_triggers.iter().any(|t| t == key)
    }

    /// Recommended actions per tier
    pub fn actions(&self) -> &ActionTemplates {
        &self.actions
    }

    /// Input fields read by at least one rule
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for rule in &self.rules {
            let keys = match rule {
                Rule::Range(r) => r.source().fields().into_iter().map(str::to_string).collect(),
                Rule::Flag(f) => vec![f.key().to_string()],
            };
            for key in keys {
                if !fields.contains(&key) {
                    fields.push(key);
                }
            }
        }
        fields
    }
}
