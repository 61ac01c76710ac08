//! Rule configuration errors

use crate::Tier;
use thiserror::Error;

/// A rule table that cannot be loaded
///
/// These are programming errors in a domain's rule configuration and are
/// reported when the rule is built, never during evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Rule key is empty
    #[error("Rule key must not be empty")]
    EmptyKey,

    /// A range rule without exactly one Normal band
    #[error("Rule '{rule}' must have exactly one normal (ideal) band, found {found}")]
    IdealBandCount {
        /// Rule key
        rule: String,
        /// Number of Normal bands found
        found: usize,
    },

    /// Band bound is NaN or infinite
    #[error("Rule '{rule}' band '{label}' has a non-finite bound")]
    NonFiniteBound {
        /// Rule key
        rule: String,
        /// Band label
        label: String,
    },

    /// Band lower bound is not below its upper bound
    #[error("Rule '{rule}' band '{label}' is empty or inverted ({lower} >= {upper})")]
    EmptyBand {
        /// Rule key
        rule: String,
        /// Band label
        label: String,
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },

    /// An interior band is unbounded
    #[error("Rule '{rule}' band '{label}' is unbounded but is not an outermost band")]
    UnboundedInteriorBand {
        /// Rule key
        rule: String,
        /// Band label
        label: String,
    },

    /// Two adjacent bands leave a gap
    #[error("Rule '{rule}' has a gap between {from} and {to}")]
    Gap {
        /// Rule key
        rule: String,
        /// Upper edge of the lower band
        from: f64,
        /// Lower edge of the upper band
        to: f64,
    },

    /// Two adjacent bands overlap
    #[error("Rule '{rule}' has overlapping bands between {from} and {to}")]
    Overlap {
        /// Rule key
        rule: String,
        /// Lower edge of the upper band
        from: f64,
        /// Upper edge of the lower band
        to: f64,
    },

    /// More than two fallback bands on one side of the ideal band
    #[error("Rule '{rule}' has {count} bands {side} the ideal band (max 2)")]
    TooManyBands {
        /// Rule key
        rule: String,
        /// "below" or "above"
        side: &'static str,
        /// Number of bands on that side
        count: usize,
    },

    /// Tiers do not strictly increase moving away from the ideal band
    #[error("Rule '{rule}' band '{label}' ({tier}) must be more severe than the band inside it")]
    NonMonotonic {
        /// Rule key
        rule: String,
        /// Offending band label
        label: String,
        /// Offending band tier
        tier: Tier,
    },

    /// Flag rule defines neither or both of presence and categories
    #[error("Flag '{rule}' must define either a 'present' outcome or 'categories', not {found}")]
    FlagShape {
        /// Rule key
        rule: String,
        /// What was found
        found: &'static str,
    },

    /// Presence flag whose present outcome is Normal
    #[error("Flag '{rule}' present outcome must not be normal")]
    NormalPresence {
        /// Rule key
        rule: String,
    },

    /// Categorical flag without categories
    #[error("Flag '{rule}' has no categories")]
    EmptyCategories {
        /// Rule key
        rule: String,
    },

    /// Categorical flag maps one value twice
    #[error("Flag '{rule}' maps category '{value}' more than once")]
    DuplicateCategory {
        /// Rule key
        rule: String,
        /// Duplicated value
        value: String,
    },

    /// Categorical default names no category
    #[error("Flag '{rule}' default '{value}' is not one of its categories")]
    UnknownDefault {
        /// Rule key
        rule: String,
        /// Default value
        value: String,
    },

    /// Rule set without rules
    #[error("Rule set '{domain}' has no rules")]
    EmptyRuleSet {
        /// Rule set domain
        domain: String,
    },

    /// Two rules share a key
    #[error("Rule set '{domain}' defines rule '{rule}' more than once")]
    DuplicateRule {
        /// Rule set domain
        domain: String,
        /// Duplicated key
        rule: String,
    },

    /// Safety trigger names no rule in the set
    #[error("Safety trigger '{rule}' does not name a rule in '{domain}'")]
    UnknownTrigger {
        /// Rule set domain
        domain: String,
        /// Trigger key
        rule: String,
    },

    /// Safety trigger names a rule that never yields Critical
    #[error("Safety trigger '{rule}' can never produce a critical result")]
    TriggerNeverCritical {
        /// Trigger key
        rule: String,
    },

    /// One action appears in two tier templates
    #[error("Action '{action}' appears in both the {first} and {second} templates")]
    OverlappingActions {
        /// Shared action text
        action: String,
        /// First tier
        first: Tier,
        /// Second tier
        second: Tier,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_rule() {
        let err = ConfigurationError::Gap {
            rule: "pain_score".to_string(),
            from: 3.0,
            to: 4.0,
        };
        assert_eq!(err.to_string(), "Rule 'pain_score' has a gap between 3 and 4");
    }
}
