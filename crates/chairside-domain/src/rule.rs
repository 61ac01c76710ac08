//! Rule configuration owned by each clinical domain
//!
//! A [`RangeRule`] maps a numeric measurement onto contiguous bands around
//! an ideal band. A [`FlagRule`] maps a boolean or categorical input
//! directly onto a tier. Both validate on construction, so a rule that
//! exists is always well formed.

use crate::{ConfigurationError, MeasurementSource, Tier};
use serde::{Deserialize, Serialize};

/// One band of a range rule
///
/// `None` bounds are unbounded and only allowed on the outermost bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Lower edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    /// Upper edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    /// Tier assigned to values in this band
    pub tier: Tier,
    /// Finding label (e.g. "Severe pain")
    pub label: String,
    /// Extra text appended to the rationale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Band {
    /// Create a band
    pub fn new(lower: Option<f64>, upper: Option<f64>, tier: Tier, label: impl Into<String>) -> Self {
        Self {
            lower,
            upper,
            tier,
            label: label.into(),
            detail: None,
        }
    }

    /// Attach a detail sentence
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Words used in rationales for values below / above the ideal band
///
/// An endodontic shortfall rule reads "overfilled past" below and
/// "short of" above; a pain score just reads "below" / "above".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direction {
    /// Phrase for values under the ideal band's lower edge
    pub below: String,
    /// Phrase for values over the ideal band's upper edge
    pub above: String,
}

impl Default for Direction {
    fn default() -> Self {
        Self {
            below: "below".to_string(),
            above: "above".to_string(),
        }
    }
}

/// Unvalidated range rule, as written in a rule file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeRuleSpec {
    /// Rule key, unique within a rule set
    pub key: String,
    /// Display name
    pub name: String,
    /// Unit label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Measurement source; defaults to the field named by `key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MeasurementSource>,
    /// Rationale direction words
    #[serde(default)]
    pub direction: Direction,
    /// Bands in ascending order
    pub bands: Vec<Band>,
}

/// A validated numeric range rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RangeRuleSpec", into = "RangeRuleSpec")]
pub struct RangeRule {
    spec: RangeRuleSpec,
    ideal: usize,
}

impl RangeRule {
    /// Validate a spec into a rule
    ///
    /// Bands must be contiguous and ascending, with exactly one Normal
    /// band, at most two bands on each side of it, and tiers strictly
    /// increasing moving outward.
    pub fn new(spec: RangeRuleSpec) -> Result<Self, ConfigurationError> {
        let rule = spec.key.clone();
        if rule.trim().is_empty() {
            return Err(ConfigurationError::EmptyKey);
        }

        let bands = &spec.bands;
        let ideal_indices: Vec<usize> = bands
            .iter()
            .enumerate()
            .filter(|(_, b)| b.tier == Tier::Normal)
            .map(|(i, _)| i)
            .collect();
        if ideal_indices.len() != 1 {
            return Err(ConfigurationError::IdealBandCount {
                rule,
                found: ideal_indices.len(),
            });
        }
        let ideal = ideal_indices[0];

        let last = bands.len() - 1;
        for (i, band) in bands.iter().enumerate() {
            let finite = band.lower.map_or(true, f64::is_finite) && band.upper.map_or(true, f64::is_finite);
            if !finite {
                return Err(ConfigurationError::NonFiniteBound {
                    rule,
                    label: band.label.clone(),
                });
            }
            if (band.lower.is_none() && i != 0) || (band.upper.is_none() && i != last) {
                return Err(ConfigurationError::UnboundedInteriorBand {
                    rule,
                    label: band.label.clone(),
                });
            }
            if let (Some(lower), Some(upper)) = (band.lower, band.upper) {
                if lower >= upper {
                    return Err(ConfigurationError::EmptyBand {
                        rule,
                        label: band.label.clone(),
                        lower,
                        upper,
                    });
                }
            }
        }

        for pair in bands.windows(2) {
            // Interior edges are bounded, checked above
            let (Some(upper), Some(lower)) = (pair[0].upper, pair[1].lower) else {
                continue;
            };
            if upper < lower {
                return Err(ConfigurationError::Gap { rule, from: upper, to: lower });
            }
            if upper > lower {
                return Err(ConfigurationError::Overlap { rule, from: lower, to: upper });
            }
        }

        let below = ideal;
        let above = last - ideal;
        if below > 2 {
            return Err(ConfigurationError::TooManyBands { rule, side: "below", count: below });
        }
        if above > 2 {
            return Err(ConfigurationError::TooManyBands { rule, side: "above", count: above });
        }

        let outward_below = (0..ideal).rev();
        let outward_above = ideal + 1..=last;
        for indices in [outward_below.collect::<Vec<_>>(), outward_above.collect()] {
            let mut inner = Tier::Normal;
            for i in indices {
                let band = &bands[i];
                if band.tier <= inner {
                    return Err(ConfigurationError::NonMonotonic {
                        rule,
                        label: band.label.clone(),
                        tier: band.tier,
                    });
                }
                inner = band.tier;
            }
        }

        Ok(Self { spec, ideal })
    }

    /// Rule key
    pub fn key(&self) -> &str {
        &self.spec.key
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Unit label
    pub fn unit(&self) -> Option<&str> {
        self.spec.unit.as_deref()
    }

    /// Where the measurement comes from
    pub fn source(&self) -> MeasurementSource {
        self.spec
            .source
            .clone()
            .unwrap_or_else(|| MeasurementSource::Field(self.spec.key.clone()))
    }

    /// Rationale direction words
    pub fn direction(&self) -> &Direction {
        &self.spec.direction
    }

    /// All bands, ascending
    pub fn bands(&self) -> &[Band] {
        &self.spec.bands
    }

    /// The Normal band
    pub fn ideal(&self) -> &Band {
        &self.spec.bands[self.ideal]
    }

    /// Bands below the ideal band, nearest first
    pub fn below(&self) -> impl Iterator<Item = &Band> {
        self.spec.bands[..self.ideal].iter().rev()
    }

    /// Bands above the ideal band, nearest first
    pub fn above(&self) -> impl Iterator<Item = &Band> {
        self.spec.bands[self.ideal + 1..].iter()
    }

    /// Most severe tier this rule can produce
    pub fn max_tier(&self) -> Tier {
        self.spec
            .bands
            .iter()
            .map(|b| b.tier)
            .max()
            .unwrap_or(Tier::Normal)
    }
}

impl TryFrom<RangeRuleSpec> for RangeRule {
    type Error = ConfigurationError;

    fn try_from(spec: RangeRuleSpec) -> Result<Self, Self::Error> {
        RangeRule::new(spec)
    }
}

impl From<RangeRule> for RangeRuleSpec {
    fn from(rule: RangeRule) -> Self {
        rule.spec
    }
}

/// Tier, label and optional detail for one flag value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Tier assigned
    pub tier: Tier,
    /// Finding label (e.g. "Bleeding risk")
    pub label: String,
    /// Extra text appended to the rationale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Outcome {
    /// Create an outcome without detail
    pub fn new(tier: Tier, label: impl Into<String>) -> Self {
        Self {
            tier,
            label: label.into(),
            detail: None,
        }
    }
}

/// One mapped value of a categorical flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Input value, matched case-insensitively
    pub value: String,
    /// Tier assigned
    pub tier: Tier,
    /// Finding label
    pub label: String,
    /// Extra text appended to the rationale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Category {
    /// Create a category mapping
    pub fn new(value: impl Into<String>, tier: Tier, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            tier,
            label: label.into(),
            detail: None,
        }
    }

    /// Whether this category matches an input value
    pub fn matches(&self, input: &str) -> bool {
        self.value.trim().eq_ignore_ascii_case(input.trim())
    }
}

/// The two shapes of flag rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagKind {
    /// Boolean presence flag
    Presence {
        /// Outcome when the flag is set
        present: Outcome,
        /// Outcome when the flag is clear or unset
        absent: Outcome,
    },
    /// Finite set of categories
    Categorical {
        /// Every legal value, in display order
        categories: Vec<Category>,
        /// Value assumed when the field is unset (a preselected dropdown)
        default: Option<String>,
    },
}

/// Unvalidated flag rule, as written in a rule file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRuleSpec {
    /// Rule key, unique within a rule set; also the input field read
    pub key: String,
    /// Display name
    pub name: String,
    /// Presence flags: outcome when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present: Option<Outcome>,
    /// Presence flags: outcome when clear (defaults to Normal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absent: Option<Outcome>,
    /// Categorical flags: every legal value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
    /// Categorical flags: value assumed when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// A validated flag rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FlagRuleSpec", into = "FlagRuleSpec")]
pub struct FlagRule {
    key: String,
    name: String,
    kind: FlagKind,
}

impl FlagRule {
    /// Validate a spec into a rule
    pub fn new(spec: FlagRuleSpec) -> Result<Self, ConfigurationError> {
        let rule = spec.key.clone();
        if rule.trim().is_empty() {
            return Err(ConfigurationError::EmptyKey);
        }

        let kind = match (spec.present, spec.absent, spec.categories) {
            (Some(_), _, None) if spec.default.is_some() => {
                return Err(ConfigurationError::FlagShape {
                    rule,
                    found: "a 'default' value on a presence flag",
                });
            }
            (Some(present), absent, None) => {
                if present.tier == Tier::Normal {
                    return Err(ConfigurationError::NormalPresence { rule });
                }
                let absent = absent.unwrap_or_else(|| {
                    Outcome::new(Tier::Normal, format!("No {}", spec.name.to_lowercase()))
                });
                FlagKind::Presence { present, absent }
            }
            (None, None, Some(categories)) => {
                if categories.is_empty() {
                    return Err(ConfigurationError::EmptyCategories { rule });
                }
                for (i, category) in categories.iter().enumerate() {
                    if categories[..i].iter().any(|c| c.matches(&category.value)) {
                        return Err(ConfigurationError::DuplicateCategory {
                            rule,
                            value: category.value.clone(),
                        });
                    }
                }
                if let Some(value) = &spec.default {
                    if !categories.iter().any(|c| c.matches(value)) {
                        return Err(ConfigurationError::UnknownDefault {
                            rule,
                            value: value.clone(),
                        });
                    }
                }
                FlagKind::Categorical {
                    categories,
                    default: spec.default,
                }
            }
            (None, None, None) => {
                return Err(ConfigurationError::FlagShape { rule, found: "neither" });
            }
            (None, Some(_), None) => {
                return Err(ConfigurationError::FlagShape {
                    rule,
                    found: "an 'absent' outcome alone",
                });
            }
            _ => {
                return Err(ConfigurationError::FlagShape { rule, found: "both" });
            }
        };

        Ok(Self {
            key: spec.key,
            name: spec.name,
            kind,
        })
    }

    /// Rule key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Presence or categorical
    pub fn kind(&self) -> &FlagKind {
        &self.kind
    }

    /// Find the category mapping for an input value
    pub fn category(&self, value: &str) -> Option<&Category> {
        match &self.kind {
            FlagKind::Categorical { categories, .. } => categories.iter().find(|c| c.matches(value)),
            FlagKind::Presence { .. } => None,
        }
    }

    /// Category assumed when the field is unset, if any
    pub fn default_category(&self) -> Option<&Category> {
        match &self.kind {
            FlagKind::Categorical {
                default: Some(value), ..
            } => self.category(value),
            _ => None,
        }
    }

    /// Most severe tier this rule can produce
    pub fn max_tier(&self) -> Tier {
        match &self.kind {
            FlagKind::Presence { present, absent } => present.tier.max(absent.tier),
            FlagKind::Categorical { categories, .. } => categories
                .iter()
                .map(|c| c.tier)
                .max()
                .unwrap_or(Tier::Normal),
        }
    }
}

impl TryFrom<FlagRuleSpec> for FlagRule {
    type Error = ConfigurationError;

    fn try_from(spec: FlagRuleSpec) -> Result<Self, Self::Error> {
        FlagRule::new(spec)
    }
}

impl From<FlagRule> for FlagRuleSpec {
    fn from(rule: FlagRule) -> Self {
        let (present, absent, categories, default) = match rule.kind {
            FlagKind::Presence { present, absent } => (Some(present), Some(absent), None, None),
            FlagKind::Categorical { categories, default } => (None, None, Some(categories), default),
        };
        Self {
            key: rule.key,
            name: rule.name,
            present,
            absent,
            categories,
            default,
        }
    }
}

/// Unvalidated rule, as written in a rule file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleSpec {
    /// Numeric range rule
    Range(RangeRuleSpec),
    /// Boolean or categorical flag rule
    Flag(FlagRuleSpec),
}

/// Any validated rule in a rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleSpec", into = "RuleSpec")]
pub enum Rule {
    /// Numeric range rule
    Range(RangeRule),
    /// Boolean or categorical flag rule
    Flag(FlagRule),
}

impl TryFrom<RuleSpec> for Rule {
    type Error = ConfigurationError;

    fn try_from(spec: RuleSpec) -> Result<Self, Self::Error> {
        match spec {
            RuleSpec::Range(spec) => RangeRule::new(spec).map(Rule::Range),
            RuleSpec::Flag(spec) => FlagRule::new(spec).map(Rule::Flag),
        }
    }
}

impl From<Rule> for RuleSpec {
    fn from(rule: Rule) -> Self {
        match rule {
            Rule::Range(r) => RuleSpec::Range(r.into()),
            Rule::Flag(f) => RuleSpec::Flag(f.into()),
        }
    }
}

impl Rule {
    /// Rule key
    pub fn key(&self) -> &str {
        match self {
            Rule::Range(r) => r.key(),
            Rule::Flag(f) => f.key(),
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        match self {
            Rule::Range(r) => r.name(),
            Rule::Flag(f) => f.name(),
        }
    }

    /// Most severe tier this rule can produce
    pub fn max_tier(&self) -> Tier {
        match self {
            Rule::Range(r) => r.max_tier(),
            Rule::Flag(f) => f.max_tier(),
        }
    }
}
