//! Classification results for single signals and whole cases

use crate::Tier;
use serde::{Deserialize, Serialize};

/// Whether a result was computed from real input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    /// Classified from a recorded value
    Assessed,
    /// Input was missing or unreadable; tier is the conservative default
    InsufficientData,
}

/// The classification of one measurement or flag
///
/// Produced once per input and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Key of the rule that produced this result
    pub source: String,
    /// Display name of the rule (e.g. "Pain score")
    pub name: String,
    /// Finding label (e.g. "Severe pain")
    pub label: String,
    /// Assigned tier
    pub tier: Tier,
    /// Signed distance from the ideal band; `None` for flags and missing data
    pub margin: Option<f64>,
    /// Human-readable reason
    pub rationale: String,
    /// Assessed or insufficient data
    pub status: SignalStatus,
}

/// Label used for every insufficient-data result
pub const INSUFFICIENT_DATA_LABEL: &str = "Insufficient data";

impl ClassificationResult {
    /// Conservative result for missing or unreadable input
    pub fn insufficient_data(
        source: impl Into<String>,
        name: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            label: INSUFFICIENT_DATA_LABEL.to_string(),
            tier: Tier::Borderline,
            margin: None,
            rationale: rationale.into(),
            status: SignalStatus::InsufficientData,
        }
    }

    /// Whether this result came from missing data
    pub fn is_insufficient(&self) -> bool {
        self.status == SignalStatus::InsufficientData
    }
}

/// The combined classification of one case
///
/// Rebuilt wholesale on every evaluation; never patched incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Overall tier
    pub final_tier: Tier,
    /// Every result at `final_tier`, in input order
    pub contributing: Vec<ClassificationResult>,
    /// Every result, in input order
    pub all: Vec<ClassificationResult>,
}

impl AggregateResult {
    /// Build from a chosen final tier, selecting the contributing results
    ///
    /// The caller decides `final_tier`; locally it is the worst tier
    /// present, for an external assessment it is whatever the source
    /// reported.
    pub fn from_parts(final_tier: Tier, all: Vec<ClassificationResult>) -> Self {
        let contributing = all
            .iter()
            .filter(|r| r.tier == final_tier)
            .cloned()
            .collect();
        Self {
            final_tier,
            contributing,
            all,
        }
    }

    /// Number of classified signals
    pub fn signal_count(&self) -> usize {
        self.all.len()
    }

    /// Results that came from missing data
    pub fn insufficient(&self) -> impl Iterator<Item = &ClassificationResult> {
        self.all.iter().filter(|r| r.is_insufficient())
    }

    /// Flagged results below the final tier
    pub fn secondary(&self) -> impl Iterator<Item = &ClassificationResult> {
        let final_tier = self.final_tier;
        self.all
            .iter()
            .filter(move |r| r.tier.is_flagged() && r.tier < final_tier)
    }
}
