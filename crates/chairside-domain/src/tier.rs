//! Tier module - ordered severity levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity tier of a classified signal
///
/// The order is fixed for every caller: `Normal < Borderline < Critical`.
/// Comparing two tiers always means "more severe than".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Within the ideal band, or nothing flagged
    #[serde(alias = "ok", alias = "ideal", alias = "safe")]
    Normal,

    /// Outside the ideal band, or missing data
    #[serde(alias = "warning", alias = "caution")]
    Borderline,

    /// Requires action before proceeding
    #[serde(alias = "danger", alias = "urgent")]
    Critical,
}

impl Tier {
    /// All tiers, least severe first
    pub const ALL: [Tier; 3] = [Tier::Normal, Tier::Borderline, Tier::Critical];

    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Normal => "normal",
            Tier::Borderline => "borderline",
            Tier::Critical => "critical",
        }
    }

    /// Parse a tier from a string, accepting the aliases used by the
    /// individual screens and by external assessments
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" | "ok" | "ideal" | "safe" | "low" => Some(Tier::Normal),
            "borderline" | "warning" | "caution" | "moderate" | "medium" | "limited" => {
                Some(Tier::Borderline)
            }
            "critical" | "danger" | "high" | "urgent" | "severe" => Some(Tier::Critical),
            _ => None,
        }
    }

    /// Get the next more severe tier
    pub fn escalate(&self) -> Option<Self> {
        match self {
            Tier::Normal => Some(Tier::Borderline),
            Tier::Borderline => Some(Tier::Critical),
            Tier::Critical => None, // Already at top
        }
    }

    /// Whether this tier needs attention before proceeding
    pub fn is_flagged(&self) -> bool {
        *self > Tier::Normal
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid tier: {}", s))
    }
}
