//! Explained assessments and reconciliation decisions

use crate::AggregateResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source name used for locally computed assessments
pub const LOCAL_SOURCE: &str = "local";

/// Human-readable explanation of an aggregate result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    /// Ordered statements, overall status first
    pub summary: Vec<String>,
    /// Recommended next actions
    pub actions: Vec<String>,
}

/// An aggregate result with its explanation and origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Where the assessment came from ("local" or the external source name)
    pub source: String,
    /// The classification
    pub result: AggregateResult,
    /// Its explanation
    pub explanation: Explanation,
}

impl Assessment {
    /// Whether this assessment was computed locally
    pub fn is_local(&self) -> bool {
        self.source == LOCAL_SOURCE
    }
}

/// Which side of a reconciliation was kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Authority {
    /// The deterministic local engine
    Local,
    /// The externally supplied assessment
    External,
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authority::Local => f.write_str("local"),
            Authority::External => f.write_str("external"),
        }
    }
}

/// Outcome of reconciling a local assessment against an external one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationDecision {
    /// Which side is authoritative
    pub authority: Authority,
    /// The authoritative assessment
    pub assessment: Assessment,
    /// Why
    pub reason: String,
}

impl ReconciliationDecision {
    /// The authoritative aggregate result
    pub fn final_result(&self) -> &AggregateResult {
        &self.assessment.result
    }
}
