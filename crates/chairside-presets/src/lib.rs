//! Chairside Presets
//!
//! The rule tables each clinical screen supplies to the engine. Every
//! table is a TOML rule file compiled into the crate, so the built-in
//! domains need no files at runtime. Thresholds are illustrative business
//! rules, not validated clinical guidance.
//!
//! # Example Usage
//!
//! ```no_run
//! use chairside_domain::CaseInput;
//! use chairside_presets::Domain;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let evaluator = Domain::Endodontic.evaluator()?;
//! let case = CaseInput::new()
//!     .with("working_length_mm", 21.0)
//!     .with("obturation_length_mm", 20.5);
//! println!("{}", evaluator.evaluate(&case)?.result.final_tier);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use chairside_engine::{EngineError, Evaluator, RuleSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A domain name that matches no built-in preset
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown domain '{0}' (expected one of: chairside, endodontic, implant, periodontal, orthodontic, triage)")]
pub struct UnknownDomain(pub String);

/// The built-in clinical domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Chair-side assistant pre-treatment screen
    Chairside,
    /// Endodontic canal obturation safety
    Endodontic,
    /// Implant bone margin planning
    Implant,
    /// Periodontal charting
    Periodontal,
    /// Orthodontic cephalometric assessment
    Orthodontic,
    /// General dentistry triage
    Triage,
}

impl Domain {
    /// Every built-in domain
    pub const ALL: [Domain; 6] = [
        Domain::Chairside,
        Domain::Endodontic,
        Domain::Implant,
        Domain::Periodontal,
        Domain::Orthodontic,
        Domain::Triage,
    ];

    /// Domain name as used on the command line and in rule files
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Chairside => "chairside",
            Domain::Endodontic => "endodontic",
            Domain::Implant => "implant",
            Domain::Periodontal => "periodontal",
            Domain::Orthodontic => "orthodontic",
            Domain::Triage => "triage",
        }
    }

    /// Parse a domain name, accepting a few short forms
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "chairside" | "chair-side" | "assistant" => Some(Domain::Chairside),
            "endodontic" | "endo" => Some(Domain::Endodontic),
            "implant" | "implants" => Some(Domain::Implant),
            "periodontal" | "perio" => Some(Domain::Periodontal),
            "orthodontic" | "ortho" => Some(Domain::Orthodontic),
            "triage" | "general" => Some(Domain::Triage),
            _ => None,
        }
    }

    /// Raw TOML of the domain's rule table
    pub fn source(&self) -> &'static str {
        match self {
            Domain::Chairside => include_str!("../rules/chairside.toml"),
            Domain::Endodontic => include_str!("../rules/endodontic.toml"),
            Domain::Implant => include_str!("../rules/implant.toml"),
            Domain::Periodontal => include_str!("../rules/periodontal.toml"),
            Domain::Orthodontic => include_str!("../rules/orthodontic.toml"),
            Domain::Triage => include_str!("../rules/triage.toml"),
        }
    }

    /// Load and validate the domain's rule set
    pub fn rule_set(&self) -> Result<RuleSet, EngineError> {
        RuleSet::from_toml_str(self.source())
    }

    /// An evaluator for the domain
    pub fn evaluator(&self) -> Result<Evaluator, EngineError> {
        self.rule_set().map(Evaluator::new)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::parse(s).ok_or_else(|| UnknownDomain(s.to_string()))
    }
}
