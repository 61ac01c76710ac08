//! Chairside Domain Layer
//!
//! Value types shared by every clinical screen that classifies measurements
//! into severity tiers. Nothing here performs I/O or classification; the
//! decision procedure lives in `chairside-engine`.
//!
//! ## Key Concepts
//!
//! - **Tier**: ordered severity (normal < borderline < critical)
//! - **Reading**: a numeric form value, or missing (never zero)
//! - **Rules**: range rules (bands around an ideal band) and flag rules
//!   (boolean or categorical lookup), validated on construction
//! - **Results**: one `ClassificationResult` per signal, combined into an
//!   `AggregateResult` per case
//! - **Reconciliation**: the decision between a local and an external
//!   assessment of the same case

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assessment;
pub mod classification;
pub mod error;
pub mod measurement;
pub mod rule;
pub mod tier;

// Re-exports for convenience
pub use assessment::{Assessment, Authority, Explanation, ReconciliationDecision, LOCAL_SOURCE};
pub use classification::{AggregateResult, ClassificationResult, SignalStatus, INSUFFICIENT_DATA_LABEL};
pub use error::ConfigurationError;
pub use measurement::{CaseInput, InputValue, Measurement, MeasurementSource, Reading};
pub use rule::{
    Band, Category, Direction, FlagKind, FlagRule, FlagRuleSpec, Outcome, RangeRule, RangeRuleSpec, Rule,
    RuleSpec,
};
pub use tier::Tier;
