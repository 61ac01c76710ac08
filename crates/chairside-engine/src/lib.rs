//! Chairside Engine
//!
//! The decision procedure shared by every clinical screen: classify each
//! measurement and flag into a tier, combine the tiers worst-of, explain
//! the result, and reconcile it against an external assessment when one
//! is consulted.
//!
//! # Architecture
//!
//! ```text
//! CaseInput → {RangeClassifier, FlagClassifier} → RiskAggregator
//!           → ExplanationBuilder → Assessment
//!           → ReconciliationGate (optional) → ReconciliationDecision
//! ```
//!
//! Every step is a pure function of its inputs. Rules come from a
//! [`RuleSet`] supplied by the calling domain; the engine hard-codes no
//! clinical threshold.
//!
//! # Example Usage
//!
//! ```no_run
//! use chairside_domain::CaseInput;
//! use chairside_engine::{Evaluator, RuleSet};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let rules = RuleSet::from_file("rules/chairside.toml")?;
//! let evaluator = Evaluator::new(rules);
//!
//! let case = CaseInput::new().with("pain_score", 8.0).with("fever", false);
//! let assessment = evaluator.evaluate(&case)?;
//! for line in &assessment.explanation.summary {
//!     println!("{}", line);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod error;
pub mod evaluator;
pub mod explain;
pub mod flag;
pub mod range;
pub mod reconcile;
pub mod rules;
pub mod session;

// Re-exports for convenience
pub use aggregate::aggregate;
pub use error::EngineError;
pub use evaluator::Evaluator;
pub use explain::{ActionTemplates, ExplanationBuilder};
pub use range::EDGE_TOLERANCE;
pub use reconcile::{parse_external, ExternalOutcome, MalformedExternal, ReconciliationGate, EXTERNAL_SOURCE};
pub use rules::{RuleSet, RuleSetSpec};
pub use session::{CaseSession, Ticket};
