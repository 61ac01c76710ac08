//! The evaluation pipeline for one rule set
//!
//! classify every rule → aggregate → explain, and optionally reconcile
//! against an external assessment. Each call recomputes everything from
//! the inputs it is given.

use crate::aggregate::aggregate;
use crate::error::EngineError;
use crate::explain::ExplanationBuilder;
use crate::reconcile::{ExternalOutcome, ReconciliationGate};
use crate::rules::RuleSet;
use crate::{flag, range};
use chairside_domain::{
    AggregateResult, Assessment, CaseInput, ClassificationResult, ReconciliationDecision, Rule, LOCAL_SOURCE,
};
use tracing::debug;

/// Evaluates cases against one domain's rule set
#[derive(Debug, Clone)]
pub struct Evaluator {
    rules: RuleSet,
    gate: ReconciliationGate,
    explainer: ExplanationBuilder,
}

impl Evaluator {
    /// Create an evaluator for a rule set
    pub fn new(rules: RuleSet) -> Self {
        let explainer = ExplanationBuilder::new(rules.actions().clone());
        let gate = ReconciliationGate::new(rules.safety_triggers().iter().cloned()).with_explainer(explainer.clone());
        Self { rules, gate, explainer }
    }

    /// The rule set
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The reconciliation gate built from the rule set's safety triggers
    pub fn gate(&self) -> &ReconciliationGate {
        &self.gate
    }

    /// Classify every rule, in declaration order
    pub fn classify_all(&self, case: &CaseInput) -> Result<Vec<ClassificationResult>, EngineError> {
        self.rules
            .rules()
            .iter()
            .map(|rule| match rule {
                Rule::Range(r) => Ok(range::classify(range::measure(r, case).reading, r)),
                Rule::Flag(f) => flag::classify(case.get(f.key()), f),
            })
            .collect()
    }

    /// Classify and aggregate a case
    pub fn aggregate(&self, case: &CaseInput) -> Result<AggregateResult, EngineError> {
        let results = self.classify_all(case)?;
        let result = aggregate(results)?;
        debug!(
            "Classified {} signals for {}: {} ({} contributing, {} missing)",
            result.signal_count(),
            self.rules.domain(),
            result.final_tier,
            result.contributing.len(),
            result.insufficient().count()
        );
        Ok(result)
    }

    /// Produce the local assessment of a case
    pub fn evaluate(&self, case: &CaseInput) -> Result<Assessment, EngineError> {
        let result = self.aggregate(case)?;
        let explanation = self.explainer.explain(&result);
        Ok(Assessment {
            source: LOCAL_SOURCE.to_string(),
            result,
            explanation,
        })
    }

    /// Reconcile an existing local assessment against an external outcome
    pub fn reconcile(&self, local: Assessment, external: ExternalOutcome) -> ReconciliationDecision {
        self.gate.reconcile(local, external)
    }

    /// Evaluate a case and reconcile it against an external outcome
    pub fn evaluate_with_external(
        &self,
        case: &CaseInput,
        external: ExternalOutcome,
    ) -> Result<ReconciliationDecision, EngineError> {
        let local = self.evaluate(case)?;
        Ok(self.reconcile(local, external))
    }

    /// Case fields that no rule reads
    pub fn unused_fields<'a>(&self, case: &'a CaseInput) -> Vec<&'a str> {
        let fields = self.rules.fields();
        case.iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| !fields.iter().any(|f| f.as_str() == *k))
            .collect()
    }
}
