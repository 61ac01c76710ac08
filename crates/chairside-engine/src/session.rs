//! Last-write-wins evaluation of one case
//!
//! A [`CaseSession`] holds the current inputs of a case and re-evaluates
//! them wholesale on every change. An external fetch started against one
//! set of inputs is only applied if the inputs have not changed since;
//! otherwise its result is discarded, never merged.

use crate::error::EngineError;
use crate::evaluator::Evaluator;
use crate::reconcile::ExternalOutcome;
use chairside_domain::{Assessment, CaseInput, InputValue, ReconciliationDecision};
use tracing::debug;

/// Snapshot of a session's input generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Generation the ticket was taken at
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// One case under interactive evaluation
#[derive(Debug, Clone)]
pub struct CaseSession {
    evaluator: Evaluator,
    inputs: CaseInput,
    assessment: Assessment,
    generation: u64,
}

impl CaseSession {
    /// Start a session with initial inputs
    pub fn new(evaluator: Evaluator, inputs: CaseInput) -> Result<Self, EngineError> {
        let assessment = evaluator.evaluate(&inputs)?;
        Ok(Self {
            evaluator,
            inputs,
            assessment,
            generation: 0,
        })
    }

    /// Set one input and re-evaluate
    ///
    /// If the new inputs fail to evaluate, the change is rejected and the
    /// session keeps its previous inputs and assessment.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<InputValue>) -> Result<&Assessment, EngineError> {
        let mut inputs = self.inputs.clone();
        inputs.set(key, value);
        self.replace(inputs)
    }

    /// Clear one input and re-evaluate
    pub fn unset(&mut self, key: &str) -> Result<&Assessment, EngineError> {
        let mut inputs = self.inputs.clone();
        inputs.remove(key);
        self.replace(inputs)
    }

    /// Replace every input and re-evaluate
    pub fn replace(&mut self, inputs: CaseInput) -> Result<&Assessment, EngineError> {
        let assessment = self.evaluator.evaluate(&inputs)?;
        self.inputs = inputs;
        self.assessment = assessment;
        self.generation += 1;
        Ok(&self.assessment)
    }

    /// Current inputs
    pub fn inputs(&self) -> &CaseInput {
        &self.inputs
    }

    /// Current local assessment
    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    /// The evaluator in use
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Number of accepted input changes
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Snapshot the current inputs before starting an external fetch
    pub fn ticket(&self) -> Ticket {
        Ticket(self.generation)
    }

    /// Reconcile an external outcome fetched for `ticket`
    ///
    /// Returns `None` when the inputs changed after the ticket was taken.
    pub fn apply_external(&self, ticket: Ticket, outcome: ExternalOutcome) -> Option<ReconciliationDecision> {
        if ticket.0 != self.generation {
            debug!(
                "Discarding external assessment for generation {} (now {})",
                ticket.0, self.generation
            );
            return None;
        }
        Some(self.evaluator.reconcile(self.assessment.clone(), outcome))
    }
}
