//! Reconciliation of local and external assessments
//!
//! The gate is asymmetric. A malformed or missing external assessment
//! always yields the local one, and a local Critical result caused by a
//! hard safety trigger is never replaced by an external assessment.
//! Otherwise a well-formed external assessment is accepted. Missing flags
//! are taken from the local results; a missing summary or next steps are
//! rebuilt for the external tier, never copied from the local explanation.

use crate::explain::ExplanationBuilder;
use chairside_domain::{
    AggregateResult, Assessment, Authority, ClassificationResult, Explanation, ReconciliationDecision, SignalStatus,
    Tier,
};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Source name used when an external payload does not name itself
pub const EXTERNAL_SOURCE: &str = "external";

/// What came back from the external classifier, if anything
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalOutcome {
    /// No external assessment was requested
    Absent,
    /// A JSON payload, not yet validated
    Payload(Value),
    /// The response could not be parsed as JSON
    Unparseable(String),
    /// The fetch failed
    Failed(String),
    /// The fetch timed out
    TimedOut,
}

impl ExternalOutcome {
    /// Interpret raw response text
    ///
    /// Accepts a payload wrapped in a markdown code block.
    pub fn from_json_str(text: &str) -> Self {
        let json = strip_code_fence(text);
        match serde_json::from_str::<Value>(json) {
            Ok(value) => ExternalOutcome::Payload(value),
            Err(e) => ExternalOutcome::Unparseable(e.to_string()),
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Why an external payload was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedExternal {
    /// Top level is not a JSON object
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// No `risk` object
    #[error("payload has no 'risk' object")]
    MissingRisk,

    /// No `risk.global` string
    #[error("payload has no 'risk.global' tier")]
    MissingGlobal,

    /// `risk.global` is not a tier name
    #[error("unrecognised global tier '{0}'")]
    UnknownTier(String),
}

/// Decides whether a local or an external assessment is authoritative
#[derive(Debug, Clone, Default)]
pub struct ReconciliationGate {
    safety_triggers: BTreeSet<String>,
    explainer: ExplanationBuilder,
}

impl ReconciliationGate {
    /// Create a gate with the rule keys that are hard safety triggers
    pub fn new<I, S>(safety_triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            safety_triggers: safety_triggers.into_iter().map(Into::into).collect(),
            explainer: ExplanationBuilder::default(),
        }
    }

    /// Use a rule set's action templates when explaining external results
    pub fn with_explainer(mut self, explainer: ExplanationBuilder) -> Self {
        self.explainer = explainer;
        self
    }

    /// Rule keys treated as hard safety triggers
    pub fn safety_triggers(&self) -> impl Iterator<Item = &str> {
        self.safety_triggers.iter().map(String::as_str)
    }

    /// Critical results in a local assessment caused by a safety trigger
    pub fn triggered<'a>(&self, local: &'a AggregateResult) -> Vec<&'a ClassificationResult> {
        local
            .all
            .iter()
            .filter(|r| {
                r.tier == Tier::Critical
                    && r.status == SignalStatus::Assessed
                    && self.safety_triggers.contains(&r.source)
            })
            .collect()
    }

    /// Choose the authoritative assessment
    pub fn reconcile(&self, local: Assessment, external: ExternalOutcome) -> ReconciliationDecision {
        let payload = match external {
            ExternalOutcome::Absent => return keep_local(local, "No external assessment".to_string()),
            ExternalOutcome::Unparseable(e) => {
                warn!("External assessment is not valid JSON: {}", e);
                return keep_local(local, format!("External assessment unreadable: {}", e));
            }
            ExternalOutcome::Failed(reason) => {
                warn!("External assessment failed: {}", reason);
                return keep_local(local, format!("External assessment failed: {}", reason));
            }
            ExternalOutcome::TimedOut => {
                warn!("External assessment timed out");
                return keep_local(local, "External assessment timed out".to_string());
            }
            ExternalOutcome::Payload(payload) => payload,
        };

        let external = match parse_external(&payload, &local, &self.explainer) {
            Ok(external) => external,
            Err(e) => {
                warn!("External assessment rejected: {}", e);
                return keep_local(local, format!("External assessment malformed: {}", e));
            }
        };

        let triggered = self.triggered(&local.result);
        if !triggered.is_empty() {
            let labels: Vec<&str> = triggered.iter().map(|r| r.label.as_str()).collect();
            info!(
                "Safety trigger {} overrides external {} assessment from {}",
                labels.join(", "),
                external.result.final_tier,
                external.source
            );
            let reason = format!(
                "Safety trigger ({}) keeps the local critical result; {} reported {}",
                labels.join(", "),
                external.source,
                external.result.final_tier,
            );
            return keep_local(local, reason);
        }

        debug!(
            "Accepting external {} assessment from {}",
            external.result.final_tier, external.source
        );
        ReconciliationDecision {
            authority: Authority::External,
            reason: format!("External assessment from {} accepted", external.source),
            assessment: external,
        }
    }
}

fn keep_local(local: Assessment, reason: String) -> ReconciliationDecision {
    ReconciliationDecision {
        authority: Authority::Local,
        assessment: local,
        reason,
    }
}

/// Validate an external payload and fill its gaps
///
/// Expected shape:
/// `{ risk: { global, flags: [{label, level, detail}] }, summary, nextSteps, source }`.
/// Only `risk.global` is required. Missing or unusable flags are taken
/// from `local`; individual malformed flags are skipped. When no flag sits
/// at the reported tier, an entry naming the external source is added so
/// the result still has a contributing reason. A missing summary or next
/// steps are built by `explainer` from the external result.
pub fn parse_external(
    payload: &Value,
    local: &Assessment,
    explainer: &ExplanationBuilder,
) -> Result<Assessment, MalformedExternal> {
    let obj = payload.as_object().ok_or(MalformedExternal::NotAnObject)?;
    let risk = obj
        .get("risk")
        .and_then(Value::as_object)
        .ok_or(MalformedExternal::MissingRisk)?;
    let global = risk
        .get("global")
        .and_then(Value::as_str)
        .ok_or(MalformedExternal::MissingGlobal)?;
    let final_tier = Tier::parse(global).ok_or_else(|| MalformedExternal::UnknownTier(global.to_string()))?;

    let source = obj
        .get("source")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(EXTERNAL_SOURCE)
        .to_string();

    let mut flags = Vec::new();
    if let Some(entries) = risk.get("flags").and_then(Value::as_array) {
        for (idx, entry) in entries.iter().enumerate() {
            match parse_flag(entry, &source) {
                Ok(flag) => flags.push(flag),
                Err(e) => warn!("Skipping external flag {}: {}", idx, e),
            }
        }
    }
    if flags.is_empty() {
        debug!("External assessment has no usable flags, using local results");
        flags = local.result.all.clone();
    }
    if !flags.iter().any(|f| f.tier == final_tier) {
        debug!("No external flag at {}, recording the overall verdict", final_tier);
        flags.push(overall_verdict(final_tier, &source));
    }

    let result = AggregateResult::from_parts(final_tier, flags);
    let summary = string_list(obj, &["summary"]);
    let actions = string_list(obj, &["nextSteps", "next_steps"]);
    let explanation = match (summary, actions) {
        (Some(summary), Some(actions)) => Explanation { summary, actions },
        (summary, actions) => {
            let built = explainer.explain(&result);
            Explanation {
                summary: summary.unwrap_or(built.summary),
                actions: actions.unwrap_or(built.actions),
            }
        }
    };

    Ok(Assessment {
        source,
        result,
        explanation,
    })
}

fn overall_verdict(tier: Tier, source: &str) -> ClassificationResult {
    ClassificationResult {
        source: source.to_string(),
        name: source.to_string(),
        label: "Overall assessment".to_string(),
        tier,
        margin: None,
        rationale: format!("{} rated the case {}", source, tier),
        status: SignalStatus::Assessed,
    }
}

fn parse_flag(entry: &Value, source: &str) -> Result<ClassificationResult, String> {
    let obj = entry.as_object().ok_or_else(|| "Flag is not a JSON object".to_string())?;
    let label = obj
        .get("label")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing or invalid 'label'".to_string())?;
    let level = obj
        .get("level")
        .and_then(Value::as_str)
        .ok_or_else(|| "Missing or invalid 'level'".to_string())?;
    let tier = Tier::parse(level).ok_or_else(|| format!("Unrecognised level '{}'", level))?;
    let rationale = obj
        .get("detail")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Reported by {}", source));

    Ok(ClassificationResult {
        source: source.to_string(),
        name: label.to_string(),
        label: label.to_string(),
        tier,
        margin: None,
        rationale,
        status: SignalStatus::Assessed,
    })
}

/// First key holding an array; non-string entries are dropped
fn string_list(obj: &Map<String, Value>, keys: &[&str]) -> Option<Vec<String>> {
    let array = keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_array))?;
    Some(
        array
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::ActionTemplates;
    use chairside_domain::LOCAL_SOURCE;
    use serde_json::json;

    fn result(source: &str, label: &str, tier: Tier) -> ClassificationResult {
        ClassificationResult {
            source: source.to_string(),
            name: source.to_string(),
            label: label.to_string(),
            tier,
            margin: None,
            rationale: format!("{} rationale", label),
            status: SignalStatus::Assessed,
        }
    }

    fn local(results: Vec<ClassificationResult>) -> Assessment {
        let final_tier = results.iter().map(|r| r.tier).max().unwrap();
        Assessment {
            source: LOCAL_SOURCE.to_string(),
            result: AggregateResult::from_parts(final_tier, results),
            explanation: Explanation {
                summary: vec!["local summary".to_string()],
                actions: vec!["local action".to_string()],
            },
        }
    }

    fn gate() -> ReconciliationGate {
        ReconciliationGate::new(["pain_score", "allergy", "infection_signs"])
    }

    #[test]
    fn test_absent_external_keeps_local() {
        let decision = gate().reconcile(local(vec![result("fever", "Fever", Tier::Borderline)]), ExternalOutcome::Absent);
        assert_eq!(decision.authority, Authority::Local);
        assert!(decision.assessment.is_local());
    }

    #[test]
    fn test_failures_keep_local() {
        for outcome in [
            ExternalOutcome::TimedOut,
            ExternalOutcome::Failed("connection refused".to_string()),
            ExternalOutcome::Unparseable("expected value".to_string()),
            ExternalOutcome::Payload(json!([1, 2, 3])),
            ExternalOutcome::Payload(json!({"summary": ["no risk object"]})),
            ExternalOutcome::Payload(json!({"risk": {"flags": []}})),
            ExternalOutcome::Payload(json!({"risk": {"global": "purple"}})),
        ] {
            let decision = gate().reconcile(local(vec![result("fever", "Fever", Tier::Normal)]), outcome);
            assert_eq!(decision.authority, Authority::Local);
        }
    }

    #[test]
    fn test_safety_trigger_overrides_external() {
        let local = local(vec![
            result("pain_score", "Severe pain", Tier::Critical),
            result("fever", "No fever", Tier::Normal),
        ]);
        let decision = gate().reconcile(local, ExternalOutcome::Payload(json!({"risk": {"global": "ok"}})));
        assert_eq!(decision.authority, Authority::Local);
        assert_eq!(decision.final_result().final_tier, Tier::Critical);
        assert!(decision.reason.contains("Severe pain"));
    }

    #[test]
    fn test_non_trigger_critical_accepts_external() {
        let local = local(vec![result("asa_class", "ASA IV", Tier::Critical)]);
        let decision = gate().reconcile(local, ExternalOutcome::Payload(json!({"risk": {"global": "warning"}})));
        assert_eq!(decision.authority, Authority::External);
        assert_eq!(decision.final_result().final_tier, Tier::Borderline);
    }

    #[test]
    fn test_insufficient_trigger_is_not_a_safety_trigger() {
        let gate = gate();
        let aggregate = AggregateResult::from_parts(
            Tier::Borderline,
            vec![ClassificationResult::insufficient_data("pain_score", "Pain score", "missing")],
        );
        assert!(gate.triggered(&aggregate).is_empty());
    }

    #[test]
    fn test_partial_payload_explained_at_external_tier() {
        let local = local(vec![result("fever", "Fever", Tier::Borderline)]);
        let explainer = ExplanationBuilder::default();
        let external = parse_external(
            &json!({"risk": {"global": "danger"}, "source": "remote"}),
            &local,
            &explainer,
        )
        .unwrap();
        assert_eq!(external.source, "remote");
        assert_eq!(external.result.final_tier, Tier::Critical);
        assert_eq!(external.result.all.len(), 2);
        assert_eq!(external.result.all[0], local.result.all[0]);

        let contributing = &external.result.contributing;
        assert_eq!(contributing.len(), 1);
        assert_eq!(contributing[0].source, "remote");
        assert_eq!(contributing[0].tier, Tier::Critical);

        assert_eq!(external.explanation.actions, explainer.templates().critical);
        assert_eq!(
            external.explanation.summary[0],
            "Overall status: critical (1 of 2 signals at this tier)"
        );
        assert_eq!(external.explanation.summary[1], "Overall assessment (remote): remote rated the case critical");
    }

    #[test]
    fn test_flags_below_global_get_overall_verdict() {
        let local = local(vec![result("fever", "Fever", Tier::Normal)]);
        let payload = json!({
            "risk": {"global": "warning", "flags": [{"label": "Pain", "level": "ok"}]},
            "summary": ["Watch closely"]
        });
        let external = parse_external(&payload, &local, &ExplanationBuilder::default()).unwrap();
        assert_eq!(external.result.contributing.len(), 1);
        assert_eq!(external.result.contributing[0].label, "Overall assessment");
        assert_eq!(external.explanation.summary, vec!["Watch closely"]);
        assert_eq!(external.explanation.actions, ActionTemplates::default().borderline);
    }

    #[test]
    fn test_gate_uses_its_templates_for_external() {
        let templates = ActionTemplates {
            normal: vec!["Proceed".to_string()],
            borderline: vec!["Review".to_string()],
            critical: vec!["Stop".to_string()],
        };
        let gate = gate().with_explainer(ExplanationBuilder::new(templates));
        let decision = gate.reconcile(
            local(vec![result("fever", "No fever", Tier::Normal)]),
            ExternalOutcome::Payload(json!({"risk": {"global": "critical"}})),
        );
        assert_eq!(decision.authority, Authority::External);
        assert_eq!(decision.assessment.explanation.actions, vec!["Stop"]);
        assert!(decision.assessment.explanation.summary[0].starts_with("Overall status: critical"));
    }

    #[test]
    fn test_triggered_ignores_non_critical_results() {
        let aggregate = AggregateResult::from_parts(
            Tier::Critical,
            vec![
                result("pain_score", "Moderate pain", Tier::Borderline),
                result("asa_class", "ASA IV", Tier::Critical),
            ],
        );
        assert!(gate().triggered(&aggregate).is_empty());

        let aggregate = AggregateResult::from_parts(
            Tier::Critical,
            vec![
                result("allergy", "Severe allergy", Tier::Critical),
                result("asa_class", "ASA IV", Tier::Critical),
            ],
        );
        let triggered = gate().triggered(&aggregate);
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].source, "allergy");
    }

    #[test]
    fn test_full_payload() {
        let local = local(vec![result("fever", "Fever", Tier::Normal)]);
        let payload = json!({
            "risk": {
                "global": "warning",
                "flags": [
                    {"label": "Bleeding risk", "level": "warning", "detail": "On warfarin"},
                    {"label": "Pain", "level": "ok"},
                    {"level": "danger"},
                    "not a flag"
                ]
            },
            "summary": ["Review anticoagulation", 7],
            "next_steps": ["Check INR"]
        });
        let external = parse_external(&payload, &local, &ExplanationBuilder::default()).unwrap();
        assert_eq!(external.source, EXTERNAL_SOURCE);
        assert_eq!(external.result.all.len(), 2);
        assert_eq!(external.result.contributing.len(), 1);
        assert_eq!(external.result.contributing[0].rationale, "On warfarin");
        assert_eq!(external.explanation.summary, vec!["Review anticoagulation"]);
        assert_eq!(external.explanation.actions, vec!["Check INR"]);
    }

    #[test]
    fn test_from_json_str() {
        let fenced = "```json\n{\"risk\": {\"global\": \"ok\"}}\n```";
        assert!(matches!(ExternalOutcome::from_json_str(fenced), ExternalOutcome::Payload(_)));
        assert!(matches!(ExternalOutcome::from_json_str("{not json"), ExternalOutcome::Unparseable(_)));
    }
}
