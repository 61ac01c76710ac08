//! Integration tests for the evaluation pipeline

use chairside_domain::{Authority, CaseInput, InputValue, SignalStatus, Tier};
use chairside_engine::{CaseSession, EngineError, Evaluator, ExternalOutcome, RuleSet};
use std::io::Write;

const CANAL_RULES: &str = r#"
domain = "canal"
description = "Root canal obturation check"
safety_triggers = ["obturation_shortfall"]

[actions]
normal = ["Proceed to final restoration"]
borderline = ["Take a confirmatory radiograph"]
critical = ["Stop and reassess the obturation"]

[[rule]]
kind = "range"
key = "obturation_shortfall"
name = "Obturation shortfall"
unit = "mm"
source = { difference = { minuend = "working_length_mm", subtrahend = "obturation_length_mm" } }
direction = { below = "overfilled past", above = "short of" }

[[rule.bands]]
upper = 0.0
tier = "critical"
label = "Overfill"
detail = "Material extends beyond the apex"

[[rule.bands]]
lower = 0.0
upper = 2.0
tier = "normal"
label = "Ideal length"

[[rule.bands]]
lower = 2.0
upper = 4.0
tier = "borderline"
label = "Short fill"

[[rule.bands]]
lower = 4.0
tier = "critical"
label = "Severely short fill"

[[rule]]
kind = "flag"
key = "perforation"
name = "Perforation"
present = { tier = "critical", label = "Perforation" }
"#;

/// Helper to load the rule set through a real file
fn load_evaluator() -> Evaluator {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CANAL_RULES.as_bytes()).unwrap();
    Evaluator::new(RuleSet::from_file(file.path()).unwrap())
}

fn canal(working: f64, obturation: f64) -> CaseInput {
    CaseInput::new()
        .with("working_length_mm", working)
        .with("obturation_length_mm", obturation)
}

#[test]
fn test_difference_measurement_pipeline() {
    let evaluator = load_evaluator();

    let ideal = evaluator.evaluate(&canal(21.0, 20.5)).unwrap();
    assert_eq!(ideal.result.final_tier, Tier::Normal);
    assert_eq!(ideal.result.all[0].margin, Some(0.0));
    assert_eq!(ideal.explanation.actions, vec!["Proceed to final restoration"]);

    let short = evaluator.evaluate(&canal(21.0, 18.0)).unwrap();
    assert_eq!(short.result.final_tier, Tier::Borderline);
    assert_eq!(short.result.contributing[0].label, "Short fill");
    assert_eq!(short.result.contributing[0].margin, Some(-1.0));

    let over = evaluator.evaluate(&canal(21.0, 21.2)).unwrap();
    assert_eq!(over.result.final_tier, Tier::Critical);
    assert!(over.result.contributing[0].rationale.contains("overfilled past"));
    assert!(over.result.contributing[0].rationale.contains("beyond the apex"));
    assert_eq!(over.explanation.actions, vec!["Stop and reassess the obturation"]);
}

#[test]
fn test_partial_difference_is_insufficient() {
    let evaluator = load_evaluator();
    let case = CaseInput::new().with("working_length_mm", 21.0);
    let assessment = evaluator.evaluate(&case).unwrap();
    assert_eq!(assessment.result.final_tier, Tier::Borderline);
    assert_eq!(assessment.result.all[0].status, SignalStatus::InsufficientData);
}

#[test]
fn test_assessment_serializes_for_presentation() {
    let evaluator = load_evaluator();
    let assessment = evaluator.evaluate(&canal(21.0, 21.2)).unwrap();
    let json = serde_json::to_value(&assessment).unwrap();

    assert_eq!(json["source"], "local");
    assert_eq!(json["result"]["final_tier"], "critical");
    assert_eq!(json["result"]["contributing"][0]["label"], "Overfill");
    assert_eq!(json["result"]["all"][1]["margin"], serde_json::Value::Null);
    assert!(json["explanation"]["summary"][0]
        .as_str()
        .unwrap()
        .starts_with("Overall status: critical"));
}

#[test]
fn test_case_input_from_form_json() {
    let evaluator = load_evaluator();
    let case: CaseInput = serde_json::from_str(
        r#"{"working_length_mm": "21,0", "obturation_length_mm": 20.5, "perforation": "no"}"#,
    )
    .unwrap();
    let assessment = evaluator.evaluate(&case).unwrap();
    assert_eq!(assessment.result.final_tier, Tier::Normal);
}

#[test]
fn test_unrecognised_presence_text_fails() {
    let evaluator = load_evaluator();
    let case = canal(21.0, 20.5).with("perforation", "maybe");
    assert!(matches!(
        evaluator.evaluate(&case),
        Err(EngineError::UnmappedCategory { .. })
    ));
}

#[test]
fn test_session_last_write_wins() {
    let mut session = CaseSession::new(load_evaluator(), canal(21.0, 21.2)).unwrap();
    assert_eq!(session.assessment().result.final_tier, Tier::Critical);

    // Fetch started while overfilled; clinician corrects the reading meanwhile
    let stale = session.ticket();
    session.set("obturation_length_mm", InputValue::Number(20.5)).unwrap();
    let outcome = ExternalOutcome::from_json_str(r#"{"risk": {"global": "danger"}}"#);
    assert!(session.apply_external(stale, outcome.clone()).is_none());

    let decision = session.apply_external(session.ticket(), outcome).unwrap();
    assert_eq!(decision.authority, Authority::External);
    assert_eq!(decision.final_result().final_tier, Tier::Critical);
    // The local case is Normal now; the explanation follows the external tier
    assert_eq!(decision.assessment.explanation.actions, vec!["Stop and reassess the obturation"]);
    assert!(!decision.final_result().contributing.is_empty());
}

#[test]
fn test_safety_trigger_from_rule_file() {
    let evaluator = load_evaluator();
    let decision = evaluator
        .evaluate_with_external(
            &canal(21.0, 21.2),
            ExternalOutcome::from_json_str(r#"{"risk": {"global": "ok", "flags": []}, "source": "remote"}"#),
        )
        .unwrap();
    assert_eq!(decision.authority, Authority::Local);
    assert!(decision.reason.contains("Overfill"));
}
