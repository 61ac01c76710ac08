//! Clinical scenarios run against the built-in rule tables

use chairside_domain::{Authority, CaseInput, ClassificationResult, SignalStatus, Tier};
use chairside_engine::{aggregate, ExternalOutcome};
use chairside_presets::Domain;
use serde_json::json;

fn contributing_labels(results: &[ClassificationResult]) -> Vec<&str> {
    results.iter().map(|r| r.label.as_str()).collect()
}

fn result_for<'a>(results: &'a [ClassificationResult], source: &str) -> &'a ClassificationResult {
    results
        .iter()
        .find(|r| r.source == source)
        .unwrap_or_else(|| panic!("no result for {}", source))
}

#[test]
fn test_severe_pain_alone_is_critical() {
    let evaluator = Domain::Chairside.evaluator().unwrap();
    let assessment = evaluator.evaluate(&CaseInput::new().with("pain_score", 8.0)).unwrap();

    assert_eq!(assessment.result.final_tier, Tier::Critical);
    assert_eq!(contributing_labels(&assessment.result.contributing), vec!["Severe pain"]);
    assert!(assessment
        .explanation
        .actions
        .iter()
        .any(|a| a.contains("urgent triage")));
    assert_eq!(
        assessment.explanation.summary[0],
        "Overall status: critical (1 of 7 signals at this tier)"
    );
}

#[test]
fn test_moderate_pain_with_anticoagulants_is_borderline() {
    let evaluator = Domain::Chairside.evaluator().unwrap();
    let case = CaseInput::new()
        .with("pain_score", 4.0)
        .with("swelling", false)
        .with("fever", false)
        .with("anticoagulants", true);
    let assessment = evaluator.evaluate(&case).unwrap();

    assert_eq!(assessment.result.final_tier, Tier::Borderline);
    assert_eq!(
        contributing_labels(&assessment.result.contributing),
        vec!["Moderate pain", "Bleeding risk"]
    );
    for line in ["Moderate pain (Pain score)", "Bleeding risk (Anticoagulants)"] {
        assert!(
            assessment.explanation.summary.iter().any(|s| s.starts_with(line)),
            "missing summary line for {}",
            line
        );
    }
}

#[test]
fn test_endodontic_obturation_length() {
    let evaluator = Domain::Endodontic.evaluator().unwrap();

    let short = CaseInput::new()
        .with("working_length_mm", 21.0)
        .with("obturation_length_mm", 20.5);
    let results = evaluator.classify_all(&short).unwrap();
    let shortfall = result_for(&results, "obturation_shortfall");
    assert_eq!(shortfall.tier, Tier::Normal);
    assert_eq!(shortfall.margin, Some(0.0));

    let over = CaseInput::new()
        .with("working_length_mm", 21.0)
        .with("obturation_length_mm", 21.2);
    let results = evaluator.classify_all(&over).unwrap();
    let shortfall = result_for(&results, "obturation_shortfall");
    assert_eq!(shortfall.tier, Tier::Critical);
    assert_eq!(shortfall.label, "Overfill");
    assert!(shortfall.rationale.to_lowercase().contains("overfill"));
    assert!(shortfall.margin.unwrap() > 0.0);
}

#[test]
fn test_endodontic_band_edges() {
    let evaluator = Domain::Endodontic.evaluator().unwrap();
    let tier_at = |working: f64, obturation: f64| {
        let case = CaseInput::new()
            .with("working_length_mm", working)
            .with("obturation_length_mm", obturation);
        result_for(&evaluator.classify_all(&case).unwrap(), "obturation_shortfall").tier
    };
    // Ideal band edges are inside the ideal band
    assert_eq!(tier_at(21.0, 21.0), Tier::Normal);
    assert_eq!(tier_at(23.3, 21.3), Tier::Normal);
    // Edge between short fill and severely short fill goes to the more severe band
    assert_eq!(tier_at(25.3, 21.3), Tier::Critical);
    assert_eq!(tier_at(24.3, 21.3), Tier::Borderline);
}

#[test]
fn test_implant_bone_margin() {
    let evaluator = Domain::Implant.evaluator().unwrap();

    let flush = CaseInput::new()
        .with("available_bone_mm", 9.0)
        .with("implant_length_mm", 9.0)
        .with("bone_width_mm", 7.0);
    let assessment = evaluator.evaluate(&flush).unwrap();
    let margin = result_for(&assessment.result.all, "bone_margin");
    assert_eq!(margin.tier, Tier::Critical);
    assert_eq!(margin.label, "Not enough bone");
    assert_eq!(assessment.result.final_tier, Tier::Critical);

    let safe = CaseInput::new()
        .with("available_bone_mm", 14.0)
        .with("implant_length_mm", 9.0)
        .with("bone_width_mm", 7.0);
    let assessment = evaluator.evaluate(&safe).unwrap();
    let margin = result_for(&assessment.result.all, "bone_margin");
    assert_eq!(margin.tier, Tier::Normal);
    assert_eq!(margin.label, "Safe bone margin");
    assert_eq!(assessment.result.final_tier, Tier::Normal);
}

#[test]
fn test_safety_trigger_beats_external_ok() {
    let evaluator = Domain::Chairside.evaluator().unwrap();
    let case = CaseInput::new().with("pain_score", 9.0);
    let external = ExternalOutcome::Payload(json!({
        "risk": {"global": "ok", "flags": []},
        "summary": ["Looks fine"],
        "nextSteps": ["Proceed"],
        "source": "remote-assistant"
    }));
    let decision = evaluator.evaluate_with_external(&case, external).unwrap();

    assert_eq!(decision.authority, Authority::Local);
    assert_eq!(decision.final_result().final_tier, Tier::Critical);
    assert_eq!(contributing_labels(&decision.final_result().contributing), vec!["Severe pain"]);
}

#[test]
fn test_external_accepted_without_safety_trigger() {
    let evaluator = Domain::Chairside.evaluator().unwrap();
    let case = CaseInput::new().with("pain_score", 2.0).with("fever", true);
    let external = ExternalOutcome::Payload(json!({
        "risk": {"global": "warning", "flags": [{"label": "Fever", "level": "warning", "detail": "38.5 C"}]},
        "source": "remote-assistant"
    }));
    let decision = evaluator.evaluate_with_external(&case, external).unwrap();

    assert_eq!(decision.authority, Authority::External);
    assert_eq!(decision.assessment.source, "remote-assistant");
    assert_eq!(contributing_labels(&decision.final_result().contributing), vec!["Fever"]);
    // Actions missing from the payload are built for the external tier
    assert_eq!(
        decision.assessment.explanation.actions,
        evaluator.rules().actions().for_tier(Tier::Borderline)
    );
}

#[test]
fn test_external_higher_than_local_is_explained_at_its_tier() {
    let evaluator = Domain::Chairside.evaluator().unwrap();
    let case = CaseInput::new().with("pain_score", 1.0);
    let external = ExternalOutcome::Payload(json!({"risk": {"global": "danger"}, "source": "remote"}));
    let decision = evaluator.evaluate_with_external(&case, external).unwrap();

    assert_eq!(decision.authority, Authority::External);
    assert_eq!(decision.final_result().final_tier, Tier::Critical);
    assert_eq!(contributing_labels(&decision.final_result().contributing), vec!["Overall assessment"]);

    let explanation = &decision.assessment.explanation;
    assert_eq!(explanation.actions, evaluator.rules().actions().for_tier(Tier::Critical));
    assert_eq!(explanation.summary[0], "Overall status: critical (1 of 8 signals at this tier)");
    assert!(explanation.summary[1].contains("remote rated the case critical"));
    let normal = evaluator.rules().actions().for_tier(Tier::Normal);
    assert!(explanation.actions.iter().all(|a| !normal.contains(a)));
}

#[test]
fn test_unset_categorical_without_default_is_insufficient() {
    let evaluator = Domain::Triage.evaluator().unwrap();
    let assessment = evaluator.evaluate(&CaseInput::new().with("pain_score", 1.0)).unwrap();
    assert_eq!(assessment.result.final_tier, Tier::Borderline);
    let caries = result_for(&assessment.result.all, "caries_risk");
    assert_eq!(caries.status, SignalStatus::InsufficientData);
    assert!(assessment
        .explanation
        .actions
        .iter()
        .any(|a| a == "Record missing data: Caries risk"));
}

#[test]
fn test_contributing_results_reaggregate() {
    for domain in Domain::ALL {
        let evaluator = domain.evaluator().unwrap();
        let assessment = evaluator.evaluate(&CaseInput::new()).unwrap();
        let again = aggregate(assessment.result.contributing.clone()).unwrap();
        assert_eq!(again.final_tier, assessment.result.final_tier, "{}", domain);
    }
}
