//! Worst-of aggregation

use crate::error::EngineError;
use chairside_domain::{AggregateResult, ClassificationResult};

/// Combine per-signal results into one case result
///
/// The final tier is the most severe tier present. Every result at that
/// tier contributes, in input order. An empty input is an error: a case
/// always has at least one evaluated signal.
pub fn aggregate(results: Vec<ClassificationResult>) -> Result<AggregateResult, EngineError> {
    let final_tier = results
        .iter()
        .map(|r| r.tier)
        .max()
        .ok_or(EngineError::EmptyAggregate)?;
    Ok(AggregateResult::from_parts(final_tier, results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chairside_domain::{SignalStatus, Tier};

    fn result(source: &str, tier: Tier) -> ClassificationResult {
        ClassificationResult {
            source: source.to_string(),
            name: source.to_string(),
            label: source.to_string(),
            tier,
            margin: None,
            rationale: format!("{} is {}", source, tier),
            status: SignalStatus::Assessed,
        }
    }

    #[test]
    fn test_single_critical_dominates() {
        let aggregate = aggregate(vec![
            result("a", Tier::Normal),
            result("b", Tier::Critical),
            result("c", Tier::Normal),
        ])
        .unwrap();
        assert_eq!(aggregate.final_tier, Tier::Critical);
        assert_eq!(aggregate.contributing.len(), 1);
        assert_eq!(aggregate.contributing[0].source, "b");
    }

    #[test]
    fn test_all_contributors_reported() {
        let aggregate = aggregate(vec![
            result("pain_score", Tier::Borderline),
            result("fever", Tier::Normal),
            result("anticoagulants", Tier::Borderline),
        ])
        .unwrap();
        assert_eq!(aggregate.final_tier, Tier::Borderline);
        let sources: Vec<_> = aggregate.contributing.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["pain_score", "anticoagulants"]);
    }

    #[test]
    fn test_all_normal() {
        let aggregate = aggregate(vec![result("a", Tier::Normal), result("b", Tier::Normal)]).unwrap();
        assert_eq!(aggregate.final_tier, Tier::Normal);
        assert_eq!(aggregate.contributing.len(), 2);
    }

    #[test]
    fn test_empty_is_error() {
        assert!(matches!(aggregate(Vec::new()), Err(EngineError::EmptyAggregate)));
    }

    #[test]
    fn test_contributing_reaggregates_to_same_tier() {
        let first = aggregate(vec![
            result("a", Tier::Borderline),
            result("b", Tier::Normal),
            result("c", Tier::Borderline),
        ])
        .unwrap();
        let again = aggregate(first.contributing.clone()).unwrap();
        assert_eq!(again.final_tier, first.final_tier);
    }
}
