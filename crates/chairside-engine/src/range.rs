//! Range classification of numeric measurements
//!
//! Tie-break policy, applied identically to every rule:
//! - the ideal band is closed, so a value on its edge is Normal;
//! - a value on the edge shared by two non-ideal bands belongs to the
//!   outer, more severe band;
//! - "on the edge" means within [`EDGE_TOLERANCE`] of it, so the result
//!   never depends on floating-point rounding of a subtraction.
//!
//! Margin sign: positive when the value is short of the ideal band's
//! lower edge, negative when it is beyond the upper edge, zero inside.

use chairside_domain::{Band, CaseInput, ClassificationResult, Measurement, RangeRule, Reading, SignalStatus, Tier};

/// Absolute distance within which a value counts as lying on a band edge
pub const EDGE_TOLERANCE: f64 = 1e-9;

#[derive(Clone, Copy)]
enum Side {
    Below,
    Above,
}

/// Read the measurement a rule needs from a case
pub fn measure(rule: &RangeRule, case: &CaseInput) -> Measurement {
    Measurement::new(
        rule.name(),
        case.reading(&rule.source()),
        rule.unit().map(str::to_string),
    )
}

/// Classify a reading against a range rule
///
/// A missing reading, or one outside every band of a bounded rule, is
/// insufficient data (Borderline), never Normal.
pub fn classify(reading: Reading, rule: &RangeRule) -> ClassificationResult {
    let Reading::Value(value) = reading else {
        return ClassificationResult::insufficient_data(
            rule.key(),
            rule.name(),
            format!("Insufficient data: {} not recorded", rule.name()),
        );
    };

    let ideal = rule.ideal();
    let shown = with_unit(value, rule.unit());
    let range = describe_band(ideal, rule.unit());

    if within(value, ideal) {
        return ClassificationResult {
            source: rule.key().to_string(),
            name: rule.name().to_string(),
            label: ideal.label.clone(),
            tier: Tier::Normal,
            margin: Some(0.0),
            rationale: with_detail(format!("{} {} within the ideal range {}", rule.name(), shown, range), ideal),
            status: SignalStatus::Assessed,
        };
    }

    let (side, margin) = match (ideal.lower, ideal.upper) {
        (Some(lower), _) if value < lower => (Side::Below, lower - value),
        (_, Some(upper)) => (Side::Above, upper - value),
        // Unbounded upper with value not below lower is inside the band
        (_, None) => (Side::Below, 0.0),
    };

    let band = match side {
        Side::Below => locate(value, rule.below().collect(), side),
        Side::Above => locate(value, rule.above().collect(), side),
    };

    let Some(band) = band else {
        return ClassificationResult::insufficient_data(
            rule.key(),
            rule.name(),
            format!(
                "Insufficient data: {} {} is outside the recordable range {}",
                rule.name(),
                shown,
                recordable_range(rule),
            ),
        );
    };

    let words = match side {
        Side::Below => &rule.direction().below,
        Side::Above => &rule.direction().above,
    };
    let rationale = format!(
        "{} {}, {} {} the ideal range {}",
        rule.name(),
        shown,
        with_unit(margin.abs(), rule.unit()),
        words,
        range,
    );

    ClassificationResult {
        source: rule.key().to_string(),
        name: rule.name().to_string(),
        label: band.label.clone(),
        tier: band.tier,
        margin: Some(round_margin(margin)),
        rationale: with_detail(rationale, band),
        status: SignalStatus::Assessed,
    }
}

fn within(value: f64, band: &Band) -> bool {
    band.lower.map_or(true, |lower| value >= lower - EDGE_TOLERANCE)
        && band.upper.map_or(true, |upper| value <= upper + EDGE_TOLERANCE)
}

/// Walk outward from the ideal band and find the band holding `value`
///
/// `bands` is ordered nearest-first. A value on a band's outer edge
/// belongs to the next band out, unless there is none.
fn locate(value: f64, bands: Vec<&Band>, side: Side) -> Option<&Band> {
    for (i, &band) in bands.iter().enumerate() {
        let outer = match side {
            Side::Below => band.lower,
            Side::Above => band.upper,
        };
        let Some(edge) = outer else {
            return Some(band);
        };
        let past = match side {
            Side::Below => edge - value,
            Side::Above => value - edge,
        };
        if past < -EDGE_TOLERANCE {
            return Some(band);
        }
        if past <= EDGE_TOLERANCE {
            return Some(bands.get(i + 1).copied().unwrap_or(band));
        }
    }
    None
}

/// Margins this large carry no sub-micron detail, and scaling them would overflow
const ROUNDING_LIMIT: f64 = 1e9;

fn round_margin(margin: f64) -> f64 {
    if margin.abs() >= ROUNDING_LIMIT {
        return margin;
    }
    let rounded = (margin * 1e6).round() / 1e6;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn with_detail(rationale: String, band: &Band) -> String {
    match &band.detail {
        Some(detail) => format!("{}. {}", rationale, detail),
        None => rationale,
    }
}

fn recordable_range(rule: &RangeRule) -> String {
    let bands = rule.bands();
    let lower = bands.first().and_then(|b| b.lower);
    let upper = bands.last().and_then(|b| b.upper);
    describe_bounds(lower, upper, rule.unit())
}

/// Describe a band's extent, e.g. "0 to 3/10" or "at least 3 mm"
pub fn describe_band(band: &Band, unit: Option<&str>) -> String {
    describe_bounds(band.lower, band.upper, unit)
}

fn describe_bounds(lower: Option<f64>, upper: Option<f64>, unit: Option<&str>) -> String {
    match (lower, upper) {
        (Some(l), Some(u)) => format!("{} to {}", format_value(l), with_unit(u, unit)),
        (Some(l), None) => format!("at least {}", with_unit(l, unit)),
        (None, Some(u)) => format!("at most {}", with_unit(u, unit)),
        (None, None) => "any value".to_string(),
    }
}

/// Format a number with at most two decimals and no trailing zeros
pub fn format_value(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Format a number followed by its unit
pub fn with_unit(value: f64, unit: Option<&str>) -> String {
    match unit {
        Some(u) if u.starts_with('/') => format!("{}{}", format_value(value), u),
        Some(u) => format!("{} {}", format_value(value), u),
        None => format_value(value),
    }
}
