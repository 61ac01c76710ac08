//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use chairside_domain::{
    Assessment, CaseInput, ClassificationResult, FlagKind, InputValue, ReconciliationDecision, Rule, Tier,
};
use chairside_engine::range::{describe_band, format_value};
use chairside_engine::RuleSet;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self { format, color_enabled }
    }

    /// Format a local assessment.
    pub fn format_assessment(&self, assessment: &Assessment) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(assessment)?),
            OutputFormat::Table => Ok(self.assessment_table(assessment)),
            OutputFormat::Quiet => Ok(assessment.result.final_tier.to_string()),
        }
    }

    /// Format a reconciliation decision.
    pub fn format_decision(&self, decision: &ReconciliationDecision) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(decision)?),
            OutputFormat::Quiet => Ok(format!(
                "{} ({})",
                decision.final_result().final_tier,
                decision.authority
            )),
            OutputFormat::Table => {
                let header = format!("Authority: {} ({})", decision.authority, decision.reason);
                Ok(format!(
                    "{}\n\n{}",
                    self.colorize(&header, "cyan"),
                    self.assessment_table(&decision.assessment)
                ))
            }
        }
    }

    fn assessment_table(&self, assessment: &Assessment) -> String {
        let result = &assessment.result;
        let mut out = String::new();
        out.push_str(&format!(
            "Status: {}  (source: {})\n\n",
            self.tier(result.final_tier),
            assessment.source
        ));

        let mut builder = Builder::default();
        builder.push_record(["Signal", "Finding", "Tier", "Margin", "Rationale"]);
        for r in &result.all {
            builder.push_record([
                r.name.clone(),
                r.label.clone(),
                self.tier(r.tier),
                format_margin(r),
                r.rationale.clone(),
            ]);
        }
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        out.push_str(&table.to_string());

        if !assessment.explanation.summary.is_empty() {
            out.push_str("\n\nSummary:\n");
            for line in &assessment.explanation.summary {
                out.push_str(&format!("  {}\n", line));
            }
        }
        if !assessment.explanation.actions.is_empty() {
            out.push_str("\nRecommended actions:\n");
            for action in &assessment.explanation.actions {
                out.push_str(&format!("  - {}\n", action));
            }
        }
        out.trim_end().to_string()
    }

    /// Format a rule table.
    pub fn format_rules(&self, rules: &RuleSet) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "domain": rules.domain(),
                    "description": rules.description(),
                    "safety_triggers": rules.safety_triggers(),
                    "actions": rules.actions(),
                    "rules": rules.rules(),
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(rules
                .rules()
                .iter()
                .map(|r| r.key().to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => Ok(self.rules_table(rules)),
        }
    }

    fn rules_table(&self, rules: &RuleSet) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Rule", "Input", "Tier", "Finding"]);
        for rule in rules.rules() {
            let name = if rules.is_safety_trigger(rule.key()) {
                format!("{} (safety trigger)", rule.name())
            } else {
                rule.name().to_string()
            };
            match rule {
                Rule::Range(r) => {
                    for band in r.bands() {
                        builder.push_record([
                            name.clone(),
                            describe_band(band, r.unit()),
                            self.tier(band.tier),
                            band.label.clone(),
                        ]);
                    }
                }
                Rule::Flag(f) => match f.kind() {
                    FlagKind::Presence { present, absent } => {
                        builder.push_record([name.clone(), "present".to_string(), self.tier(present.tier), present.label.clone()]);
                        builder.push_record([name.clone(), "absent".to_string(), self.tier(absent.tier), absent.label.clone()]);
                    }
                    FlagKind::Categorical { categories, default } => {
                        for category in categories {
                            let value = match default {
                                Some(d) if category.matches(d) => format!("{} (default)", category.value),
                                _ => category.value.clone(),
                            };
                            builder.push_record([name.clone(), value, self.tier(category.tier), category.label.clone()]);
                        }
                    }
                },
            }
        }
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let mut out = format!("{}: {}\n\n", rules.domain(), rules.description());
        out.push_str(&table.to_string());
        out
    }

    /// Format the list of built-in domains.
    pub fn format_domains(&self, domains: &[(String, String, usize)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = domains
                    .iter()
                    .map(|(name, description, count)| {
                        serde_json::json!({"domain": name, "description": description, "rules": count})
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(domains
                .iter()
                .map(|(name, _, _)| name.clone())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Domain", "Description", "Rules"]);
                for (name, description, count) in domains {
                    builder.push_record([name.clone(), description.clone(), count.to_string()]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format the current inputs of a case.
    pub fn format_inputs(&self, case: &CaseInput) -> String {
        if case.is_empty() {
            return self.colorize("No inputs set.", "yellow");
        }
        case.iter()
            .map(|(key, value)| format!("  {} = {}", key, format_input(value)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format a tier, colored by severity.
    pub fn tier(&self, tier: Tier) -> String {
        let color = match tier {
            Tier::Normal => "green",
            Tier::Borderline => "yellow",
            Tier::Critical => "red",
        };
        self.colorize(tier.as_str(), color)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().bold().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn format_margin(result: &ClassificationResult) -> String {
    match result.margin {
        None => "-".to_string(),
        Some(m) if m > 0.0 => format!("+{}", format_value(m)),
        Some(m) => format_value(m),
    }
}

fn format_input(value: &InputValue) -> String {
    match value {
        InputValue::Bool(b) => b.to_string(),
        InputValue::Number(n) => format_value(*n),
        InputValue::Text(s) => format!("\"{}\"", s),
        InputValue::Missing => "null".to_string(),
    }
}
