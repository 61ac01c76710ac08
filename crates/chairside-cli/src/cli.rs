//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};

/// Chairside CLI - Classify clinical measurements into risk tiers.
#[derive(Debug, Parser)]
#[command(name = "chairside")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CHAIRSIDE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (final tier only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a case file
    Evaluate(EvaluateArgs),

    /// Show a rule table
    Rules(RulesArgs),

    /// Validate a rule file
    Check(CheckArgs),

    /// List the built-in domains
    Domains,

    /// Enter interactive REPL mode
    Repl(ReplArgs),
}

/// Where to take rules from.
#[derive(Debug, Clone, Default, Args)]
pub struct RuleSourceArgs {
    /// Built-in domain (chairside, endodontic, implant, periodontal, orthodontic, triage)
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Rule file (TOML) instead of a built-in domain
    #[arg(short, long, conflicts_with = "domain")]
    pub rules: Option<String>,
}

/// Arguments for the evaluate command.
#[derive(Debug, Parser)]
pub struct EvaluateArgs {
    /// Case file (JSON object of field values), or '-' for stdin
    pub case: Option<String>,

    #[command(flatten)]
    pub source: RuleSourceArgs,

    /// Set or override a field (repeatable)
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// External assessment payload (JSON) to reconcile against
    #[arg(short, long)]
    pub external: Option<String>,
}

/// Arguments for the rules command.
#[derive(Debug, Parser)]
pub struct RulesArgs {
    #[command(flatten)]
    pub source: RuleSourceArgs,
}

/// Arguments for the check command.
#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Rule file to validate
    pub file: String,
}

/// Arguments for the repl command.
#[derive(Debug, Default, Parser)]
pub struct ReplArgs {
    #[command(flatten)]
    pub source: RuleSourceArgs,

    /// Case file to start from
    #[arg(long)]
    pub case: Option<String>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
