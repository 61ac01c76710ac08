//! Chairside CLI - Command-line interface for the clinical risk classification engine.

use chairside_cli::cli::ReplArgs;
use chairside_cli::commands;
use chairside_cli::repl;
use chairside_cli::{Cli, Command, Config, Formatter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> chairside_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays clean
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();

    // Load or create config
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|_| {
            let cfg = Config::default();
            cfg.save().ok();
            cfg
        }),
    };

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    // Handle commands
    match cli.command {
        None => repl::run_repl(ReplArgs::default(), &config, &formatter)?,
        Some(Command::Repl(args)) => repl::run_repl(args, &config, &formatter)?,
        Some(Command::Evaluate(args)) => commands::execute_evaluate(args, &config, &formatter)?,
        Some(Command::Rules(args)) => commands::execute_rules(args, &config, &formatter)?,
        Some(Command::Check(args)) => commands::execute_check(args, &formatter)?,
        Some(Command::Domains) => commands::execute_domains(&formatter)?,
    }

    Ok(())
}
