//! Interactive REPL (Read-Eval-Print Loop) mode.
//!
//! The REPL keeps one case open and re-evaluates it on every change, the
//! way a clinical form recomputes its status as fields are filled in.

use crate::cli::ReplArgs;
use crate::commands::{load_rules, parse_assignment, read_case, read_external};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use chairside_domain::InputValue;
use chairside_engine::{CaseSession, Evaluator};
use chairside_presets::Domain;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// Run the interactive REPL.
pub fn run_repl(args: ReplArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let rules = load_rules(&args.source, config)?;
    let inputs = read_case(args.case.as_deref())?;
    let mut session = CaseSession::new(Evaluator::new(rules), inputs)?;

    println!(
        "{}",
        formatter.info("Chairside REPL - Type 'help' for commands, 'exit' to quit")
    );
    println!();

    // Initialize readline editor
    let editor_config = rustyline::Config::builder()
        .max_history_size(config.settings.history_size)
        .map_err(editor_error)?
        .build();
    let mut editor = DefaultEditor::with_config(editor_config).map_err(editor_error)?;

    // Load history
    let history_path = get_history_path()?;
    let _ = editor.load_history(&history_path);

    loop {
        let prompt = format!(
            "{} ({})> ",
            session.evaluator().rules().domain(),
            session.assessment().result.final_tier
        );

        match editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                editor.add_history_entry(line).ok();

                match parse_repl_command(line) {
                    Ok(ReplCommand::Exit) => {
                        println!("{}", formatter.info("Goodbye!"));
                        break;
                    }
                    Ok(ReplCommand::Help) => {
                        print_help(formatter);
                    }
                    Ok(cmd) => {
                        if let Err(e) = execute_repl_command(cmd, &mut session, formatter) {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                    }
                    Err(e) => {
                        eprintln!("{}", formatter.error(&e.to_string()));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use 'exit' to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    // Save history
    editor.save_history(&history_path).ok();

    Ok(())
}

/// REPL command type.
#[derive(Debug, PartialEq)]
enum ReplCommand {
    Exit,
    Help,
    Set(String, InputValue),
    Unset(String),
    Show,
    Inputs,
    External(String),
    Clear,
    Rules,
    Domain(Domain),
}

/// Parse a REPL command line.
fn parse_repl_command(line: &str) -> Result<ReplCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.is_empty() {
        return Err(CliError::InvalidInput("Empty command".to_string()));
    }

    match parts[0] {
        "exit" | "quit" | "q" => Ok(ReplCommand::Exit),
        "help" | "?" => Ok(ReplCommand::Help),
        "set" => parse_set_command(&parts[1..]),
        "unset" => match parts.get(1) {
            Some(key) => Ok(ReplCommand::Unset(key.to_string())),
            None => Err(CliError::InvalidInput("Usage: unset <field>".to_string())),
        },
        "show" => Ok(ReplCommand::Show),
        "inputs" => Ok(ReplCommand::Inputs),
        "external" => match parts.get(1) {
            Some(path) => Ok(ReplCommand::External(path.to_string())),
            None => Err(CliError::InvalidInput("Usage: external <file>".to_string())),
        },
        "clear" => Ok(ReplCommand::Clear),
        "rules" => Ok(ReplCommand::Rules),
        "domain" => match parts.get(1) {
            Some(name) => Ok(ReplCommand::Domain(name.parse()?)),
            None => Err(CliError::InvalidInput("Usage: domain <name>".to_string())),
        },
        _ => Err(CliError::InvalidInput(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            parts[0]
        ))),
    }
}

/// Accepts both `set key value` and `set key=value`.
fn parse_set_command(args: &[&str]) -> Result<ReplCommand> {
    let usage = || CliError::InvalidInput("Usage: set <field> <value>".to_string());
    match args {
        [] => Err(usage()),
        [assignment] if assignment.contains('=') => {
            let (key, value) = parse_assignment(assignment)?;
            Ok(ReplCommand::Set(key, value))
        }
        [_] => Err(usage()),
        [key, value @ ..] => Ok(ReplCommand::Set(
            key.to_string(),
            InputValue::parse_loose(&value.join(" ")),
        )),
    }
}

/// Execute a REPL command against the open case.
fn execute_repl_command(cmd: ReplCommand, session: &mut CaseSession, formatter: &Formatter) -> Result<()> {
    match cmd {
        ReplCommand::Set(key, value) => {
            let assessment = session.set(key, value)?;
            println!("{}", formatter.format_assessment(assessment)?);
        }
        ReplCommand::Unset(key) => {
            if session.inputs().get(&key).is_none() {
                println!("{}", formatter.warning(&format!("'{}' is not set", key)));
                return Ok(());
            }
            let assessment = session.unset(&key)?;
            println!("{}", formatter.format_assessment(assessment)?);
        }
        ReplCommand::Show => {
            println!("{}", formatter.format_assessment(session.assessment())?);
        }
        ReplCommand::Inputs => {
            println!("{}", formatter.format_inputs(session.inputs()));
        }
        ReplCommand::External(path) => {
            let ticket = session.ticket();
            let outcome = read_external(&path);
            match session.apply_external(ticket, outcome) {
                Some(decision) => println!("{}", formatter.format_decision(&decision)?),
                None => println!("{}", formatter.warning("Case changed; external assessment discarded")),
            }
        }
        ReplCommand::Clear => {
            let assessment = session.replace(Default::default())?;
            println!("{}", formatter.success("Inputs cleared"));
            println!("{}", formatter.format_assessment(assessment)?);
        }
        ReplCommand::Rules => {
            println!("{}", formatter.format_rules(session.evaluator().rules())?);
        }
        ReplCommand::Domain(domain) => {
            let evaluator = domain.evaluator()?;
            let unused = evaluator.unused_fields(session.inputs());
            if !unused.is_empty() {
                println!(
                    "{}",
                    formatter.warning(&format!("Fields no rule reads: {}", unused.join(", ")))
                );
            }
            *session = CaseSession::new(evaluator, session.inputs().clone())?;
            println!("{}", formatter.success(&format!("Switched to {}", domain)));
            println!("{}", formatter.format_assessment(session.assessment())?);
        }
        ReplCommand::Exit | ReplCommand::Help => {}
    }

    Ok(())
}

fn editor_error(e: ReadlineError) -> CliError {
    CliError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("Failed to initialize editor: {}", e),
    ))
}

fn get_history_path() -> Result<PathBuf> {
    let dir = Config::dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("history.txt"))
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  set <field> <value>      - Set a field (or set field=value)");
    println!("    values: true, false, numbers, or text for a dropdown");
    println!("  unset <field>            - Clear a field");
    println!("  show                     - Show the current assessment");
    println!("  inputs                   - List the fields set so far");
    println!("  external <file>          - Reconcile with an external assessment (JSON)");
    println!("  clear                    - Clear every field");
    println!("  rules                    - Show the rule table");
    println!("  domain <name>            - Switch domain, keeping the inputs");
    println!("  help, ?                  - Show this help");
    println!("  exit, quit, q            - Exit REPL");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use chairside_domain::{CaseInput, Tier};

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_repl_command("exit").unwrap(), ReplCommand::Exit);
        assert_eq!(parse_repl_command("?").unwrap(), ReplCommand::Help);
        assert_eq!(parse_repl_command("show").unwrap(), ReplCommand::Show);
        assert_eq!(
            parse_repl_command("domain perio").unwrap(),
            ReplCommand::Domain(Domain::Periodontal)
        );
        assert!(parse_repl_command("frobnicate").is_err());
        assert!(parse_repl_command("domain dermatology").is_err());
        assert!(parse_repl_command("external").is_err());
    }

    #[test]
    fn test_parse_set_forms() {
        assert_eq!(
            parse_repl_command("set pain_score 8").unwrap(),
            ReplCommand::Set("pain_score".to_string(), InputValue::Number(8.0))
        );
        assert_eq!(
            parse_repl_command("set fever=true").unwrap(),
            ReplCommand::Set("fever".to_string(), InputValue::Bool(true))
        );
        assert_eq!(
            parse_repl_command("set asa_class II").unwrap(),
            ReplCommand::Set("asa_class".to_string(), InputValue::Text("II".to_string()))
        );
        assert!(parse_repl_command("set").is_err());
        assert!(parse_repl_command("set pain_score").is_err());
    }

    #[test]
    fn test_execute_updates_session() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let evaluator = Domain::Chairside.evaluator().unwrap();
        let mut session = CaseSession::new(evaluator, CaseInput::new().with("pain_score", 1.0)).unwrap();

        execute_repl_command(
            ReplCommand::Set("pain_score".to_string(), InputValue::Number(9.0)),
            &mut session,
            &formatter,
        )
        .unwrap();
        assert_eq!(session.assessment().result.final_tier, Tier::Critical);

        execute_repl_command(ReplCommand::Domain(Domain::Triage), &mut session, &formatter).unwrap();
        assert_eq!(session.evaluator().rules().domain(), "triage");
        assert_eq!(session.inputs().get("pain_score"), Some(&InputValue::Number(9.0)));

        execute_repl_command(ReplCommand::Clear, &mut session, &formatter).unwrap();
        assert!(session.inputs().is_empty());
    }

    #[test]
    fn test_rejected_set_keeps_previous_case() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let evaluator = Domain::Chairside.evaluator().unwrap();
        let mut session = CaseSession::new(evaluator, CaseInput::new().with("pain_score", 2.0)).unwrap();

        let result = execute_repl_command(
            ReplCommand::Set("swelling".to_string(), InputValue::Text("maybe".to_string())),
            &mut session,
            &formatter,
        );
        assert!(result.is_err());
        assert!(session.inputs().get("swelling").is_none());
        assert_eq!(session.generation(), 0);
    }
}
