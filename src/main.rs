//! Component Architect binary entry point.
//!
//! Subcommands:
//! - `generate <prompt>`: one session, code written to a file
//! - `session`: interactive create-then-edit loop
//! - `validate <file>`: run the rule engine on existing code
//!
//! All logs go to stderr; stdout carries results and the interactive prompt.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::filter::EnvFilter;

use component_architect::anthropic::AnthropicClient;
use component_architect::config::{Config, DEFAULT_LOG_LEVEL};
use component_architect::controller::{
    AttemptResult, OutcomeStatus, RetryController, SessionOutcome,
};
use component_architect::error::{AppError, ConfigError};
use component_architect::session::ComponentSession;
use component_architect::tokens::DesignSystem;
use component_architect::validator::Validator;

#[derive(Parser, Debug)]
#[command(
    name = "component-architect",
    about = "Generate design-system compliant UI components",
    version
)]
struct Cli {
    #[arg(
        long,
        env = "DESIGN_SYSTEM_PATH",
        value_name = "FILE",
        help = "Design-token JSON document",
        global = true
    )]
    design_system: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one component from a description.
    Generate {
        /// What the component should look like and do.
        prompt: String,

        #[arg(
            short,
            long,
            value_name = "FILE",
            default_value = "output/component.ts",
            help = "Where to write the generated code"
        )]
        output: PathBuf,

        #[arg(long, value_name = "FILE", help = "Also write the session outcome as JSON")]
        report: Option<PathBuf>,

        #[arg(short, long, help = "Print nothing but errors")]
        quiet: bool,
    },

    /// Create a component, then refine it with follow-up edits.
    Session {
        #[arg(
            short,
            long,
            value_name = "FILE",
            default_value = "output/session.component.ts",
            help = "Where to write the current component after each turn"
        )]
        output: PathBuf,

        #[arg(
            long,
            value_name = "FILE",
            default_value = "output/session-history.json",
            help = "Where to save the turn history on exit"
        )]
        history: PathBuf,
    },

    /// Check an existing component file against the rules.
    Validate {
        /// Component source file.
        file: PathBuf,

        #[arg(long, help = "Also run the unsafe-API rule (on anyway with SECURITY_RULES)")]
        security: bool,

        #[arg(
            long = "allow-origin",
            value_name = "ORIGIN",
            value_delimiter = ',',
            help = "Origins requests may target, added to ALLOWED_ORIGINS"
        )]
        allowed_origins: Vec<String>,
    },
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = Config::from_env_without_key();
    let log_level = settings
        .as_ref()
        .map_or(DEFAULT_LOG_LEVEL, |config| config.log_level.as_str());

    // Logs to stderr so stdout stays clean for results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    match run(cli, settings).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, settings: Result<Config, ConfigError>) -> Result<ExitCode, AppError> {
    match cli.command {
        Command::Generate {
            prompt,
            output,
            report,
            quiet,
        } => {
            let controller = build_controller(cli.design_system)?;
            let (cancel, watcher) = cancel_on_ctrl_c();
            let result = controller.run(&prompt, &cancel).await;
            watcher.abort();
            let outcome = result?;

            if let Some(code) = outcome.best_effort_code() {
                write_file(&output, code).await?;
            }
            if let Some(report) = report {
                write_file(&report, &serde_json::to_string_pretty(&outcome)?).await?;
            }
            if !quiet {
                print_summary(&outcome, &output);
            }
            Ok(exit_code(&outcome))
        }
        Command::Session { output, history } => {
            let controller = build_controller(cli.design_system)?;
            run_session(ComponentSession::new(controller), &output, &history).await
        }
        Command::Validate {
            file,
            security,
            allowed_origins,
        } => {
            let config = settings?.with_security_overrides(security, allowed_origins);
            let path = cli
                .design_system
                .unwrap_or_else(|| PathBuf::from(&config.design_system_path));
            let tokens = DesignSystem::load(&path)?;
            let code = tokio::fs::read_to_string(&file).await?;

            let validator = Validator::from_config(&config);
            let findings = validator.validate(&code, &tokens);

            if findings.is_empty() {
                println!("{}: valid ({} rules)", file.display(), validator.len());
                return Ok(ExitCode::SUCCESS);
            }
            println!("{}: {} finding(s)", file.display(), findings.len());
            for finding in &findings {
                println!("  - {finding}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn build_controller(
    design_system: Option<PathBuf>,
) -> Result<RetryController<AnthropicClient>, AppError> {
    let config = Config::from_env()?;
    let path = design_system.unwrap_or_else(|| PathBuf::from(&config.design_system_path));
    let tokens = Arc::new(DesignSystem::load(&path)?);

    tracing::info!(
        model = %config.model,
        design_system = %path.display(),
        tokens = tokens.len(),
        max_attempts = config.max_attempts(),
        timeout_ms = config.request_timeout_ms,
        security_rules = config.security_rules,
        "Configuration loaded"
    );

    let client = AnthropicClient::new(config.api_key.clone(), config.client_config())?;
    let validator = Arc::new(Validator::from_config(&config));
    Ok(RetryController::new(
        client,
        validator,
        tokens,
        config.controller_config(),
    ))
}

/// A fresh token that Ctrl-C cancels while the watcher runs.
fn cancel_on_ctrl_c() -> (CancellationToken, JoinHandle<()>) {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, cancelling");
            trigger.cancel();
        }
    });
    (cancel, watcher)
}

async fn run_session(
    mut session: ComponentSession<AnthropicClient>,
    output: &Path,
    history: &Path,
) -> Result<ExitCode, AppError> {
    println!("Component Architect: multi-turn session");
    println!("Commands: 'use <id>' | 'save <path>' | 'history' | 'quit'");
    println!("Anything else is a description (first turn) or an edit instruction.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if session.current().is_none() {
            print!("Describe the component to create:\n> ");
        } else {
            print!("\nFollow-up edit (or 'quit'):\n> ");
        }
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let input = line.trim();
        let lowered = input.to_lowercase();

        if input.is_empty() {
            continue;
        }
        if lowered == "quit" || lowered == "exit" {
            break;
        }
        if lowered == "history" {
            print_history(&session);
            continue;
        }
        if let Some(id) = lowered.strip_prefix("use ") {
            match session.use_artifact(id.trim()) {
                Ok(artifact) => println!("Now editing {}", artifact.id),
                Err(e) => println!("{e}"),
            }
            continue;
        }
        if lowered.starts_with("save ") {
            let path = PathBuf::from(input.get(5..).unwrap_or_default().trim());
            match session.current_code() {
                Some(code) => {
                    write_file(&path, code).await?;
                    println!("Saved to {}", path.display());
                }
                None => println!("Nothing to save yet"),
            }
            continue;
        }

        let (cancel, watcher) = cancel_on_ctrl_c();
        let result = if session.current().is_none() {
            session.create(input, &cancel).await
        } else {
            session.edit(input, None, &cancel).await
        };
        watcher.abort();

        match result {
            Ok(outcome) => {
                if let Some(code) = session.current_code() {
                    write_file(output, code).await?;
                }
                print_summary(&outcome, output);
                if let Some(artifact) = session.current() {
                    println!("Current artifact: {}", artifact.id);
                }
            }
            Err(e) => println!("{e}"),
        }
    }

    session.save_history(history).await?;
    println!("\nSession ended. History saved to {}", history.display());
    Ok(ExitCode::SUCCESS)
}

fn print_history(session: &ComponentSession<AnthropicClient>) {
    if session.history().is_empty() {
        println!("  (no turns yet)");
    }
    for (i, entry) in session.history().iter().enumerate() {
        let prompt: String = entry.prompt.chars().take(60).collect();
        println!(
            "  {}. [{:?}] {} -> {} ({}, {} attempt(s))",
            i + 1,
            entry.kind,
            prompt,
            entry.artifact.as_deref().unwrap_or("-"),
            entry.status,
            entry.attempts
        );
    }
}

fn print_summary(outcome: &SessionOutcome, output: &Path) {
    println!(
        "\nStatus: {} after {} attempt(s)",
        outcome.status,
        outcome.attempts_used()
    );
    for attempt in &outcome.attempts {
        let verdict = match (&attempt.result, attempt.findings.len()) {
            (AttemptResult::Cancelled, _) => "cancelled".to_string(),
            (_, 0) => "passed".to_string(),
            (_, n) => format!("{n} finding(s)"),
        };
        println!(
            "  Attempt {}: {verdict} ({} ms)",
            attempt.index, attempt.elapsed_ms
        );
    }
    if !outcome.success {
        for finding in outcome.last_findings() {
            println!("    - {finding}");
        }
    }
    match outcome.best_effort_code() {
        Some(_) if outcome.success => println!("Component written to {}", output.display()),
        Some(_) => println!(
            "Last candidate written to {} (did not pass validation)",
            output.display()
        ),
        None => println!("No code was produced"),
    }
}

fn exit_code(outcome: &SessionOutcome) -> ExitCode {
    match outcome.status {
        OutcomeStatus::Accepted => ExitCode::SUCCESS,
        OutcomeStatus::Cancelled => ExitCode::from(130),
        OutcomeStatus::Exhausted | OutcomeStatus::Aborted => ExitCode::from(2),
    }
}

async fn write_file(path: &Path, contents: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    Ok(())
}
