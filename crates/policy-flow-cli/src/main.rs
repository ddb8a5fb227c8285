// crates/policy-flow-cli/src/main.rs
// ============================================================================
// Module: Policy Flow CLI Entry Point
// Description: Command dispatcher for serving, validating, and executing policies.
// Purpose: Provide a local CLI over the Policy Flow server and control plane.
// Dependencies: clap, policy-flow-core, policy-flow-config, policy-flow-server, tokio
// ============================================================================

//! ## Overview
//! `policy-flow serve` runs the HTTP server from configuration. `validate`
//! and `execute` work offline on a candidate policy file using the same
//! control plane the server uses, backed by an in-memory store. Any failure
//! exits non-zero with the error on stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use policy_flow_config::MAX_EXECUTION_STEPS;
use policy_flow_config::PolicyFlowConfig;
use policy_flow_core::BlockId;
use policy_flow_core::ExecutionLimits;
use policy_flow_core::InMemoryPolicyStore;
use policy_flow_core::PolicyControlPlane;
use policy_flow_core::PolicyDraft;
use policy_flow_core::RawBindings;
use policy_flow_core::collect_bindings;
use policy_flow_server::PolicyServer;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum size of a policy file read by `validate` and `execute`.
const MAX_POLICY_FILE_BYTES: u64 = 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "policy-flow", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP policy server.
    Serve(ServeCommand),
    /// Check a candidate policy file for structural errors.
    Validate(ValidateCommand),
    /// Run a candidate policy file against variable bindings.
    Execute(ExecuteCommand),
}

/// Arguments for `serve`.
#[derive(clap::Args, Debug)]
struct ServeCommand {
    /// Path to policy-flow.toml (defaults to `POLICY_FLOW_CONFIG` or ./policy-flow.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `validate`.
#[derive(clap::Args, Debug)]
struct ValidateCommand {
    /// Candidate policy JSON file.
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

/// Arguments for `execute`.
#[derive(clap::Args, Debug)]
struct ExecuteCommand {
    /// Candidate policy JSON file.
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Variable binding, repeatable.
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    vars: Vec<(String, String)>,
    /// Override the traversal step limit (defaults to the block count).
    #[arg(long, value_name = "N")]
    max_steps: Option<usize>,
    /// Print the visited block path after the decision.
    #[arg(long)]
    trace: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Validate(command) => command_validate(&command),
        Commands::Execute(command) => command_execute(command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = PolicyFlowConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let server = tokio::task::spawn_blocking(move || PolicyServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    let addr = server.bind_addr().map_err(|err| CliError::new(err.to_string()))?;
    write_stderr_line(&format!("policy-flow: listening on http://{addr}"))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `validate` command.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    let draft = read_draft(&command.file)?;
    draft.validate().map_err(|err| CliError::new(format!("invalid policy: {err}")))?;
    write_stdout_line("valid").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `execute` command.
fn command_execute(command: ExecuteCommand) -> CliResult<ExitCode> {
    let limits = execution_limits(command.max_steps)?;
    let bindings = bindings_from_vars(command.vars)?;
    let draft = read_draft(&command.file)?;

    let control_plane = PolicyControlPlane::new(InMemoryPolicyStore::new(), limits);
    let policy = control_plane
        .create(draft)
        .map_err(|err| CliError::new(format!("invalid policy: {err}")))?;
    let outcome = control_plane
        .execute(&policy.id, &bindings)
        .map_err(|err| CliError::new(format!("{}: {err}", err.kind())))?;

    write_stdout_line(outcome.decision.as_str())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    if command.trace {
        let path: Vec<&str> = outcome.path.iter().map(BlockId::as_str).collect();
        write_stdout_line(&format!("path: {}", path.join(" -> ")))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Reads and parses a candidate policy file.
fn read_draft(path: &Path) -> CliResult<PolicyDraft> {
    let display = path.display();
    let metadata = fs::metadata(path)
        .map_err(|err| CliError::new(format!("failed to read {display}: {err}")))?;
    if metadata.len() > MAX_POLICY_FILE_BYTES {
        return Err(CliError::new(format!(
            "{display} exceeds the {MAX_POLICY_FILE_BYTES} byte policy size limit"
        )));
    }
    let bytes =
        fs::read(path).map_err(|err| CliError::new(format!("failed to read {display}: {err}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("Invalid policy format: {err}")))
}

/// Parses a `NAME=VALUE` binding argument.
fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (name, value) =
        raw.split_once('=').ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("variable name must not be empty in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Collects bindings, rejecting a name supplied twice.
fn bindings_from_vars(vars: Vec<(String, String)>) -> CliResult<RawBindings> {
    collect_bindings(vars).map_err(|err| CliError::new(format!("{}: {err}", err.kind())))
}

/// Builds execution limits from the optional `--max-steps` override.
fn execution_limits(max_steps: Option<usize>) -> CliResult<ExecutionLimits> {
    if let Some(steps) = max_steps
        && (steps == 0 || steps > MAX_EXECUTION_STEPS)
    {
        return Err(CliError::new(format!(
            "--max-steps must be between 1 and {MAX_EXECUTION_STEPS}"
        )));
    }
    Ok(ExecutionLimits {
        max_steps,
    })
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
