//! SpecConfig CLI
//!
//! Builds the pet demo configuration from a JSON file with environment
//! overrides and prints the result, diagnostics, and provenance snapshot.

mod pet;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use specconfig_core::{
    BuildOptions, BuildResult, ConfigLoader, DiagnosticsReport, EnvironmentProvider,
    ErrorHandlingMode, JsonProvider, LayeredReader, ProvenanceReporter, Snapshot,
};
use tracing::{info, Level};

use pet::{DemoContextProvider, PetConfig};

#[derive(Parser)]
#[command(name = "specconfig")]
#[command(author = "SpecConfig Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Typed configuration binding with diagnostics and provenance")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the pet configuration and report the outcome
    Build(BuildArgs),

    /// List the configuration keys and their environment variable names
    Keys {
        /// Prefix prepended to environment variable names
        #[arg(long, env = "SPECCONFIG_ENV_PREFIX")]
        env_prefix: Option<String>,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct BuildArgs {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Stop at the first error instead of collecting all of them
    #[arg(long, env = "SPECCONFIG_FAIL_FAST")]
    fail_fast: bool,

    /// Ignore environment variable overrides
    #[arg(long)]
    no_env: bool,

    /// Prefix prepended to environment variable names
    #[arg(long, env = "SPECCONFIG_ENV_PREFIX")]
    env_prefix: Option<String>,

    /// Force night time on or off instead of reading the clock
    #[arg(long, value_enum, default_value_t = NightMode::Auto)]
    night: NightMode,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum NightMode {
    On,
    Off,
    Auto,
}

impl NightMode {
    fn as_override(self) -> Option<bool> {
        match self {
            NightMode::On => Some(true),
            NightMode::Off => Some(false),
            NightMode::Auto => None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    specconfig_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Build(args) => cmd_build(&args),
        Commands::Keys { env_prefix } => cmd_keys(env_prefix.as_deref()),
    }
}

fn cmd_build(args: &BuildArgs) -> Result<()> {
    let context = Arc::new(DemoContextProvider::new());
    let (result, output) = run_build(args, context)?;
    println!("{output}");

    if result.is_success() {
        Ok(())
    } else {
        anyhow::bail!(
            "configuration build failed with {} error(s)",
            result.diagnostics().error_count()
        )
    }
}

fn run_build(
    args: &BuildArgs,
    context: Arc<DemoContextProvider>,
) -> Result<(BuildResult<PetConfig>, String)> {
    let reporter = Arc::new(ProvenanceReporter::new());
    let reader = load_reader(
        &args.config,
        (!args.no_env).then(|| environment(args.env_prefix.as_deref())),
    )?
    .with_reporter(reporter.clone());

    context.set_night_override(args.night.as_override());
    context.record_reload();

    let mode = if args.fail_fast {
        ErrorHandlingMode::FailFast
    } else {
        ErrorHandlingMode::CollectAll
    };
    let options = BuildOptions::new()
        .with_error_handling(mode)
        .with_provenance_reporter(reporter)
        .with_context_provider(context.clone());

    info!(config = %args.config.display(), mode = mode.as_str(), "Building pet configuration");
    let loader = ConfigLoader::new(pet::profile(), reader, options);
    let result = loader.build();

    let output = match args.format {
        OutputFormat::Text => render_text(&result, &context.summary()),
        OutputFormat::Json => render_json(&result, &context.summary())?,
    };
    Ok((result, output))
}

fn environment(prefix: Option<&str>) -> EnvironmentProvider {
    match prefix {
        Some(prefix) => EnvironmentProvider::new().with_prefix(prefix),
        None => EnvironmentProvider::new(),
    }
}

fn load_reader(path: &Path, environment: Option<EnvironmentProvider>) -> Result<LayeredReader> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file = JsonProvider::from_json_str(name, &text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    Ok(match environment {
        Some(env) => LayeredReader::with_environment_overrides(file, env),
        None => LayeredReader::new().with_provider(file),
    })
}

fn cmd_keys(prefix: Option<&str>) -> Result<()> {
    let env = environment(prefix);
    for binding in pet::profile().bindings() {
        let marker = if binding.is_secret() { " (secret)" } else { "" };
        println!("{:<20} {}{}", binding.key(), env.var_name(binding.key()), marker);
    }
    Ok(())
}

#[derive(Serialize)]
struct BuildReport<'a> {
    success: bool,
    config: Option<&'a PetConfig>,
    context: &'a str,
    fingerprint: String,
    diagnostics: &'a DiagnosticsReport,
    snapshot: &'a Snapshot,
}

fn render_json(result: &BuildResult<PetConfig>, context: &str) -> Result<String> {
    let report = BuildReport {
        success: result.is_success(),
        config: result.final_value(),
        context,
        fingerprint: result.snapshot().fingerprint(),
        diagnostics: result.diagnostics(),
        snapshot: result.snapshot(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn render_text(result: &BuildResult<PetConfig>, context: &str) -> String {
    let snapshot = result.snapshot();
    let mut lines = vec![
        format!("Build ID: {}", snapshot.build_id()),
        format!(
            "Status: {}",
            if result.is_success() { "✓ PASSED" } else { "✗ FAILED" }
        ),
        format!("Context: {context}"),
    ];

    if let Some(config) = result.final_value() {
        let state = if config.is_sleeping { "sleeping" } else { "awake" };
        lines.push(format!("Pet: {} ({state})", config.pet_name));
    }

    lines.push(String::new());
    lines.push("Resolved values:".to_string());
    for value in snapshot.resolved_values() {
        lines.push(format!(
            "  {} = {} ({})",
            value.key(),
            value.display_value(),
            value.provenance()
        ));
    }

    if !snapshot.decision_traces().is_empty() {
        lines.push("Decisions:".to_string());
        for trace in snapshot.decision_traces() {
            lines.push(format!(
                "  {} <- #{} {}",
                trace.key, trace.matched_index, trace.decision_name
            ));
        }
    }

    let diagnostics = result.diagnostics();
    if !diagnostics.is_empty() {
        lines.push(format!(
            "Diagnostics ({} error(s), {} warning(s)):",
            diagnostics.error_count(),
            diagnostics.warning_count()
        ));
        for line in diagnostics.formatted_lines() {
            lines.push(format!("  - {line}"));
        }
    }

    lines.push(format!("Fingerprint: {}", snapshot.fingerprint()));
    lines.join("\n")
}
