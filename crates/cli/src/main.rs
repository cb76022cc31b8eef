// repd CLI - reconcile free-text project names against the REPD registry

mod exit_codes;
mod reconcile;
mod service;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use repd_config::{ConfigError, Settings};
use repd_io::RegistryFormat;
use repd_recon::ReconError;

use exit_codes::{config_exit_code, recon_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "repd")]
#[command(about = "Reconcile renewable-energy project names against the REPD registry")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: platform config dir, repd/settings.toml)
    #[arg(long, global = true, env = "REPD_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Registry file, overriding settings
    #[arg(long, global = true, env = "REPD_REGISTRY", value_name = "PATH")]
    registry: Option<PathBuf>,

    /// Registry format (sqlite or csv). Inferred from the extension when omitted.
    #[arg(long, global = true, value_name = "FORMAT")]
    format: Option<RegistryFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match one query or a batch of queries against the registry
    #[command(after_help = "\
Examples:
  repd reconcile --query 'Aberarder Wind Farm'
  repd reconcile --query 'Beauly Battery' --limit 5 --property 'MW Connected=50'
  repd reconcile --queries batch.json
  cat batch.json | repd reconcile --queries -")]
    Reconcile {
        /// Single free-text query (answered under key q0)
        #[arg(long, short = 'q', conflicts_with = "queries", required_unless_present = "queries")]
        query: Option<String>,

        /// Batch request JSON file, or - for stdin
        #[arg(long, value_name = "FILE")]
        queries: Option<PathBuf>,

        /// Max candidates for --query (1-100)
        #[arg(long, short = 'n', requires = "query")]
        limit: Option<usize>,

        /// Query property as PID=VALUE, for --query. Repeatable.
        #[arg(long = "property", short = 'p', value_name = "PID=VALUE", requires = "query")]
        properties: Vec<String>,

        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Print the reconciliation service manifest
    Manifest,

    /// Report whether the registry is reachable and how many projects it holds
    Health,

    /// Parse and validate a batch request without matching
    #[command(after_help = "\
Examples:
  repd validate batch.json
  cat batch.json | repd validate -")]
    Validate {
        /// Batch request JSON file, or - for stdin
        input: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  repd-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
        "\napi:     reconciliation 0.2",
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(CliError::config)?;

    if let Some(path) = cli.registry {
        settings.registry.path = Some(path);
    }
    if let Some(format) = cli.format {
        settings.registry.format = Some(format);
    }

    init_logging(&settings.logging.level);

    match cli.command {
        Commands::Reconcile { query, queries, limit, properties, compact } => {
            reconcile::cmd_reconcile(&settings, query, queries, limit, properties, compact)
        }
        Commands::Manifest => service::cmd_manifest(),
        Commands::Health => service::cmd_health(&settings),
        Commands::Validate { input } => reconcile::cmd_validate(&settings, input),
    }
}

/// Log to stderr so stdout stays a single JSON value. `RUST_LOG` beats settings.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::RegistryUnavailable(_) => {
                Some("check [registry] path in settings.toml or pass --registry".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Invalid(_) => Some(format!("default settings file: {}", Settings::config_path_display())),
            _ => None,
        };
        Self { code: config_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
