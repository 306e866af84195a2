//! crdt-compat
//!
//! # Commands
//!
//! - `fixtures` - Write update/snapshot/shallow-snapshot fixtures
//! - `awareness-fixtures` - Write awareness encoding fixtures
//! - `verify` - Run an implementation under test and check its artifacts

use clap::{Parser, Subcommand};
use crdt_compat::fixtures::{awareness_fixtures, document_fixtures, write_fixtures};
use crdt_compat::{Check, CommandSpec, HarnessConfig, HarnessError, Verifier};
use crdt_compat_core::ReplicaEngine;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Fixture emitter and compatibility verifier.
#[derive(Parser)]
#[command(name = "crdt-compat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write document export fixtures
    Fixtures {
        /// Output file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Write awareness fixtures
    AwarenessFixtures {
        /// Output file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Verify the artifacts printed by an implementation under test
    Verify {
        /// Which artifacts to check
        #[arg(value_enum)]
        check: Check,

        /// Command to run, one argument per flag
        #[arg(long = "command", allow_hyphen_values = true)]
        command: Vec<String>,

        /// Working directory for the command
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Kill the command after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

fn run(cli: Cli) -> Result<(), HarnessError> {
    let mut config = match &cli.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };

    match cli.command {
        Commands::Fixtures { out } => {
            let path = out.unwrap_or(config.document_fixtures);
            write_fixtures(&path, &document_fixtures(&ReplicaEngine)?)?;
            println!("Wrote fixtures to {}", path.display());
        }
        Commands::AwarenessFixtures { out } => {
            let path = out.unwrap_or(config.awareness_fixtures);
            write_fixtures(&path, &awareness_fixtures()?)?;
            println!("Wrote fixtures to {}", path.display());
        }
        Commands::Verify {
            check,
            command,
            cwd,
            timeout_secs,
        } => {
            if let Some(secs) = timeout_secs {
                config.timeout_secs = secs;
                config.validate()?;
            }
            let argv = if command.is_empty() {
                config.command_for(check).to_vec()
            } else {
                command
            };
            let mut cmd = CommandSpec::from_argv(&argv, config.timeout())?;
            if let Some(dir) = cwd.or(config.cwd) {
                cmd = cmd.cwd(dir);
            }
            let message = Verifier::new(ReplicaEngine).verify_command(check, &cmd)?;
            println!("{message}");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
