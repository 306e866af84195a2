//! Prints the protocol artifacts for the bundled engine's build of the
//! expected documents.
//!
//! Without flags: `updates <hex>` and `snapshot <hex>`. With `--large`:
//! `snapshot_large <hex>`.

use clap::Parser;
use crdt_compat::protocol::artifact_line;
use crdt_compat::Check;
use crdt_compat_core::{ExportMode, ReplicaEngine};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "compat-export")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print the large two-peer snapshot instead
    #[arg(long)]
    large: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.large {
        let doc = Check::Large.expected_doc(&ReplicaEngine)?;
        println!("{}", artifact_line("snapshot_large", &doc.export(&ExportMode::Snapshot)?));
    } else {
        let doc = Check::Exports.expected_doc(&ReplicaEngine)?;
        println!("{}", artifact_line("updates", &doc.export(&ExportMode::Update)?));
        println!("{}", artifact_line("snapshot", &doc.export(&ExportMode::Snapshot)?));
    }
    Ok(())
}
