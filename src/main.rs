//! CLI entry point for `oragrant`.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use oragrant::manifest::Manifest;
use oragrant::memory::{CatalogSnapshot, MemoryAuthority};
use oragrant::output::formatter;
use oragrant::Client;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "oragrant",
    version,
    about = "Reconcile Oracle users, roles, directories and privilege grants against a declared desired state"
)]
struct Cli {
    /// Tracing filter directive, e.g. `info` or `oragrant=debug`
    #[arg(long, global = true, env = "ORAGRANT_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Converge a manifest against a catalog snapshot and write the resulting script and drift report
    Plan {
        /// Desired-state manifest (JSON)
        #[arg(long)]
        manifest: PathBuf,

        /// Catalog snapshot to plan against (JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Output directory
        #[arg(long, default_value = "oragrant-output")]
        output_dir: PathBuf,

        /// Base name of the output files; defaults to the manifest file stem
        #[arg(long)]
        name: Option<String>,

        /// Also write the converged catalog snapshot as `<name>_catalog.json`
        #[arg(long)]
        emit_catalog: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|e| {
        eprintln!("Invalid log level '{}': {e}", cli.log_level);
        process::exit(2);
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Plan {
            manifest,
            catalog,
            output_dir,
            name,
            emit_catalog,
        } => plan(manifest, catalog, output_dir, name, emit_catalog),
    }
}

fn plan(
    manifest_path: PathBuf,
    catalog_path: PathBuf,
    output_dir: PathBuf,
    name: Option<String>,
    emit_catalog: bool,
) {
    let manifest = match Manifest::load(&manifest_path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error reading manifest {}: {e}", manifest_path.display());
            process::exit(2);
        }
    };

    let snapshot = match CatalogSnapshot::load(&catalog_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading catalog {}: {e}", catalog_path.display());
            process::exit(2);
        }
    };

    let mut client = Client::new(MemoryAuthority::from_snapshot(&snapshot));
    let report = match client.converge(&manifest) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Converge failed: {e}");
            process::exit(2);
        }
    };

    let name = name.unwrap_or_else(|| {
        manifest_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("oragrant")
            .to_string()
    });

    if let Err(e) = formatter::write_output(&output_dir, &name, &report) {
        eprintln!("Error writing output: {e}");
        process::exit(2);
    }

    if emit_catalog {
        let path = output_dir.join(format!("{name}_catalog.json"));
        let written = serde_json::to_string_pretty(&client.session().snapshot())
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(&path, json).map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("Error writing {}: {e}", path.display());
            process::exit(2);
        }
    }

    tracing::info!(
        statements = report.statements.len(),
        drifted = report.drifted_grants(),
        "plan written"
    );

    // Exit code 1 signals drift
    if report.has_drift() {
        process::exit(1);
    }
}
