//! Harvest configuration inspector
//!
//! Resolves the harvest policy and agent tunables from the given sources and
//! prints the effective snapshot together with where each value came from.
//!
//! # Usage
//!
//! ```bash
//! # Legacy properties and modern YAML together
//! cargo run --bin harvest-config -- --properties sip-communicator.properties --yaml ice4j.yaml
//!
//! # Machine-readable output
//! cargo run --bin harvest-config -- --yaml ice4j.yaml --format json
//!
//! # See which key won each setting
//! RUST_LOG=harvest_config=debug cargo run --bin harvest-config -- --yaml ice4j.yaml
//! ```

use clap::{Parser, ValueEnum};
use harvest_config::{AgentTunables, ConfigStore, EmptyStore, HarvestPolicy, PropertyStore, YamlStore};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "harvest-config")]
#[command(about = "Resolve and print the effective ICE harvest configuration", long_about = None)]
struct Cli {
    /// Legacy flat property file
    #[arg(short, long)]
    properties: Option<PathBuf>,

    /// Modern hierarchical YAML file
    #[arg(short, long)]
    yaml: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Serialize)]
struct Report<'a> {
    harvest: &'a HarvestPolicy,
    agent: &'a AgentTunables,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let legacy: Box<dyn ConfigStore> = match &cli.properties {
        Some(path) => Box::new(PropertyStore::from_file(path)?),
        None => Box::new(EmptyStore),
    };
    let modern = match &cli.yaml {
        Some(path) => YamlStore::from_file(path)?,
        None => YamlStore::from_value("modern", serde_yaml::Value::Mapping(Default::default())),
    };

    let policy = HarvestPolicy::resolve_checked(legacy.as_ref(), &modern)?;
    let tunables = AgentTunables::from_store(&modern)?;

    match cli.format {
        OutputFormat::Text => print_text(&policy, &tunables),
        OutputFormat::Json => {
            let report = Report {
                harvest: &policy,
                agent: &tunables,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Yaml => {
            let report = Report {
                harvest: &policy,
                agent: &tunables,
            };
            print!("{}", serde_yaml::to_string(&report)?);
        }
    }

    Ok(())
}

fn print_text(policy: &HarvestPolicy, tunables: &AgentTunables) {
    println!("=== Harvest Policy ===");
    println!("{}", policy.summary());
    if policy.dropped_address_entries() > 0 {
        println!("({} address entries dropped)", policy.dropped_address_entries());
    }
    println!();
    println!("{}", policy.provenance_summary());
    println!();
    println!("=== Agent Tunables ===");
    println!("consent freshness interval: {:?}", tunables.consent_freshness_interval);
    println!(
        "consent freshness wait: {:?}..{:?} (max {} retransmissions)",
        tunables.consent_freshness_original_wait_interval,
        tunables.consent_freshness_max_wait_interval,
        tunables.max_consent_freshness_retransmissions
    );
    println!("termination delay: {:?}", tunables.termination_delay);
    println!("max check list size: {}", tunables.max_check_list_size);
    println!("software: {}", tunables.software.as_deref().unwrap_or("(none)"));
}
