//! PyroLedger demo CLI
//!
//! Runs the carbon calculator on its own, prints the effective emission
//! factors, or walks one batch through its whole audited lifecycle up to a
//! publicly verified certificate. Everything runs against in-memory stores.
//!
//! Usage:
//!   cargo run -p pyroledger-demo -- run
//!   cargo run -p pyroledger-demo -- factors --config config/pyroledger.toml
//!   cargo run -p pyroledger-demo -- calculate --mass 450 --oil 360 --diesel 40

mod walkthrough;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pyroledger_carbon::{EmissionFactors, GhgCalculator};
use pyroledger_certify::CertificateConfig;
use pyroledger_contracts::{batch::BatchInputs, error::LedgerResult};

// ── CLI definition ────────────────────────────────────────────────────────────

/// PyroLedger: GHG accounting and certificate integrity for plastic pyrolysis.
#[derive(Parser)]
#[command(
    name = "pyroledger",
    about = "PyroLedger GHG accounting and certification demo",
    long_about = "Calculates avoided emissions for pyrolysis batches, records a field-level\n\
                  audit trail, and issues hash-sealed certificates that can be verified\n\
                  by code."
)]
struct Cli {
    /// TOML file with `[factors]` and `[certificate]` tables. Built-in
    /// defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Calculate the GHG balance of a single batch.
    Calculate {
        /// Feedstock mass in kilograms.
        #[arg(long)]
        mass: f64,
        /// Oil produced, in liters.
        #[arg(long)]
        oil: f64,
        /// Contamination percentage (0-100). Defaults to the configured value.
        #[arg(long)]
        contamination: Option<f64>,
        /// Diesel burned, in liters.
        #[arg(long)]
        diesel: Option<f64>,
        /// Process duration in hours; used when diesel is not given.
        #[arg(long)]
        hours: Option<f64>,
    },
    /// Print the effective emission factors.
    Factors,
    /// Walk one batch from creation to a verified certificate.
    Run,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=info to see audit and certificate events.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|(factors, certificate)| match cli.command {
        Command::Calculate {
            mass,
            oil,
            contamination,
            diesel,
            hours,
        } => {
            let mut inputs = BatchInputs::new(mass, oil);
            inputs.contamination_pct = contamination;
            inputs.diesel_l = diesel;
            inputs.duration_h = hours;
            run_calculate(factors, &inputs)
        }
        Command::Factors => {
            print_factors(&factors);
            Ok(())
        }
        Command::Run => {
            print_banner();
            walkthrough::run(factors, certificate)
        }
    });

    if let Err(e) = result {
        eprintln!("pyroledger error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> LedgerResult<(EmissionFactors, CertificateConfig)> {
    match path {
        Some(path) => {
            let factors = EmissionFactors::from_file(path)?;
            let certificate = CertificateConfig::from_file(path)?;
            info!(path = %path.display(), "configuration loaded");
            Ok((factors, certificate))
        }
        None => Ok((EmissionFactors::default(), CertificateConfig::default())),
    }
}

// ── Subcommands ───────────────────────────────────────────────────────────────

fn run_calculate(factors: EmissionFactors, inputs: &BatchInputs) -> LedgerResult<()> {
    let calc = GhgCalculator::new(factors)?;
    let ghg = calc.calculate(inputs)?;

    println!("GHG balance (kg CO2e)");
    println!("---------------------");
    println!("  effective carbon (kg C)    {:>12.3}", ghg.effective_carbon_kg);
    println!("  baseline (open burning)    {:>12.3}", ghg.baseline_total);
    println!("  process fuel               {:>12.3}", ghg.process_emissions);
    println!("  oil combustion             {:>12.3}", ghg.oil_combustion_emissions);
    println!("  char sequestration credit  {:>12.3}", -ghg.char_sequestration_credit);
    println!("  project total              {:>12.3}", ghg.project_total);
    println!("  avoided                    {:>12.3}", ghg.avoided);
    if ghg.avoided < 0.0 {
        println!();
        println!("  note: the project emits more than the open-burning baseline");
    }
    Ok(())
}

fn print_factors(factors: &EmissionFactors) {
    println!("[factors]");
    println!("polymer_carbon_fraction     = {}", factors.polymer_carbon_fraction);
    println!("open_burning_factor         = {}", factors.open_burning_factor);
    println!("diesel_combustion_factor    = {}", factors.diesel_combustion_factor);
    println!("oil_combustion_factor       = {}", factors.oil_combustion_factor);
    println!("char_sequestration_fraction = {}", factors.char_sequestration_fraction);
    println!("diesel_burn_rate_l_per_hour = {}", factors.diesel_burn_rate_l_per_hour);
    println!("default_contamination_pct   = {}", factors.default_contamination_pct);
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("PyroLedger — Batch Lifecycle Walk-through");
    println!("=========================================");
    println!();
    println!("Per batch:");
    println!("  [1] Every create / update / delete is diffed and written to the audit log");
    println!("  [2] Completion derives the GHG balance from the configured factors");
    println!("  [3] Issuance hashes the canonical fact document (SHA-256) under a fresh code");
    println!("  [4] The first public verification stamps verified_at exactly once");
    println!();
}
