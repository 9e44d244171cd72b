use anyhow::{Context, Result};
use clap::Parser;
use lca_schemas::calc_setup::{CalculationSetup, ParameterRedef};
use lca_schemas::linking::{PreferredType, ProviderLinking};
use serde::Deserialize;
use std::fs;

mod config;
mod report;
mod workflow;

/// The persisted shape of a calculation request: everything
/// `CalculationSetup` needs, in a form `serde_yaml` can read.
#[derive(Debug, Deserialize)]
struct CalculationRequest {
    product_system_id: u64,
    #[serde(default)]
    demand_amount: Option<f64>,
    #[serde(default)]
    with_costs: bool,
    #[serde(default)]
    with_uncertainties: bool,
    #[serde(default)]
    impact_method_id: Option<u64>,
    #[serde(default)]
    rng_seed: Option<u64>,
    #[serde(default)]
    provider_linking: Option<ProviderLinking>,
    #[serde(default)]
    preferred_type: Option<PreferredType>,
    #[serde(default)]
    parameter_redefs: Vec<ParameterRedef>,
}

impl CalculationRequest {
    fn into_setup(self) -> CalculationSetup {
        let mut setup = CalculationSetup::new(self.product_system_id)
            .with_costs(self.with_costs)
            .with_uncertainties(self.with_uncertainties);
        if let Some(demand) = self.demand_amount {
            setup = setup.with_demand(demand);
        }
        if let Some(id) = self.impact_method_id {
            setup = setup.with_impact_method(id);
        }
        if let Some(seed) = self.rng_seed {
            setup = setup.with_rng_seed(seed);
        }
        if let Some(policy) = self.provider_linking {
            setup = setup.with_provider_linking(policy);
        }
        if let Some(preferred) = self.preferred_type {
            setup = setup.with_preferred_type(preferred);
        }
        setup.parameter_redefs = self.parameter_redefs;
        setup
    }
}

/// Drives one LCA calculation from a fixture data file and a calculation
/// request file.
#[derive(Debug, Parser)]
#[command(name = "lca-app", about = "Demo CLI for the LCA computation core")]
struct Cli {
    /// YAML file describing the calculation request.
    #[arg(long)]
    setup: String,

    /// YAML fixture file providing the data source (processes, product
    /// systems, impact methods, DQ systems, parameters).
    #[arg(long)]
    fixture: String,

    /// Number of Monte-Carlo iterations to run after the deterministic
    /// calculation. 0 skips the simulation entirely.
    #[arg(long, default_value_t = 0)]
    iterations: u64,

    /// Optional path to export the Monte-Carlo sample series as CSV.
    #[arg(long)]
    simulation_csv: Option<String>,
}

fn main() -> Result<()> {
    println!("--- LCA Computation Core: demo CLI ---");
    let cli = Cli::parse();

    let request_str = fs::read_to_string(&cli.setup)
        .with_context(|| format!("Failed to read calculation request from '{}'", cli.setup))?;
    let request: CalculationRequest = serde_yaml::from_str(&request_str)
        .with_context(|| format!("Failed to parse calculation request from '{}'", cli.setup))?;
    let setup = request.into_setup();

    let data_source = config::ExampleDataSource::load(&cli.fixture)?;

    let report = workflow::run_calculation(&data_source, &setup, cli.iterations)?;
    report::print_summary(&report.result);

    if let Some(simulation) = &report.simulation {
        let path = cli.simulation_csv.unwrap_or_else(|| {
            format!("lca_simulation_{}.csv", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
        });
        report::export_simulation_csv(simulation, path)?;
    }

    println!("\nRun complete.");
    Ok(())
}
