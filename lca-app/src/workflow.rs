//! Orchestrates one calculation run end to end: data source → tech index →
//! matrix assembly → LCA result, with an optional Monte-Carlo pass on top.

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use lca_core::matrix_assembler::{self, AssemblyOptions};
use lca_core::result_provider::ResultProvider;
use lca_core::simulation::{SimulationBuilder, SimulationNode, SimulationState};
use lca_core::solver::DenseLuSolver;
use lca_core::tech_index_builder;
use lca_schemas::calc_setup::CalculationSetup;
use lca_schemas::data_source::DataSource;
use lca_schemas::impact::ImpactIndex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::into_app_error;

/// Everything `run_calculation` produced: the deterministic LCA result, and
/// a Monte-Carlo sample series if `iterations > 0` was requested.
pub struct CalculationReport {
    pub result: ResultProvider,
    pub simulation: Option<SimulationState>,
}

pub fn run_calculation<D: DataSource + ?Sized>(
    data_source: &D,
    setup: &CalculationSetup,
    iterations: u64,
) -> Result<CalculationReport> {
    println!("\n--- [Workflow] Resolving product system {} ---", setup.product_system_id);
    let descriptor = data_source
        .load_product_system(setup.product_system_id)
        .map_err(|e| anyhow::anyhow!(e.0))?;
    let demand = setup.demand_amount.unwrap_or(descriptor.default_demand);

    let cancel = AtomicBool::new(false);
    let tech_index = tech_index_builder::build(
        data_source,
        descriptor.reference,
        demand,
        &descriptor.process_links,
        &setup.linking,
        &cancel,
    )
    .map_err(into_app_error)?;
    println!("Tech index resolved: {} columns", tech_index.len());

    let contexts: HashSet<u64> = tech_index.iter().map(|(_, p)| p.process_id).collect();
    let mut params = data_source
        .load_parameters(&contexts)
        .map_err(|e| anyhow::anyhow!(e.0))?;
    for redef in &setup.parameter_redefs {
        params.apply_redef(redef);
    }

    let impact_index = match setup.impact_method_id {
        Some(id) => {
            let descriptor = data_source
                .load_impact_method(id)
                .map_err(|e| anyhow::anyhow!(e.0))?;
            Some(ImpactIndex::new(descriptor.categories))
        }
        None => None,
    };

    let mut rng = setup.rng_seed.map(StdRng::seed_from_u64);
    let options = AssemblyOptions {
        with_costs: setup.with_costs,
        with_uncertainties: setup.with_uncertainties,
        rng: rng.as_mut().map(|r| r as &mut dyn rand::RngCore),
    };
    let matrix_data = matrix_assembler::assemble(data_source, tech_index, impact_index, &params, options)
        .map_err(into_app_error)?;

    let solver = DenseLuSolver;
    let result = ResultProvider::eager_full(matrix_data, &solver).map_err(into_app_error)?;
    println!("--- [Workflow] Deterministic calculation complete ---");

    let simulation = if iterations > 0 {
        println!("\n--- [Workflow] Running Monte-Carlo simulation ---");
        let root = SimulationNode::new(
            setup.product_system_id,
            descriptor.reference,
            demand,
            descriptor.process_links.clone(),
        );
        let mut builder = SimulationBuilder::new(data_source).with_root(root).with_costs(setup.with_costs);
        if let Some(seed) = setup.rng_seed {
            builder = builder.with_rng_seed(seed);
        }
        let mut simulator = builder.build().map_err(into_app_error)?;
        simulator.run(iterations).map_err(into_app_error)?;
        Some(simulator.state)
    } else {
        None
    };

    Ok(CalculationReport { result, simulation })
}
