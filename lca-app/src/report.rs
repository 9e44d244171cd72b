//! Renders a calculation result to stdout and, for a Monte-Carlo run,
//! exports the per-iteration sample series to CSV.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;
use lca_core::result_provider::ResultProvider;
use lca_core::simulation::SimulationState;

pub fn print_summary(result: &ResultProvider) {
    println!("\n\n--- [Final Report] ---");
    println!("========================================");

    let scaling = result.scaling_vector();
    println!("Scaling vector ({} products):", scaling.len());
    for (j, s) in scaling.iter().enumerate() {
        println!("  - product[{j}]: scale = {s:.6}");
    }

    println!("\nTotal flows:");
    for (i, g) in result.reported_flow_totals().iter().enumerate() {
        println!("  - flow[{i}]: {g:.6}");
    }

    if let Some(cost) = result.total_costs() {
        println!("\nTotal cost: {cost:.2}");
    }

    println!("========================================");
}

/// Writes one CSV row per successful Monte-Carlo iteration: the flow
/// totals, impact totals (if any) and cost of that draw.
pub fn export_simulation_csv(state: &SimulationState, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = Writer::from_writer(file);

    for (i, flows) in state.flow_series.iter().enumerate() {
        let impacts = state.impact_series.get(i);
        let cost = state.cost_series.get(i);
        let flows_json = serde_json::to_string(flows)?;
        let impacts_json = impacts.map(|v| serde_json::to_string(v)).transpose()?.unwrap_or_default();
        writer.write_record([
            i.to_string(),
            flows_json,
            impacts_json,
            cost.map(|c| c.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    println!(
        "Monte-Carlo samples exported to '{}' ({} iterations, {} failed)",
        path.display(),
        state.iterations_run,
        state.iterations_failed
    );
    Ok(())
}
