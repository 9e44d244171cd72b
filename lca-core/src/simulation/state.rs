//! Accumulated results of a Monte-Carlo run: the append-only per-iteration
//! series and the pin ledger for tracked products (§4.7, §5).

use std::collections::HashMap;

use lca_schemas::process_product::ProcessProduct;

/// Direct and upstream contribution of one pinned product in one iteration.
#[derive(Debug, Clone, Default)]
pub struct PinSample {
    pub direct: Vec<f64>,
    pub upstream: Vec<f64>,
}

/// Result store for a simulation run. Appends are stable: the *i*-th entry
/// of `flow_series` corresponds to the *i*-th successful iteration (§5).
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    pub iterations_run: u64,
    pub iterations_failed: u64,
    pub flow_series: Vec<Vec<f64>>,
    pub impact_series: Vec<Vec<f64>>,
    pub cost_series: Vec<f64>,
    pub pins: HashMap<ProcessProduct, Vec<PinSample>>,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(
        &mut self,
        flow_totals: Vec<f64>,
        impact_totals: Option<Vec<f64>>,
        total_cost: Option<f64>,
    ) {
        self.iterations_run += 1;
        self.flow_series.push(flow_totals);
        if let Some(impacts) = impact_totals {
            self.impact_series.push(impacts);
        }
        if let Some(cost) = total_cost {
            self.cost_series.push(cost);
        }
    }

    pub fn record_failure(&mut self) {
        self.iterations_failed += 1;
    }

    pub fn record_pin(&mut self, product: ProcessProduct, sample: PinSample) {
        self.pins.entry(product).or_default().push(sample);
    }
}
