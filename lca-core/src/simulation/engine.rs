//! Monte-Carlo simulator (C10, §4.7): per-iteration resampling of the root
//! system and any nested sub-systems, solved in topological order, with an
//! append-only result store and a pin ledger for tracked products.
//!
//! A `run()` loop calls a per-iteration step, reporting milestones with
//! `println!` and writing one log row per iteration through an optional
//! logger.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lca_schemas::calc_setup::ParameterTable;
use lca_schemas::data_source::DataSource;
use lca_schemas::linking::LinkingConfig;
use lca_schemas::process_product::ProcessProduct;
use rand::rngs::StdRng;

use crate::calculator::{self, SimpleResult};
use crate::error::{LcaError, Result};
use crate::logger::IterationLogger;
use crate::matrix_assembler::{self, AssemblyOptions};
use crate::matrix_data::MatrixData;
use crate::solver::Solver;
use crate::tech_index_builder;

use super::node::{SimulationNode, SubsystemLink};
use super::state::{PinSample, SimulationState};

/// A running Monte-Carlo simulation: the root system, its topologically
/// ordered sub-systems, and the wiring between them.
pub struct Simulator<'a, D: DataSource + ?Sized> {
    data_source: &'a D,
    solver: Box<dyn Solver>,
    root: SimulationNode,
    subsystems: Vec<SimulationNode>,
    order: Vec<usize>,
    host_links: Vec<SubsystemLink>,
    pinned_products: Vec<ProcessProduct>,
    with_costs: bool,
    rng: StdRng,
    cancel: Arc<AtomicBool>,
    logger: Option<IterationLogger>,
    pub state: SimulationState,
}

impl<'a, D: DataSource + ?Sized> Simulator<'a, D> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        data_source: &'a D,
        solver: Box<dyn Solver>,
        root: SimulationNode,
        subsystems: Vec<SimulationNode>,
        order: Vec<usize>,
        host_links: Vec<SubsystemLink>,
        pinned_products: Vec<ProcessProduct>,
        with_costs: bool,
        rng: StdRng,
        cancel: Arc<AtomicBool>,
        logger: Option<IterationLogger>,
        state: SimulationState,
    ) -> Self {
        Self {
            data_source,
            solver,
            root,
            subsystems,
            order,
            host_links,
            pinned_products,
            with_costs,
            rng,
            cancel,
            logger,
            state,
        }
    }

    /// Runs `iterations` Monte-Carlo draws. A failed iteration is recorded
    /// and skipped; cancellation stops the run without rolling back
    /// already-appended iterations (§4.7).
    pub fn run(&mut self, iterations: u64) -> Result<()> {
        println!("--- Starting Monte-Carlo simulation: {iterations} iterations ---");
        for i in 0..iterations {
            if self.cancel.load(Ordering::Relaxed) {
                println!("--- Simulation cancelled after {i} iterations ---");
                break;
            }
            match self.iterate() {
                Ok(()) => {}
                Err(LcaError::Cancelled) => {
                    println!("--- Simulation cancelled after {i} iterations ---");
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        println!(
            "Monte-Carlo simulation complete: {} succeeded, {} failed",
            self.state.iterations_run, self.state.iterations_failed
        );
        Ok(())
    }

    fn load_params(&self, process_ids: &HashSet<u64>) -> Result<ParameterTable> {
        Ok(self.data_source.load_parameters(process_ids)?)
    }

    fn solve_node(&mut self, node: &SimulationNode) -> Result<(SimpleResult, MatrixData)> {
        let cancel_flag = AtomicBool::new(self.cancel.load(Ordering::Relaxed));
        let tech_index = tech_index_builder::build(
            self.data_source,
            node.reference,
            node.demand,
            &node.process_links,
            &LinkingConfig::default(),
            &cancel_flag,
        )?;
        let contexts: HashSet<u64> = tech_index.iter().map(|(_, p)| p.process_id).collect();
        let params = self.load_params(&contexts)?;
        let options = AssemblyOptions {
            with_costs: self.with_costs,
            with_uncertainties: true,
            rng: Some(&mut self.rng),
        };
        let matrix_data = matrix_assembler::assemble(self.data_source, tech_index, None, &params, options)?;
        let result = calculator::solve_simple(&matrix_data, self.solver.as_ref())?;
        Ok((result, matrix_data))
    }

    /// One Monte-Carlo draw (§4.7 "per iteration"): sub-systems first, in
    /// topological order, then the host with its sub-system columns
    /// overwritten by each sub-system's latest totals.
    fn iterate(&mut self) -> Result<()> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(LcaError::Cancelled);
        }

        let mut sub_results: HashMap<usize, (SimpleResult, MatrixData)> = HashMap::new();
        for &index in &self.order.clone() {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(LcaError::Cancelled);
            }
            let node = self.subsystems[index].clone();
            match self.solve_node(&node) {
                Ok(solved) => {
                    sub_results.insert(index, solved);
                }
                Err(_) => {
                    self.state.record_failure();
                    return Ok(());
                }
            }
        }

        let root = self.root.clone();
        let mut matrix_data = match self.solve_root_matrix(&root) {
            Ok(m) => m,
            Err(_) => {
                self.state.record_failure();
                return Ok(());
            }
        };

        // Seed the host flow index with every linked sub-system's flow rows
        // before any column gets overwritten (§4.7 Init's zero-flow
        // placeholder), so a sub-system-only elementary flow still gets a
        // host row reserved for it instead of being silently dropped below.
        for link in &self.host_links {
            let Some((_, sub_matrix)) = sub_results.get(&link.subsystem_index) else {
                continue;
            };
            for (_, flow) in sub_matrix.flow_index.iter() {
                if matrix_data.flow_index.row_of(flow.flow_id, flow.location_id).is_none() {
                    matrix_data.flow_index.push(*flow);
                    matrix_data.intervention_matrix.push_rows(1);
                }
            }
        }

        for link in self.host_links.clone() {
            let Some(col) = matrix_data.tech_index.position_of(&link.host_column) else {
                continue;
            };
            let Some((sub_result, sub_matrix)) = sub_results.get(&link.subsystem_index) else {
                continue;
            };
            for (sub_row, flow) in sub_matrix.flow_index.iter() {
                if let Some(host_row) = matrix_data.flow_index.row_of(flow.flow_id, flow.location_id) {
                    matrix_data
                        .intervention_matrix
                        .set(host_row, col, sub_result.flow_totals[sub_row]);
                }
            }
            // The sub-system column expresses one unit of its reference product.
            matrix_data.technology_matrix.set(col, col, 1.0);
        }

        let result = match calculator::solve_simple(&matrix_data, self.solver.as_ref()) {
            Ok(r) => r,
            Err(_) => {
                self.state.record_failure();
                return Ok(());
            }
        };

        for &product in self.pinned_products.iter() {
            if let Some(j) = matrix_data.tech_index.position_of(&product) {
                let direct: Vec<f64> = matrix_data
                    .intervention_matrix
                    .column(j)
                    .iter()
                    .map(|b_ij| b_ij * result.scaling[j])
                    .collect();
                if let Ok(x) = self.solver.solve_col(&matrix_data.technology_matrix, j, 1.0) {
                    let upstream = matrix_data.intervention_matrix.mul_vec(&x);
                    self.state.record_pin(product, PinSample { direct, upstream });
                }
            }
        }

        if let Some(logger) = &mut self.logger {
            logger.log_iteration(
                self.state.iterations_run,
                true,
                &result.flow_totals,
                result.impact_totals.as_deref().unwrap_or(&[]),
                result.total_cost.unwrap_or(0.0),
            )?;
        }

        self.state
            .record_success(result.flow_totals, result.impact_totals, result.total_cost);
        Ok(())
    }

    fn solve_root_matrix(&mut self, root: &SimulationNode) -> Result<MatrixData> {
        let cancel_flag = AtomicBool::new(self.cancel.load(Ordering::Relaxed));
        let tech_index = tech_index_builder::build(
            self.data_source,
            root.reference,
            root.demand,
            &root.process_links,
            &LinkingConfig::default(),
            &cancel_flag,
        )?;
        let contexts: HashSet<u64> = tech_index.iter().map(|(_, p)| p.process_id).collect();
        let params = self.load_params(&contexts)?;
        let impact_index = None;
        let options = AssemblyOptions {
            with_costs: self.with_costs,
            with_uncertainties: true,
            rng: Some(&mut self.rng),
        };
        matrix_assembler::assemble(self.data_source, tech_index, impact_index, &params, options)
    }
}
