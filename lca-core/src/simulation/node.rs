//! A single system in a Monte-Carlo run (C10, §4.7): either the root
//! product system or one of its nested sub-systems.

use lca_schemas::process_product::{ProcessLink, ProcessProduct};

/// Static description of one system the simulator solves every iteration.
/// Sub-systems carry uncertainties but no impact method (LCI/LCC only);
/// the root carries whatever the calculation setup asked for.
#[derive(Debug, Clone)]
pub struct SimulationNode {
    pub product_system_id: u64,
    pub reference: ProcessProduct,
    pub demand: f64,
    pub process_links: Vec<ProcessLink>,
}

impl SimulationNode {
    pub fn new(
        product_system_id: u64,
        reference: ProcessProduct,
        demand: f64,
        process_links: Vec<ProcessLink>,
    ) -> Self {
        Self {
            product_system_id,
            reference,
            demand,
            process_links,
        }
    }
}

/// A host-side record of which sub-system's latest totals should overwrite
/// which host tech-index column, every iteration (§4.7, step 2).
#[derive(Debug, Clone, Copy)]
pub struct SubsystemLink {
    pub subsystem_index: usize,
    pub host_column: ProcessProduct,
}
