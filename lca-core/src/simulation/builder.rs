//! A fluent builder for constructing a [`Simulator`], mirroring the
//! teacher's step-by-step configuration API: collect nodes and wiring,
//! then `build()` once into a ready-to-run simulator.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use lca_schemas::data_source::DataSource;
use lca_schemas::process_product::ProcessProduct;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{LcaError, Result};
use crate::logger::IterationLogger;
use crate::solver::{DenseLuSolver, Solver};

use super::engine::Simulator;
use super::node::{SimulationNode, SubsystemLink};
use super::state::SimulationState;

/// Kahn's algorithm over `depends_on[i]` (the subsystem indices `i` itself
/// consumes). Returns a topological order or `CyclicSubsystems` (§4.7).
fn topological_order(depends_on: &[Vec<usize>]) -> Result<Vec<usize>> {
    let n = depends_on.len();
    let mut in_degree: Vec<usize> = depends_on.iter().map(|deps| deps.len()).collect();

    let mut queue: std::collections::VecDeque<usize> =
        (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(i) = queue.pop_front() {
        order.push(i);
        for (j, deps) in depends_on.iter().enumerate() {
            if deps.contains(&i) {
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    queue.push_back(j);
                }
            }
        }
    }

    if order.len() != n {
        return Err(LcaError::CyclicSubsystems);
    }
    Ok(order)
}

pub struct SimulationBuilder<'a, D: DataSource + ?Sized> {
    data_source: &'a D,
    root: Option<SimulationNode>,
    subsystems: Vec<SimulationNode>,
    depends_on: Vec<Vec<usize>>,
    host_links: Vec<SubsystemLink>,
    pinned_products: Vec<ProcessProduct>,
    with_costs: bool,
    rng_seed: Option<u64>,
    cancel: Arc<AtomicBool>,
    log_path: Option<String>,
}

impl<'a, D: DataSource + ?Sized> SimulationBuilder<'a, D> {
    pub fn new(data_source: &'a D) -> Self {
        Self {
            data_source,
            root: None,
            subsystems: Vec::new(),
            depends_on: Vec::new(),
            host_links: Vec::new(),
            pinned_products: Vec::new(),
            with_costs: false,
            rng_seed: None,
            cancel: Arc::new(AtomicBool::new(false)),
            log_path: None,
        }
    }

    pub fn with_root(mut self, root: SimulationNode) -> Self {
        self.root = Some(root);
        self
    }

    /// Registers a sub-system, its dependencies on other already-registered
    /// sub-systems (by index), and which host column it feeds. Returns the
    /// new sub-system's index for use in later `depends_on` lists.
    pub fn with_subsystem(
        mut self,
        node: SimulationNode,
        depends_on: Vec<usize>,
        host_column: ProcessProduct,
    ) -> (Self, usize) {
        let index = self.subsystems.len();
        self.subsystems.push(node);
        self.depends_on.push(depends_on);
        self.host_links.push(SubsystemLink {
            subsystem_index: index,
            host_column,
        });
        (self, index)
    }

    pub fn with_pinned_product(mut self, product: ProcessProduct) -> Self {
        self.pinned_products.push(product);
        self
    }

    pub fn with_costs(mut self, on: bool) -> Self {
        self.with_costs = on;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    pub fn with_iteration_log(mut self, path: &str) -> Self {
        self.log_path = Some(path.to_string());
        self
    }

    pub fn build(self) -> Result<Simulator<'a, D>> {
        let root = self
            .root
            .ok_or_else(|| LcaError::ConfigError("simulation requires a root system".to_string()))?;
        let order = topological_order(&self.depends_on)?;

        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(0),
        };

        let logger = match self.log_path {
            Some(path) => Some(
                IterationLogger::new(&path).map_err(|e| LcaError::FileIO(path.clone(), e))?,
            ),
            None => None,
        };

        let solver: Box<dyn Solver> = Box::new(DenseLuSolver);

        Ok(Simulator::new(
            self.data_source,
            solver,
            root,
            self.subsystems,
            order,
            self.host_links,
            self.pinned_products,
            self.with_costs,
            rng,
            self.cancel,
            logger,
            SimulationState::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lca_schemas::calc_setup::ParameterTable;
    use lca_schemas::data_source::{DataSourceError, ImpactMethodDescriptor, ProductSystemDescriptor};
    use lca_schemas::dq::DqSystem;
    use lca_schemas::exchange::CalcExchange;
    use lca_schemas::flow::FlowType;
    use lca_schemas::process_product::ProcessType;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn topological_order_runs_dependencies_first() {
        // subsystem 1 depends on subsystem 0.
        let order = topological_order(&[vec![], vec![0]]).unwrap();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn topological_order_rejects_a_cycle() {
        let err = topological_order(&[vec![1], vec![0]]).unwrap_err();
        assert!(matches!(err, LcaError::CyclicSubsystems));
    }

    /// Host process 1 (product flow 10) draws 2 units of a sub-system's
    /// product (process 2, flow 20) per unit of its own demand. The host's
    /// own static definition of process 2 is only a placeholder (it must
    /// set a diagonal so assembly succeeds before the sub-system result is
    /// known); the sub-system is solved independently against its own
    /// demand of 2.0, emitting 3.0 * 2.0 = 6.0 of elementary flow 100. A
    /// correct run overwrites the host's column for (2, 20) with that 6.0
    /// (not the placeholder's 3.0) before solving the host, so the final
    /// total for flow 100 comes out as 6.0 * 2.0 = 12.0.
    struct HostAndSubsystemSource;

    fn quantitative_reference(process_id: u64, flow_id: u64, amount: f64) -> CalcExchange {
        CalcExchange {
            owner_process_id: process_id,
            exchange_id: 1,
            flow_id,
            flow_type: FlowType::Product,
            is_input: false,
            amount,
            formula: None,
            allocation_factor: 1.0,
            default_provider_id: 0,
            location_id: None,
            uncertainty: None,
            cost_formula: None,
            cost_amount: None,
            is_quantitative_reference: true,
        }
    }

    fn technosphere_input(owner: u64, exchange_id: u64, flow_id: u64, amount: f64, default_provider: u64) -> CalcExchange {
        CalcExchange {
            owner_process_id: owner,
            exchange_id,
            flow_id,
            flow_type: FlowType::Product,
            is_input: true,
            amount,
            formula: None,
            allocation_factor: 1.0,
            default_provider_id: default_provider,
            location_id: None,
            uncertainty: None,
            cost_formula: None,
            cost_amount: None,
            is_quantitative_reference: false,
        }
    }

    fn elementary_output(owner: u64, exchange_id: u64, flow_id: u64, amount: f64) -> CalcExchange {
        CalcExchange {
            owner_process_id: owner,
            exchange_id,
            flow_id,
            flow_type: FlowType::Elementary,
            is_input: false,
            amount,
            formula: None,
            allocation_factor: 1.0,
            default_provider_id: 0,
            location_id: None,
            uncertainty: None,
            cost_formula: None,
            cost_amount: None,
            is_quantitative_reference: false,
        }
    }

    impl DataSource for HostAndSubsystemSource {
        fn load_exchanges(
            &self,
            process_ids: &HashSet<u64>,
        ) -> std::result::Result<HashMap<u64, Vec<CalcExchange>>, DataSourceError> {
            let mut out = HashMap::new();
            if process_ids.contains(&1) {
                out.insert(
                    1,
                    vec![
                        quantitative_reference(1, 10, 1.0),
                        technosphere_input(1, 2, 20, 2.0, 2),
                    ],
                );
            }
            if process_ids.contains(&2) {
                out.insert(
                    2,
                    vec![
                        quantitative_reference(2, 20, 1.0),
                        elementary_output(2, 2, 100, 3.0),
                    ],
                );
            }
            Ok(out)
        }

        fn load_providers(
            &self,
            flow_id: u64,
        ) -> std::result::Result<Vec<(ProcessProduct, ProcessType)>, DataSourceError> {
            match flow_id {
                20 => Ok(vec![(ProcessProduct::new(2, 20), ProcessType::UnitProcess)]),
                _ => Ok(vec![]),
            }
        }

        fn load_process_type(&self, _process_id: u64) -> std::result::Result<ProcessType, DataSourceError> {
            Ok(ProcessType::UnitProcess)
        }

        fn load_product_system(
            &self,
            _id: u64,
        ) -> std::result::Result<ProductSystemDescriptor, DataSourceError> {
            unimplemented!("not needed by this test")
        }

        fn load_impact_method(
            &self,
            _id: u64,
        ) -> std::result::Result<ImpactMethodDescriptor, DataSourceError> {
            unimplemented!("not needed by this test")
        }

        fn load_dq_system(&self, _id: u64) -> std::result::Result<DqSystem, DataSourceError> {
            unimplemented!("not needed by this test")
        }

        fn load_parameters(
            &self,
            _contexts: &HashSet<u64>,
        ) -> std::result::Result<ParameterTable, DataSourceError> {
            Ok(ParameterTable::new())
        }
    }

    #[test]
    fn host_column_is_overwritten_with_the_subsystems_latest_totals() {
        let source = HostAndSubsystemSource;
        let root = SimulationNode::new(1, ProcessProduct::new(1, 10), 1.0, vec![]);
        let sub = SimulationNode::new(2, ProcessProduct::new(2, 20), 2.0, vec![]);

        let (builder, sub_index) = SimulationBuilder::new(&source)
            .with_root(root)
            .with_subsystem(sub, vec![], ProcessProduct::new(2, 20));
        assert_eq!(sub_index, 0);

        let mut simulator = builder.with_rng_seed(7).build().unwrap();
        simulator.run(1).unwrap();

        assert_eq!(simulator.state.iterations_run, 1);
        assert_eq!(simulator.state.iterations_failed, 0);
        let flows = &simulator.state.flow_series[0];
        assert_eq!(flows.len(), 1);
        assert!((flows[0] - 12.0).abs() < 1e-9);
    }

    /// Host process 1 only ever sees the sub-system's reference product
    /// (process 2, flow 20) as an opaque placeholder, pre-wired via
    /// `process_links` so the host's own BFS never walks past it. The
    /// elementary flow the sub-system actually emits lives two hops deeper,
    /// on process 3, which the host never registers as a tech-index column
    /// at all — so nothing in the host's own exchanges ever puts that flow
    /// into its flow index. Only the sub-system's independent, full BFS
    /// solve discovers process 3 and its flow 100.
    struct NestedSubsystemSource;

    impl DataSource for NestedSubsystemSource {
        fn load_exchanges(
            &self,
            process_ids: &HashSet<u64>,
        ) -> std::result::Result<HashMap<u64, Vec<CalcExchange>>, DataSourceError> {
            let mut out = HashMap::new();
            if process_ids.contains(&1) {
                out.insert(
                    1,
                    vec![
                        quantitative_reference(1, 10, 1.0),
                        technosphere_input(1, 2, 20, 2.0, 0),
                    ],
                );
            }
            if process_ids.contains(&2) {
                out.insert(
                    2,
                    vec![
                        quantitative_reference(2, 20, 1.0),
                        technosphere_input(2, 2, 30, 5.0, 0),
                    ],
                );
            }
            if process_ids.contains(&3) {
                out.insert(
                    3,
                    vec![
                        quantitative_reference(3, 30, 1.0),
                        elementary_output(3, 2, 100, 7.0),
                    ],
                );
            }
            Ok(out)
        }

        fn load_providers(
            &self,
            flow_id: u64,
        ) -> std::result::Result<Vec<(ProcessProduct, ProcessType)>, DataSourceError> {
            match flow_id {
                20 => Ok(vec![(ProcessProduct::new(2, 20), ProcessType::UnitProcess)]),
                30 => Ok(vec![(ProcessProduct::new(3, 30), ProcessType::UnitProcess)]),
                _ => Ok(vec![]),
            }
        }

        fn load_process_type(&self, _process_id: u64) -> std::result::Result<ProcessType, DataSourceError> {
            Ok(ProcessType::UnitProcess)
        }

        fn load_product_system(
            &self,
            _id: u64,
        ) -> std::result::Result<ProductSystemDescriptor, DataSourceError> {
            unimplemented!("not needed by this test")
        }

        fn load_impact_method(
            &self,
            _id: u64,
        ) -> std::result::Result<ImpactMethodDescriptor, DataSourceError> {
            unimplemented!("not needed by this test")
        }

        fn load_dq_system(&self, _id: u64) -> std::result::Result<DqSystem, DataSourceError> {
            unimplemented!("not needed by this test")
        }

        fn load_parameters(
            &self,
            _contexts: &HashSet<u64>,
        ) -> std::result::Result<ParameterTable, DataSourceError> {
            Ok(ParameterTable::new())
        }
    }

    #[test]
    fn sub_system_only_flow_survives_into_the_host_result() {
        use lca_schemas::process_product::ProcessLink;

        let source = NestedSubsystemSource;
        let root = SimulationNode::new(
            1,
            ProcessProduct::new(1, 10),
            1.0,
            vec![ProcessLink {
                recipient_process_id: 1,
                exchange_id: 2,
                provider: ProcessProduct::new(2, 20),
            }],
        );
        let sub = SimulationNode::new(2, ProcessProduct::new(2, 20), 3.0, vec![]);

        let (builder, sub_index) = SimulationBuilder::new(&source)
            .with_root(root)
            .with_subsystem(sub, vec![], ProcessProduct::new(2, 20));
        assert_eq!(sub_index, 0);

        let mut simulator = builder.with_rng_seed(7).build().unwrap();
        simulator.run(1).unwrap();

        assert_eq!(simulator.state.iterations_run, 1);
        assert_eq!(simulator.state.iterations_failed, 0);
        let flows = &simulator.state.flow_series[0];
        // Without seeding the host flow index from the sub-system's flow
        // rows, this would come back empty: host process 1 and its static
        // view of process 2 never mention flow 100 anywhere.
        assert_eq!(flows.len(), 1);
        assert!((flows[0] - 210.0).abs() < 1e-9);
    }
}
