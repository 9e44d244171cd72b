//! Tech-index builder (C5, §4.2): breadth-first expansion of the technology
//! matrix's column index from a reference product, resolving unlinked
//! technosphere exchanges via provider search (C4) as it goes.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use lca_schemas::data_source::DataSource;
use lca_schemas::linking::{LinkingConfig, ProviderCandidate};
use lca_schemas::process_product::{ProcessLink, ProcessProduct};

use crate::error::{LcaError, Result};
use crate::provider_search;
use crate::tech_index::TechIndex;

/// Expands the tech index breadth-first from `reference`, recording every
/// resolved technosphere link. `process_links` are author-declared edges
/// wired in before the BFS proper begins (§4.2, step 2).
pub fn build<D: DataSource + ?Sized>(
    data_source: &D,
    reference: ProcessProduct,
    demand: f64,
    process_links: &[ProcessLink],
    config: &LinkingConfig,
    cancel: &AtomicBool,
) -> Result<TechIndex> {
    let mut index = TechIndex::new(reference, demand);

    for link in process_links {
        index.push(link.provider);
        index.add_link((link.recipient_process_id, link.exchange_id), link.provider);
    }

    let mut visited: HashSet<ProcessProduct> = HashSet::new();
    visited.insert(reference);
    let mut frontier: VecDeque<ProcessProduct> = VecDeque::new();
    frontier.push_back(reference);

    while !frontier.is_empty() {
        if cancel.load(Ordering::Relaxed) {
            return Err(LcaError::Cancelled);
        }

        let process_ids: HashSet<u64> = frontier.iter().map(|p| p.process_id).collect();
        let exchanges_by_process = data_source.load_exchanges(&process_ids)?;
        let mut next_frontier: VecDeque<ProcessProduct> = VecDeque::new();

        for recipient in frontier.drain(..) {
            let Some(exchanges) = exchanges_by_process.get(&recipient.process_id) else {
                continue;
            };
            for exchange in exchanges {
                if !provider_search::is_link_candidate(exchange, config.provider_linking) {
                    continue;
                }
                let key = (recipient.process_id, exchange.exchange_id);
                if index.provider_for(&key).is_some() {
                    continue;
                }

                let raw_candidates = data_source.load_providers(exchange.flow_id)?;
                let candidates: Vec<ProviderCandidate> = raw_candidates
                    .into_iter()
                    .map(|(product, process_type)| ProviderCandidate {
                        process_id: product.process_id,
                        flow_id: product.flow_id,
                        process_type,
                    })
                    .collect();

                if let Some(provider) = provider_search::find(exchange, &candidates, config) {
                    index.add_link(key, provider);
                    if visited.insert(provider) {
                        index.push(provider);
                        next_frontier.push_back(provider);
                    }
                }
            }
        }

        frontier = next_frontier;
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lca_schemas::calc_setup::ParameterTable;
    use lca_schemas::data_source::{DataSourceError, ImpactMethodDescriptor, ProductSystemDescriptor};
    use lca_schemas::dq::DqSystem;
    use lca_schemas::exchange::CalcExchange;
    use lca_schemas::flow::FlowType;
    use lca_schemas::linking::{PreferredType, ProviderLinking};
    use lca_schemas::process_product::ProcessType;
    use std::collections::HashMap;

    /// Chain: process 1 (ref) needs input of flow 2 from process 2, which
    /// needs input of flow 3 whose only provider is process 1's own
    /// reference product (1, 1) — a true two-node cycle.
    struct ChainSource;

    fn exchange(owner: u64, id: u64, flow_id: u64, is_input: bool, default: u64) -> CalcExchange {
        CalcExchange {
            owner_process_id: owner,
            exchange_id: id,
            flow_id,
            flow_type: FlowType::Product,
            is_input,
            amount: 1.0,
            formula: None,
            allocation_factor: 1.0,
            default_provider_id: default,
            location_id: None,
            uncertainty: None,
            cost_formula: None,
            cost_amount: None,
            is_quantitative_reference: false,
        }
    }

    impl DataSource for ChainSource {
        fn load_exchanges(
            &self,
            process_ids: &HashSet<u64>,
        ) -> std::result::Result<HashMap<u64, Vec<CalcExchange>>, DataSourceError> {
            let mut out = HashMap::new();
            if process_ids.contains(&1) {
                out.insert(1, vec![exchange(1, 1, 2, true, 2)]);
            }
            if process_ids.contains(&2) {
                out.insert(2, vec![exchange(2, 1, 3, true, 1)]);
            }
            Ok(out)
        }

        fn load_providers(
            &self,
            flow_id: u64,
        ) -> std::result::Result<Vec<(ProcessProduct, ProcessType)>, DataSourceError> {
            match flow_id {
                2 => Ok(vec![(ProcessProduct::new(2, 2), ProcessType::UnitProcess)]),
                3 => Ok(vec![(ProcessProduct::new(1, 1), ProcessType::UnitProcess)]),
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
            unimplemented!("not needed by this test")
        }
    }

    #[test]
    fn bfs_resolves_a_cycle_back_to_the_reference() {
        let reference = ProcessProduct::new(1, 1);
        let config = LinkingConfig {
            provider_linking: ProviderLinking::PreferDefaults,
            preferred_type: PreferredType::UnitProcess,
            callback: None,
        };
        let cancel = AtomicBool::new(false);
        let index = build(&ChainSource, reference, 1.0, &[], &config, &cancel).unwrap();

        assert_eq!(index.position_of(&reference), Some(0));
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.provider_for(&(1, 1)),
            Some(ProcessProduct::new(2, 2))
        );
        assert_eq!(
            index.provider_for(&(2, 1)),
            Some(ProcessProduct::new(1, 1))
        );
    }

    #[test]
    fn cancellation_is_reported_between_blocks() {
        let reference = ProcessProduct::new(1, 1);
        let config = LinkingConfig::default();
        let cancel = AtomicBool::new(true);
        let err = build(&ChainSource, reference, 1.0, &[], &config, &cancel).unwrap_err();
        assert!(matches!(err, LcaError::Cancelled));
    }
}
