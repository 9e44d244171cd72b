//! Matrix assembler (C6, §4.3): turns a built [`TechIndex`] and its
//! exchanges into a [`MatrixData`] — the technology matrix `A`, the
//! intervention matrix `B`, and (when an impact method is in scope) the
//! characterization matrix `C`.

use std::collections::HashSet;

use lca_schemas::calc_setup::ParameterTable;
use lca_schemas::data_source::DataSource;
use lca_schemas::exchange::CalcExchange;
use lca_schemas::flow::{FlowRef, FlowType};
use lca_schemas::impact::ImpactIndex;
use rand::RngCore;

use crate::error::{LcaError, Result};
use crate::flow_index::FlowIndex;
use crate::formula;
use crate::matrix::{DenseMatrix, SparseMatrix};
use crate::matrix_data::MatrixData;
use crate::tech_index::TechIndex;
use crate::uncertainty;

/// Whether uncertainty resampling is applied while assembling — plumbed
/// through separately from [`lca_schemas::calc_setup::CalculationSetup`] so
/// the assembler has no dependency on the simulator's iteration loop.
pub struct AssemblyOptions<'a> {
    pub with_costs: bool,
    pub with_uncertainties: bool,
    pub rng: Option<&'a mut dyn RngCore>,
}

fn resolve_amount(exchange: &CalcExchange, params: &ParameterTable, context_id: u64) -> Result<f64> {
    match &exchange.formula {
        Some(formula) => formula::evaluate(formula, params, Some(context_id)),
        None => Ok(exchange.amount),
    }
}

fn resolve_cost(exchange: &CalcExchange, params: &ParameterTable, context_id: u64) -> Result<Option<f64>> {
    match &exchange.cost_formula {
        Some(formula) => Ok(Some(formula::evaluate(formula, params, Some(context_id))?)),
        None => Ok(exchange.cost_amount),
    }
}

/// Assembles `MatrixData` for `tech_index` against `params`. `impact_index`
/// is `None` when the calculation carries no impact method (§4.7 LCI/LCC
/// sub-systems).
pub fn assemble<D: DataSource + ?Sized>(
    data_source: &D,
    tech_index: TechIndex,
    impact_index: Option<ImpactIndex>,
    params: &ParameterTable,
    mut options: AssemblyOptions,
) -> Result<MatrixData> {
    let n = tech_index.len();
    let mut a = SparseMatrix::zeros(n, n);
    let mut b_entries: std::collections::HashMap<(usize, usize), f64> = std::collections::HashMap::new();
    let mut flow_index = FlowIndex::new();
    let mut cost_vector = if options.with_costs {
        Some(vec![0.0; n])
    } else {
        None
    };

    let process_ids: HashSet<u64> = tech_index.iter().map(|(_, p)| p.process_id).collect();
    let exchanges_by_process = data_source.load_exchanges(&process_ids)?;

    let mut diagonal_set = vec![false; n];

    for (col, product) in tech_index.iter() {
        let Some(exchanges) = exchanges_by_process.get(&product.process_id) else {
            continue;
        };

        for exchange in exchanges {
            let mut amount = resolve_amount(exchange, params, product.process_id)?;

            if options.with_uncertainties {
                if let (Some(dist), Some(rng)) = (&exchange.uncertainty, options.rng.as_deref_mut()) {
                    amount = uncertainty::sample(dist, rng)?;
                }
            }

            let is_reference = exchange.flow_id == product.flow_id && exchange.is_quantitative_reference;
            if !is_reference {
                amount *= exchange.allocation_factor;
            }

            if is_reference {
                a.set(col, col, amount);
                diagonal_set[col] = true;
            } else if exchange.is_link_candidate() {
                if let Some(provider) =
                    tech_index.provider_for(&(product.process_id, exchange.exchange_id))
                {
                    if let Some(row) = tech_index.position_of(&provider) {
                        a.add(row, col, -amount);
                    }
                }
            } else if exchange.flow_type.is_elementary() {
                let mut flow_ref = FlowRef::new(exchange.flow_id, exchange.flow_type, exchange.is_input);
                if let Some(location_id) = exchange.location_id {
                    flow_ref = flow_ref.with_location(location_id);
                }
                let row = flow_index.push(flow_ref);
                let signed = if exchange.is_input { -amount } else { amount };
                *b_entries.entry((row, col)).or_insert(0.0) += signed;
            }

            if let Some(costs) = cost_vector.as_mut() {
                if let Some(cost) = resolve_cost(exchange, params, product.process_id)? {
                    costs[col] += cost;
                }
            }
        }
    }

    for (col, product) in tech_index.iter() {
        if !diagonal_set[col] {
            return Err(LcaError::ProcessNotDefined(product.process_id));
        }
    }

    let m = flow_index.len();
    let mut intervention_matrix = DenseMatrix::zeros(m, n);
    for ((row, col), value) in b_entries {
        intervention_matrix.set(row, col, value);
    }

    let impact_matrix = impact_index.as_ref().map(|impact_index| {
        let mut c = DenseMatrix::zeros(impact_index.len(), m);
        for (row, flow) in flow_index.iter() {
            for (k, _category) in impact_index.iter() {
                if let Some(factor) = impact_index.factor_for(k, flow.flow_id, flow.location_id) {
                    let signed = if flow.is_input { -factor } else { factor };
                    c.set(k, row, signed);
                }
            }
        }
        c
    });

    let mut demand_vector = vec![0.0; n];
    demand_vector[0] = tech_index.demand();

    Ok(MatrixData {
        tech_index,
        flow_index,
        impact_index,
        technology_matrix: a.to_dense(),
        intervention_matrix,
        impact_matrix,
        demand_vector,
        cost_vector,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lca_schemas::data_source::{DataSourceError, ImpactMethodDescriptor, ProductSystemDescriptor};
    use lca_schemas::dq::DqSystem;
    use lca_schemas::process_product::{ProcessProduct, ProcessType};
    use std::collections::HashMap;

    struct SingleProcessSource;

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

    fn elementary(process_id: u64, exchange_id: u64, flow_id: u64, is_input: bool, amount: f64) -> CalcExchange {
        CalcExchange {
            owner_process_id: process_id,
            exchange_id,
            flow_id,
            flow_type: FlowType::Elementary,
            is_input,
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

    impl DataSource for SingleProcessSource {
        fn load_exchanges(
            &self,
            process_ids: &HashSet<u64>,
        ) -> std::result::Result<HashMap<u64, Vec<CalcExchange>>, DataSourceError> {
            let mut out = HashMap::new();
            if process_ids.contains(&1) {
                out.insert(
                    1,
                    vec![
                        quantitative_reference(1, 10, 2.0),
                        elementary(1, 2, 100, true, 5.0),
                    ],
                );
            }
            Ok(out)
        }

        fn load_providers(
            &self,
            _flow_id: u64,
        ) -> std::result::Result<Vec<(ProcessProduct, ProcessType)>, DataSourceError> {
            Ok(vec![])
        }

        fn load_process_type(&self, _process_id: u64) -> std::result::Result<ProcessType, DataSourceError> {
            Ok(ProcessType::UnitProcess)
        }

        fn load_product_system(
            &self,
            _id: u64,
        ) -> std::result::Result<ProductSystemDescriptor, DataSourceError> {
            unimplemented!()
        }

        fn load_impact_method(
            &self,
            _id: u64,
        ) -> std::result::Result<ImpactMethodDescriptor, DataSourceError> {
            unimplemented!()
        }

        fn load_dq_system(&self, _id: u64) -> std::result::Result<DqSystem, DataSourceError> {
            unimplemented!()
        }

        fn load_parameters(
            &self,
            _contexts: &HashSet<u64>,
        ) -> std::result::Result<ParameterTable, DataSourceError> {
            unimplemented!()
        }
    }

    #[test]
    fn single_process_diagonal_and_intervention_are_set() {
        let reference = ProcessProduct::new(1, 10);
        let tech_index = TechIndex::new(reference, 3.0);
        let params = ParameterTable::new();
        let options = AssemblyOptions {
            with_costs: false,
            with_uncertainties: false,
            rng: None,
        };
        let data = assemble(&SingleProcessSource, tech_index, None, &params, options).unwrap();
        assert_eq!(data.technology_matrix.get(0, 0), 2.0);
        assert_eq!(data.flow_index.len(), 1);
        let row = data.flow_index.row_of(100, None).unwrap();
        assert_eq!(data.intervention_matrix.get(row, 0), -5.0);
        assert_eq!(data.demand_vector, vec![3.0]);
    }

    #[test]
    fn missing_quantitative_reference_is_an_error() {
        struct EmptySource;
        impl DataSource for EmptySource {
            fn load_exchanges(
                &self,
                _process_ids: &HashSet<u64>,
            ) -> std::result::Result<HashMap<u64, Vec<CalcExchange>>, DataSourceError> {
                Ok(HashMap::new())
            }
            fn load_providers(
                &self,
                _flow_id: u64,
            ) -> std::result::Result<Vec<(ProcessProduct, ProcessType)>, DataSourceError> {
                Ok(vec![])
            }
            fn load_process_type(&self, _process_id: u64) -> std::result::Result<ProcessType, DataSourceError> {
                Ok(ProcessType::UnitProcess)
            }
            fn load_product_system(
                &self,
                _id: u64,
            ) -> std::result::Result<ProductSystemDescriptor, DataSourceError> {
                unimplemented!()
            }
            fn load_impact_method(
                &self,
                _id: u64,
            ) -> std::result::Result<ImpactMethodDescriptor, DataSourceError> {
                unimplemented!()
            }
            fn load_dq_system(&self, _id: u64) -> std::result::Result<DqSystem, DataSourceError> {
                unimplemented!()
            }
            fn load_parameters(
                &self,
                _contexts: &HashSet<u64>,
            ) -> std::result::Result<ParameterTable, DataSourceError> {
                unimplemented!()
            }
        }

        let reference = ProcessProduct::new(1, 10);
        let tech_index = TechIndex::new(reference, 1.0);
        let params = ParameterTable::new();
        let options = AssemblyOptions {
            with_costs: false,
            with_uncertainties: false,
            rng: None,
        };
        let err = assemble(&EmptySource, tech_index, None, &params, options).unwrap_err();
        assert!(matches!(err, LcaError::ProcessNotDefined(1)));
    }
}
