use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::linking::{LinkingConfig, PreferredType, ProviderLinking};

/// How multi-output processes' exchanges are scaled down to a single
/// product/waste column. The factor itself is precomputed per
/// `(process_id, product_flow_id)` by the data source and carried on the
/// `CalcExchange`; this tag only records which method produced it, for
/// reporting and round-tripping a calculation setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    None,
    Physical,
    Economic,
    Causal,
    UseDefault,
}

impl Default for AllocationMethod {
    fn default() -> Self {
        AllocationMethod::UseDefault
    }
}

/// An explicit override of a parameter's value for this one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRedef {
    pub name: String,
    pub value: f64,
    /// `None` means a global parameter; `Some(id)` scopes it to one process
    /// or product system.
    pub context_id: Option<u64>,
}

/// A resolved table of named parameters in scope for formula evaluation,
/// keyed by `(context_id, name)` with `context_id: None` for globals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTable {
    values: HashMap<(Option<u64>, String), f64>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, context_id: Option<u64>, name: impl Into<String>, value: f64) {
        self.values.insert((context_id, name.into()), value);
    }

    pub fn apply_redef(&mut self, redef: &ParameterRedef) {
        self.insert(redef.context_id, redef.name.clone(), redef.value);
    }

    /// Resolve `name` for `context_id`, falling back to the global scope.
    pub fn get(&self, context_id: Option<u64>, name: &str) -> Option<f64> {
        self.values
            .get(&(context_id, name.to_string()))
            .copied()
            .or_else(|| self.values.get(&(None, name.to_string())).copied())
    }
}

/// The complete input contract for a calculation (§6).
#[derive(Debug, Clone)]
pub struct CalculationSetup {
    pub product_system_id: u64,
    pub demand_amount: Option<f64>,
    pub allocation_method: AllocationMethod,
    pub with_costs: bool,
    pub with_uncertainties: bool,
    pub impact_method_id: Option<u64>,
    pub nw_set_id: Option<u64>,
    pub parameter_redefs: Vec<ParameterRedef>,
    pub rng_seed: Option<u64>,
    pub linking: LinkingConfig,
}

impl CalculationSetup {
    pub fn new(product_system_id: u64) -> Self {
        Self {
            product_system_id,
            demand_amount: None,
            allocation_method: AllocationMethod::default(),
            with_costs: false,
            with_uncertainties: false,
            impact_method_id: None,
            nw_set_id: None,
            parameter_redefs: Vec::new(),
            rng_seed: None,
            linking: LinkingConfig::default(),
        }
    }

    pub fn with_demand(mut self, demand: f64) -> Self {
        self.demand_amount = Some(demand);
        self
    }

    pub fn with_costs(mut self, on: bool) -> Self {
        self.with_costs = on;
        self
    }

    pub fn with_uncertainties(mut self, on: bool) -> Self {
        self.with_uncertainties = on;
        self
    }

    pub fn with_impact_method(mut self, impact_method_id: u64) -> Self {
        self.impact_method_id = Some(impact_method_id);
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_provider_linking(mut self, policy: ProviderLinking) -> Self {
        self.linking.provider_linking = policy;
        self
    }

    pub fn with_preferred_type(mut self, preferred: PreferredType) -> Self {
        self.linking.preferred_type = preferred;
        self
    }
}
