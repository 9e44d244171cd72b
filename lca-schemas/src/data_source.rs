use std::collections::{HashMap, HashSet};

use crate::calc_setup::ParameterTable;
use crate::dq::DqSystem;
use crate::exchange::CalcExchange;
use crate::impact::ImpactCategory;
use crate::process_product::{ProcessLink, ProcessProduct, ProcessType};

/// Error surfaced by a [`DataSource`] implementation. The core treats every
/// variant the same way: a structural failure that aborts the calculation
/// (§7). Storage-specific detail belongs in the adapter, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceError(pub String);

impl std::fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data source error: {}", self.0)
    }
}

impl std::error::Error for DataSourceError {}

/// The persisted shape of a product system: its author-declared links, any
/// parameter redefinitions carried with the system itself, and its
/// reference product/demand.
#[derive(Debug, Clone)]
pub struct ProductSystemDescriptor {
    pub process_links: Vec<ProcessLink>,
    pub reference: ProcessProduct,
    pub default_demand: f64,
}

/// The persisted shape of an impact assessment method.
#[derive(Debug, Clone)]
pub struct ImpactMethodDescriptor {
    pub categories: Vec<ImpactCategory>,
}

/// Read-only collaborator the core depends on but never implements: SQL
/// access, JSON/ILCD/SimaPro import, and remote data-stock clients all live
/// behind this trait, out of scope for the computation core itself (§1).
pub trait DataSource {
    fn load_exchanges(
        &self,
        process_ids: &HashSet<u64>,
    ) -> Result<HashMap<u64, Vec<CalcExchange>>, DataSourceError>;

    fn load_providers(&self, flow_id: u64) -> Result<Vec<(ProcessProduct, ProcessType)>, DataSourceError>;

    fn load_process_type(&self, process_id: u64) -> Result<ProcessType, DataSourceError>;

    fn load_product_system(
        &self,
        id: u64,
    ) -> Result<ProductSystemDescriptor, DataSourceError>;

    fn load_impact_method(
        &self,
        id: u64,
    ) -> Result<ImpactMethodDescriptor, DataSourceError>;

    fn load_dq_system(&self, id: u64) -> Result<DqSystem, DataSourceError>;

    fn load_parameters(&self, contexts: &HashSet<u64>) -> Result<ParameterTable, DataSourceError>;
}
