//! In-memory [`DataSource`] backed by a single YAML fixture file, loaded
//! once at start-up into a set of lookup maps.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use lca_core::error::LcaError;
use lca_schemas::calc_setup::ParameterTable;
use lca_schemas::data_source::{
    DataSource, DataSourceError, ImpactMethodDescriptor, ProductSystemDescriptor,
};
use lca_schemas::dq::DqSystem;
use lca_schemas::exchange::CalcExchange;
use lca_schemas::impact::ImpactCategory;
use lca_schemas::process_product::{ProcessLink, ProcessProduct, ProcessType};

/// One process entry in the fixture: its type and its full exchange table.
#[derive(Debug, Deserialize)]
pub struct ProcessFixture {
    pub process_id: u64,
    pub process_type: ProcessType,
    pub exchanges: Vec<CalcExchange>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSystemFixture {
    pub id: u64,
    pub reference: ProcessProduct,
    pub default_demand: f64,
    #[serde(default)]
    pub process_links: Vec<ProcessLink>,
}

#[derive(Debug, Deserialize)]
pub struct ImpactMethodFixture {
    pub id: u64,
    pub categories: Vec<ImpactCategory>,
}

#[derive(Debug, Deserialize)]
pub struct DqSystemFixture {
    pub id: u64,
    #[serde(flatten)]
    pub system: DqSystem,
}

#[derive(Debug, Deserialize)]
pub struct ParameterFixture {
    #[serde(default)]
    pub context_id: Option<u64>,
    pub name: String,
    pub value: f64,
}

/// The whole fixture document, as read from `--setup`'s sibling data file.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub processes: Vec<ProcessFixture>,
    #[serde(default)]
    pub product_systems: Vec<ProductSystemFixture>,
    #[serde(default)]
    pub impact_methods: Vec<ImpactMethodFixture>,
    #[serde(default)]
    pub dq_systems: Vec<DqSystemFixture>,
    #[serde(default)]
    pub parameters: Vec<ParameterFixture>,
}

/// An in-memory [`DataSource`]: every lookup the core needs, pre-indexed
/// from a [`Fixture`] loaded once at start-up.
pub struct ExampleDataSource {
    process_types: HashMap<u64, ProcessType>,
    exchanges: HashMap<u64, Vec<CalcExchange>>,
    providers_by_flow: HashMap<u64, Vec<(ProcessProduct, ProcessType)>>,
    product_systems: HashMap<u64, ProductSystemDescriptor>,
    impact_methods: HashMap<u64, ImpactMethodDescriptor>,
    dq_systems: HashMap<u64, DqSystem>,
    parameters: ParameterTable,
}

impl ExampleDataSource {
    /// Loads a fixture YAML file from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        println!("Loading fixture data from '{}'...", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture file: {:?}", path))?;
        let fixture: Fixture = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse fixture YAML from {:?}", path))?;
        println!("Fixture loaded successfully.");
        Ok(Self::from_fixture(fixture))
    }

    fn from_fixture(fixture: Fixture) -> Self {
        let mut process_types = HashMap::new();
        let mut exchanges = HashMap::new();
        let mut providers_by_flow: HashMap<u64, Vec<(ProcessProduct, ProcessType)>> =
            HashMap::new();

        for process in fixture.processes {
            process_types.insert(process.process_id, process.process_type);
            for exchange in &process.exchanges {
                if exchange.is_quantitative_reference {
                    providers_by_flow.entry(exchange.flow_id).or_default().push((
                        ProcessProduct::new(process.process_id, exchange.flow_id),
                        process.process_type,
                    ));
                }
            }
            exchanges.insert(process.process_id, process.exchanges);
        }

        let product_systems = fixture
            .product_systems
            .into_iter()
            .map(|ps| {
                (
                    ps.id,
                    ProductSystemDescriptor {
                        process_links: ps.process_links,
                        reference: ps.reference,
                        default_demand: ps.default_demand,
                    },
                )
            })
            .collect();

        let impact_methods = fixture
            .impact_methods
            .into_iter()
            .map(|m| {
                (
                    m.id,
                    ImpactMethodDescriptor {
                        categories: m.categories,
                    },
                )
            })
            .collect();

        let dq_systems = fixture
            .dq_systems
            .into_iter()
            .map(|d| (d.id, d.system))
            .collect();

        let mut parameters = ParameterTable::new();
        for param in fixture.parameters {
            parameters.insert(param.context_id, param.name, param.value);
        }

        Self {
            process_types,
            exchanges,
            providers_by_flow,
            product_systems,
            impact_methods,
            dq_systems,
            parameters,
        }
    }
}

impl DataSource for ExampleDataSource {
    fn load_exchanges(
        &self,
        process_ids: &HashSet<u64>,
    ) -> Result<HashMap<u64, Vec<CalcExchange>>, DataSourceError> {
        Ok(process_ids
            .iter()
            .filter_map(|id| self.exchanges.get(id).map(|ex| (*id, ex.clone())))
            .collect())
    }

    fn load_providers(
        &self,
        flow_id: u64,
    ) -> Result<Vec<(ProcessProduct, ProcessType)>, DataSourceError> {
        Ok(self.providers_by_flow.get(&flow_id).cloned().unwrap_or_default())
    }

    fn load_process_type(&self, process_id: u64) -> Result<ProcessType, DataSourceError> {
        self.process_types
            .get(&process_id)
            .copied()
            .ok_or_else(|| DataSourceError(format!("unknown process {process_id}")))
    }

    fn load_product_system(
        &self,
        id: u64,
    ) -> Result<ProductSystemDescriptor, DataSourceError> {
        self.product_systems
            .get(&id)
            .cloned()
            .ok_or_else(|| DataSourceError(format!("unknown product system {id}")))
    }

    fn load_impact_method(&self, id: u64) -> Result<ImpactMethodDescriptor, DataSourceError> {
        self.impact_methods
            .get(&id)
            .cloned()
            .ok_or_else(|| DataSourceError(format!("unknown impact method {id}")))
    }

    fn load_dq_system(&self, id: u64) -> Result<DqSystem, DataSourceError> {
        self.dq_systems
            .get(&id)
            .cloned()
            .ok_or_else(|| DataSourceError(format!("unknown DQ system {id}")))
    }

    fn load_parameters(&self, _contexts: &HashSet<u64>) -> Result<ParameterTable, DataSourceError> {
        Ok(self.parameters.clone())
    }
}

/// Converts a [`DataSourceError`] surfaced through the core into an
/// `anyhow`-friendly error for the app layer.
pub fn into_app_error(err: LcaError) -> anyhow::Error {
    anyhow::Error::new(err)
}
