//! LCA computation core: tech-index construction, matrix assembly, the
//! algebraic solver contract, result views, data-quality aggregation and
//! the Monte-Carlo simulator. Depends on [`lca_schemas`] for the data
//! model and the read-only `DataSource` contract it is driven through.

pub mod calculator;
pub mod dq_aggregator;
pub mod error;
pub mod flow_index;
pub mod formula;
pub mod logger;
pub mod matrix;
pub mod matrix_assembler;
pub mod matrix_data;
pub mod provider_search;
pub mod result_provider;
pub mod sankey;
pub mod simulation;
pub mod solver;
pub mod tech_index;
pub mod tech_index_builder;
pub mod uncertainty;

pub use error::{ErrorCode, LcaError, Result};
pub use matrix_data::MatrixData;
pub use result_provider::ResultProvider;
