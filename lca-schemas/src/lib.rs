//! Data model for the LCA computation core: flow and process identity,
//! exchange records, linking policy, impact/DQ descriptors, and the
//! read-only data-source contract the core is driven through.

pub mod calc_setup;
pub mod data_source;
pub mod dq;
pub mod exchange;
pub mod flow;
pub mod impact;
pub mod linking;
pub mod process_product;
pub mod uncertainty;
