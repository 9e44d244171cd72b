//! Sankey/contribution traversal (C11, §2 component table): an upstream
//! tree over the technology graph for a single flow, each node carrying the
//! total contribution of one product to that flow and its share of the
//! root's total, pruned below a cutoff share.
//!
//! The node totals below are `ResultProvider::total_flows_of(j)[flow_row]`
//! — the same quantity C8 already exposes per product — organised into a
//! tree via the technosphere links C5 resolved (see the boundary-case test
//! below).

use std::collections::HashSet;

use lca_schemas::process_product::ProcessProduct;

use crate::error::Result;
use crate::result_provider::ResultProvider;

/// One node of an upstream contribution tree: a product, its total
/// contribution to the traced flow, its share of the root total, and the
/// children the traversal expanded before hitting the cutoff.
#[derive(Debug, Clone)]
pub struct SankeyNode {
    pub product: ProcessProduct,
    pub total: f64,
    pub share: f64,
    pub children: Vec<SankeyNode>,
}

/// Builds the upstream tree for `flow_row`, rooted at the tech index's
/// reference product. A child is expanded only if its share of the root
/// total is at least `cutoff`; its own children are then pruned the same
/// way. A product already on the current path is not re-expanded, since
/// any loop it closes is already folded into `total_flows_of` through the
/// matrix inverse (§4.5).
pub fn build_tree(provider: &ResultProvider, flow_row: usize, cutoff: f64) -> Result<SankeyNode> {
    let tech_index = &provider.matrix_data().tech_index;
    let root_product = tech_index.ref_product();
    let root_total = provider.total_flows_of(0)?[flow_row];

    let mut path = HashSet::new();
    path.insert(root_product.process_id);
    build_node(provider, flow_row, root_total, root_product, root_total, cutoff, &mut path)
}

fn build_node(
    provider: &ResultProvider,
    flow_row: usize,
    root_total: f64,
    product: ProcessProduct,
    total: f64,
    cutoff: f64,
    path: &mut HashSet<u64>,
) -> Result<SankeyNode> {
    let share = if root_total == 0.0 { 0.0 } else { total / root_total };

    let tech_index = &provider.matrix_data().tech_index;
    let mut children = Vec::new();
    let mut seen_providers = HashSet::new();
    for (key, child_product) in tech_index.links() {
        if key.0 != product.process_id {
            continue;
        }
        if path.contains(&child_product.process_id) {
            continue;
        }
        if !seen_providers.insert(*child_product) {
            continue;
        }
        let Some(child_position) = tech_index.position_of(child_product) else {
            continue;
        };
        let child_total = provider.total_flows_of(child_position)?[flow_row];
        let child_share = if root_total == 0.0 { 0.0 } else { child_total / root_total };
        if child_share.abs() < cutoff {
            continue;
        }
        path.insert(child_product.process_id);
        children.push(build_node(
            provider,
            flow_row,
            root_total,
            *child_product,
            child_total,
            cutoff,
            path,
        )?);
        path.remove(&child_product.process_id);
    }

    Ok(SankeyNode {
        product,
        total,
        share,
        children,
    })
}
