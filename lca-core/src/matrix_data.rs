//! `MatrixData`: the assembled product of the matrix assembler (C6) and the
//! input the calculator (C7) operates on.

use lca_schemas::impact::ImpactIndex;

use crate::flow_index::FlowIndex;
use crate::matrix::DenseMatrix;
use crate::tech_index::TechIndex;

/// Everything the calculator needs to solve one calculation setup: the
/// indices that give the matrices meaning, and the matrices themselves.
#[derive(Debug, Clone)]
pub struct MatrixData {
    pub tech_index: TechIndex,
    pub flow_index: FlowIndex,
    pub impact_index: Option<ImpactIndex>,
    pub technology_matrix: DenseMatrix,
    pub intervention_matrix: DenseMatrix,
    pub impact_matrix: Option<DenseMatrix>,
    pub demand_vector: Vec<f64>,
    pub cost_vector: Option<Vec<f64>>,
}

impl MatrixData {
    pub fn tech_size(&self) -> usize {
        self.tech_index.len()
    }

    pub fn flow_size(&self) -> usize {
        self.flow_index.len()
    }

    pub fn impact_size(&self) -> usize {
        self.impact_index.as_ref().map_or(0, |i| i.len())
    }
}
