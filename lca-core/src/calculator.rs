//! LCA calculator (C7, §4.4): solves a [`MatrixData`] for its scaling
//! vector, flow and impact totals, and (on request) the full
//! contribution/upstream breakdown.

use crate::error::{LcaError, Result};
use crate::matrix::DenseMatrix;
use crate::matrix_data::MatrixData;
use crate::solver::Solver;

/// The "simple" result: just the scaling vector and the totals derived
/// from it. Cheapest path through the calculator — no matrix inversion.
#[derive(Debug, Clone)]
pub struct SimpleResult {
    pub scaling: Vec<f64>,
    pub flow_totals: Vec<f64>,
    pub impact_totals: Option<Vec<f64>>,
    pub total_cost: Option<f64>,
}

fn check_finite(values: &[f64]) -> Result<()> {
    for (i, v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(LcaError::NonFiniteResult(i));
        }
    }
    Ok(())
}

/// `s = solve(A, f)`; `g = B·s`; `h = C·g`; `total_cost = Σ k[j]·s[j]`.
pub fn solve_simple(matrix_data: &MatrixData, solver: &dyn Solver) -> Result<SimpleResult> {
    let scaling = solver.solve(&matrix_data.technology_matrix, &matrix_data.demand_vector)?;
    check_finite(&scaling)?;

    let flow_totals = matrix_data.intervention_matrix.mul_vec(&scaling);
    let impact_totals = matrix_data
        .impact_matrix
        .as_ref()
        .map(|c| c.mul_vec(&flow_totals));
    let total_cost = matrix_data
        .cost_vector
        .as_ref()
        .map(|costs| costs.iter().zip(&scaling).map(|(k, s)| k * s).sum());

    Ok(SimpleResult {
        scaling,
        flow_totals,
        impact_totals,
        total_cost,
    })
}

/// `A⁻¹`, for providers that need contribution/upstream breakdowns.
pub fn invert_tech_matrix(matrix_data: &MatrixData, solver: &dyn Solver) -> Result<DenseMatrix> {
    solver.invert(&matrix_data.technology_matrix)
}

/// `M = B·A⁻¹`: total flows of one unit of every product, by column.
pub fn total_flows_all(matrix_data: &MatrixData, inverse: &DenseMatrix) -> DenseMatrix {
    matrix_data.intervention_matrix.multiply(inverse)
}

/// `loop_j = 1 / (A[j,j] · A⁻¹[j,j])`. For a non-looping product
/// `A⁻¹[j,j] = 1/A[j,j]` and `loop_j = 1` (§4.4).
pub fn loop_factor(matrix_data: &MatrixData, inverse: &DenseMatrix, j: usize) -> f64 {
    let a_jj = matrix_data.technology_matrix.get(j, j);
    let inv_jj = inverse.get(j, j);
    1.0 / (a_jj * inv_jj)
}

/// Input elementary flows are reported with positive sign; negation is
/// skipped for an exact zero to avoid signed-zero artifacts (§4.4).
pub fn adopt_input_sign(value: f64) -> f64 {
    if value != 0.0 {
        -value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::DenseLuSolver;
    use lca_schemas::process_product::ProcessProduct;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} !~ {b}");
    }

    fn simple_matrix_data() -> MatrixData {
        use crate::flow_index::FlowIndex;
        use crate::tech_index::TechIndex;

        let reference = ProcessProduct::new(1, 10);
        let tech_index = TechIndex::new(reference, 4.0);
        let technology_matrix = DenseMatrix::from_rows(vec![vec![2.0]]);
        let intervention_matrix = DenseMatrix::from_rows(vec![vec![3.0]]);

        MatrixData {
            tech_index,
            flow_index: FlowIndex::new(),
            impact_index: None,
            technology_matrix,
            intervention_matrix,
            impact_matrix: None,
            demand_vector: vec![4.0],
            cost_vector: None,
        }
    }

    #[test]
    fn simple_result_scales_by_the_demand() {
        let matrix_data = simple_matrix_data();
        let solver = DenseLuSolver;
        let result = solve_simple(&matrix_data, &solver).unwrap();
        assert_close(result.scaling[0], 2.0);
        assert_close(result.flow_totals[0], 6.0);
    }

    #[test]
    fn loop_factor_is_one_for_a_non_looping_product() {
        let matrix_data = simple_matrix_data();
        let solver = DenseLuSolver;
        let inverse = invert_tech_matrix(&matrix_data, &solver).unwrap();
        assert_close(loop_factor(&matrix_data, &inverse, 0), 1.0);
    }

    #[test]
    fn sign_adoption_skips_negation_of_exact_zero() {
        assert_eq!(adopt_input_sign(0.0), 0.0);
        assert_eq!(adopt_input_sign(3.0), -3.0);
        assert_eq!(adopt_input_sign(-3.0), 3.0);
    }
}
