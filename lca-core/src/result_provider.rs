//! Result provider (C8, §4.5): the read-only view callers query after a
//! calculation. `ResultProvider` is sealed to three capability levels —
//! callers get exactly the variant they asked the calculator to build and
//! never have to match on it to use the shared accessors.

use std::cell::RefCell;

use crate::calculator::{self, SimpleResult};
use crate::error::{LcaError, Result};
use crate::matrix::DenseMatrix;
use crate::matrix_data::MatrixData;
use crate::solver::Solver;

struct Shared {
    matrix_data: MatrixData,
    scaling: Vec<f64>,
    flow_totals: Vec<f64>,
    impact_totals: Option<Vec<f64>>,
    total_cost: Option<f64>,
}

impl Shared {
    fn from_simple(matrix_data: MatrixData, result: SimpleResult) -> Self {
        Self {
            matrix_data,
            scaling: result.scaling,
            flow_totals: result.flow_totals,
            impact_totals: result.impact_totals,
            total_cost: result.total_cost,
        }
    }
}

/// Built from `solve_simple` alone: scaling, direct/total requirements and
/// flow/impact/cost totals, but no contribution or upstream breakdown.
pub struct SimpleResultProvider {
    shared: Shared,
}

/// Built with the technology matrix inverted up front: every full-result
/// query is a lookup.
pub struct EagerFullProvider {
    shared: Shared,
    inverse: DenseMatrix,
    total_flows_all: DenseMatrix,
}

/// Built with a solver kept around: the inverse and the total-flows matrix
/// are computed on first use and memoised, not up front.
pub struct LazyFullProvider {
    shared: Shared,
    solver: Box<dyn Solver>,
    inverse: RefCell<Option<DenseMatrix>>,
    total_flows_all: RefCell<Option<DenseMatrix>>,
}

/// A calculation's result view, at one of the three capability levels the
/// calculator can build.
pub enum ResultProvider {
    Simple(SimpleResultProvider),
    EagerFull(EagerFullProvider),
    Lazy(LazyFullProvider),
}

const FULL_RESULT_UNSUPPORTED: &str =
    "full-result query requires an EagerFull or Lazy result provider";

impl ResultProvider {
    pub fn simple(matrix_data: MatrixData, solver: &dyn Solver) -> Result<Self> {
        let result = calculator::solve_simple(&matrix_data, solver)?;
        Ok(ResultProvider::Simple(SimpleResultProvider {
            shared: Shared::from_simple(matrix_data, result),
        }))
    }

    pub fn eager_full(matrix_data: MatrixData, solver: &dyn Solver) -> Result<Self> {
        let result = calculator::solve_simple(&matrix_data, solver)?;
        let inverse = calculator::invert_tech_matrix(&matrix_data, solver)?;
        let total_flows_all = calculator::total_flows_all(&matrix_data, &inverse);
        Ok(ResultProvider::EagerFull(EagerFullProvider {
            shared: Shared::from_simple(matrix_data, result),
            inverse,
            total_flows_all,
        }))
    }

    pub fn lazy(matrix_data: MatrixData, solver: Box<dyn Solver>) -> Result<Self> {
        let result = calculator::solve_simple(&matrix_data, solver.as_ref())?;
        Ok(ResultProvider::Lazy(LazyFullProvider {
            shared: Shared::from_simple(matrix_data, result),
            solver,
            inverse: RefCell::new(None),
            total_flows_all: RefCell::new(None),
        }))
    }

    fn shared(&self) -> &Shared {
        match self {
            ResultProvider::Simple(p) => &p.shared,
            ResultProvider::EagerFull(p) => &p.shared,
            ResultProvider::Lazy(p) => &p.shared,
        }
    }

    pub fn scaling_vector(&self) -> &[f64] {
        &self.shared().scaling
    }

    pub fn scaling_of(&self, j: usize) -> f64 {
        self.shared().scaling[j]
    }

    /// `diag(A) ⊙ s`.
    pub fn total_requirements(&self) -> Vec<f64> {
        let shared = self.shared();
        shared
            .matrix_data
            .technology_matrix
            .diag()
            .iter()
            .zip(&shared.scaling)
            .map(|(a_jj, s_j)| a_jj * s_j)
            .collect()
    }

    pub fn total_requirements_of(&self, j: usize) -> f64 {
        let shared = self.shared();
        shared.matrix_data.technology_matrix.get(j, j) * shared.scaling[j]
    }

    pub fn tech_column(&self, j: usize) -> Vec<f64> {
        self.shared().matrix_data.technology_matrix.column(j)
    }

    pub fn tech_value(&self, i: usize, j: usize) -> f64 {
        self.shared().matrix_data.technology_matrix.get(i, j)
    }

    pub fn scaled_tech(&self, i: usize, j: usize) -> f64 {
        let shared = self.shared();
        shared.scaling[j] * shared.matrix_data.technology_matrix.get(i, j)
    }

    /// `+(-B[i,j]·s[j])` for an input elementary flow, `B[i,j]·s[j]`
    /// otherwise — a resource draw is reported positive, not as the
    /// negative-signed coefficient the assembler stores it as (§4.4
    /// invariant 3).
    pub fn direct_flows(&self, j: usize) -> Vec<f64> {
        let shared = self.shared();
        let s_j = shared.scaling[j];
        shared
            .matrix_data
            .intervention_matrix
            .column(j)
            .iter()
            .enumerate()
            .map(|(row, b_ij)| {
                let raw = b_ij * s_j;
                match shared.matrix_data.flow_index.get(row) {
                    Some(flow) if flow.is_input => calculator::adopt_input_sign(raw),
                    _ => raw,
                }
            })
            .collect()
    }

    pub fn direct_impacts(&self, j: usize) -> Result<Vec<f64>> {
        let shared = self.shared();
        let impact_matrix = shared
            .matrix_data
            .impact_matrix
            .as_ref()
            .ok_or_else(|| LcaError::ConfigError("no impact method in scope".to_string()))?;
        let direct_flows = self.direct_flows(j);
        Ok(impact_matrix.mul_vec(&direct_flows))
    }

    pub fn flow_impacts(&self, flow_row: usize) -> Result<Vec<f64>> {
        let shared = self.shared();
        let impact_matrix = shared
            .matrix_data
            .impact_matrix
            .as_ref()
            .ok_or_else(|| LcaError::ConfigError("no impact method in scope".to_string()))?;
        let g_f = shared.flow_totals[flow_row];
        Ok(impact_matrix.column(flow_row).iter().map(|c| c * g_f).collect())
    }

    pub fn total_costs(&self) -> Option<f64> {
        self.shared().total_cost
    }

    pub fn matrix_data(&self) -> &MatrixData {
        &self.shared().matrix_data
    }

    pub fn flow_totals(&self) -> &[f64] {
        &self.shared().flow_totals
    }

    /// `flow_totals()` with input elementary flows sign-adopted to positive
    /// (§4.4 invariant 3) — the view callers should report to a user,
    /// as opposed to `flow_totals()`'s raw, sign-carrying values used
    /// internally (e.g. by the impact characterization step).
    pub fn reported_flow_totals(&self) -> Vec<f64> {
        let shared = self.shared();
        shared
            .flow_totals
            .iter()
            .enumerate()
            .map(|(row, g_i)| match shared.matrix_data.flow_index.get(row) {
                Some(flow) if flow.is_input => calculator::adopt_input_sign(*g_i),
                _ => *g_i,
            })
            .collect()
    }

    fn inverse(&self) -> Result<DenseMatrix> {
        match self {
            ResultProvider::Simple(_) => {
                Err(LcaError::ConfigError(FULL_RESULT_UNSUPPORTED.to_string()))
            }
            ResultProvider::EagerFull(p) => Ok(p.inverse.clone()),
            ResultProvider::Lazy(p) => {
                if p.inverse.borrow().is_none() {
                    let inverse = calculator::invert_tech_matrix(&p.shared.matrix_data, p.solver.as_ref())?;
                    *p.inverse.borrow_mut() = Some(inverse);
                }
                Ok(p.inverse.borrow().clone().unwrap())
            }
        }
    }

    fn total_flows_all_matrix(&self) -> Result<DenseMatrix> {
        match self {
            ResultProvider::Simple(_) => {
                Err(LcaError::ConfigError(FULL_RESULT_UNSUPPORTED.to_string()))
            }
            ResultProvider::EagerFull(p) => Ok(p.total_flows_all.clone()),
            ResultProvider::Lazy(p) => {
                if p.total_flows_all.borrow().is_none() {
                    let inverse = self.inverse()?;
                    let m = calculator::total_flows_all(&p.shared.matrix_data, &inverse);
                    *p.total_flows_all.borrow_mut() = Some(m);
                }
                Ok(p.total_flows_all.borrow().clone().unwrap())
            }
        }
    }

    /// Column `j` of `A⁻¹`: the solution of satisfying one unit of demand
    /// for product `j` alone.
    pub fn solution_of_one(&self, j: usize) -> Result<Vec<f64>> {
        Ok(self.inverse()?.column(j))
    }

    pub fn loop_factor(&self, j: usize) -> Result<f64> {
        let inverse = self.inverse()?;
        Ok(calculator::loop_factor(&self.shared().matrix_data, &inverse, j))
    }

    pub fn total_factor(&self, j: usize) -> Result<f64> {
        Ok(self.loop_factor(j)? * self.total_requirements_of(j))
    }

    /// `M[:,j]`: total flows of one unit of product `j`.
    pub fn total_flows_of_one(&self, j: usize) -> Result<Vec<f64>> {
        Ok(self.total_flows_all_matrix()?.column(j))
    }

    /// `M[:,j] · total_factor(j)`.
    pub fn total_flows_of(&self, j: usize) -> Result<Vec<f64>> {
        let factor = self.total_factor(j)?;
        Ok(self
            .total_flows_of_one(j)?
            .iter()
            .map(|v| v * factor)
            .collect())
    }

    pub fn total_impacts_of(&self, j: usize) -> Result<Vec<f64>> {
        let shared = self.shared();
        let impact_matrix = shared
            .matrix_data
            .impact_matrix
            .as_ref()
            .ok_or_else(|| LcaError::ConfigError("no impact method in scope".to_string()))?;
        let flows = self.total_flows_of(j)?;
        Ok(impact_matrix.mul_vec(&flows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow_index::FlowIndex;
    use crate::solver::DenseLuSolver;
    use crate::tech_index::TechIndex;
    use lca_schemas::process_product::ProcessProduct;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} !~ {b}");
    }

    fn matrix_data() -> MatrixData {
        let reference = ProcessProduct::new(1, 10);
        let tech_index = TechIndex::new(reference, 4.0);
        MatrixData {
            tech_index,
            flow_index: FlowIndex::new(),
            impact_index: None,
            technology_matrix: DenseMatrix::from_rows(vec![vec![2.0]]),
            intervention_matrix: DenseMatrix::from_rows(vec![vec![3.0]]),
            impact_matrix: None,
            demand_vector: vec![4.0],
            cost_vector: None,
        }
    }

    #[test]
    fn simple_provider_rejects_full_result_queries() {
        let solver = DenseLuSolver;
        let provider = ResultProvider::simple(matrix_data(), &solver).unwrap();
        assert!(provider.solution_of_one(0).is_err());
        assert_close(provider.scaling_of(0), 2.0);
    }

    #[test]
    fn eager_and_lazy_providers_agree_on_solution_of_one() {
        let solver = DenseLuSolver;
        let eager = ResultProvider::eager_full(matrix_data(), &solver).unwrap();
        let lazy = ResultProvider::lazy(matrix_data(), Box::new(DenseLuSolver)).unwrap();
        assert_close(eager.solution_of_one(0).unwrap()[0], lazy.solution_of_one(0).unwrap()[0]);
        assert_close(eager.total_factor(0).unwrap(), 1.0);
        assert_close(lazy.total_factor(0).unwrap(), 1.0);
    }

    #[test]
    fn input_flows_are_reported_with_positive_sign() {
        use lca_schemas::flow::{FlowRef, FlowType};

        let reference = ProcessProduct::new(1, 10);
        let tech_index = TechIndex::new(reference, 4.0);
        let mut flow_index = FlowIndex::new();
        flow_index.push(FlowRef::new(200, FlowType::Elementary, true)); // input, row 0
        flow_index.push(FlowRef::new(201, FlowType::Elementary, false)); // output, row 1

        let data = MatrixData {
            tech_index,
            flow_index,
            impact_index: None,
            technology_matrix: DenseMatrix::from_rows(vec![vec![2.0]]),
            // row 0 (input) carries the assembler's negative sign convention,
            // row 1 (output) is positive.
            intervention_matrix: DenseMatrix::from_rows(vec![vec![-5.0], vec![7.0]]),
            impact_matrix: None,
            demand_vector: vec![4.0],
            cost_vector: None,
        };

        let solver = DenseLuSolver;
        let provider = ResultProvider::simple(data, &solver).unwrap();

        let direct = provider.direct_flows(0);
        assert_close(direct[0], 10.0); // -(-5.0 * 2.0)
        assert_close(direct[1], 14.0); // 7.0 * 2.0, unchanged

        let reported = provider.reported_flow_totals();
        assert_close(reported[0], 10.0);
        assert_close(reported[1], 14.0);

        // The raw accessor keeps the assembler's sign convention intact,
        // since the impact characterization step depends on it.
        assert_close(provider.flow_totals()[0], -10.0);
    }
}
