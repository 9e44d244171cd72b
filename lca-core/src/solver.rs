//! LCA calculator solver contract (C7, §4.4) and a dense partial-pivot
//! Gaussian-elimination implementation. Only the algebraic operations a
//! solver must expose are fixed; this is one swappable `Solver`, not the
//! contract itself.

use crate::error::{LcaError, Result};
use crate::matrix::DenseMatrix;

/// The algebraic operations the LCA calculator (C7) needs from a solver.
pub trait Solver {
    /// `s` with `A·s = f`.
    fn solve(&self, a: &DenseMatrix, f: &[f64]) -> Result<Vec<f64>>;

    /// `x` with `A·x = v·e_j` (single-column demand).
    fn solve_col(&self, a: &DenseMatrix, j: usize, v: f64) -> Result<Vec<f64>>;

    /// `A⁻¹`.
    fn invert(&self, a: &DenseMatrix) -> Result<DenseMatrix>;

    /// Dense `X·Y`.
    fn multiply(&self, x: &DenseMatrix, y: &DenseMatrix) -> DenseMatrix;

    /// `X·v`.
    fn mul_vec(&self, x: &DenseMatrix, v: &[f64]) -> Vec<f64>;
}

/// Default solver: partial-pivot Gaussian elimination (LU decomposition)
/// over `ndarray`-backed dense matrices. Deterministic for identical
/// inputs and independent of any RNG state, per the §6 solver contract.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenseLuSolver;

/// An in-place LU factorization with partial pivoting: `lu` holds `L`
/// (unit diagonal, below) and `U` (on and above the diagonal) packed into
/// one `n×n` matrix, `perm` records the row permutation applied during
/// pivoting.
struct LuFactorization {
    lu: Vec<Vec<f64>>,
    perm: Vec<usize>,
    n: usize,
}

const SINGULAR_EPS: f64 = 1e-12;

fn lu_decompose(a: &DenseMatrix) -> Result<LuFactorization> {
    let n = a.rows();
    if n != a.cols() {
        return Err(LcaError::SingularMatrix(0));
    }
    let mut lu: Vec<Vec<f64>> = (0..n).map(|i| a.row(i)).collect();
    let mut perm: Vec<usize> = (0..n).collect();

    for col in 0..n {
        // Partial pivot: find the largest-magnitude entry at or below the
        // diagonal in this column.
        let mut pivot_row = col;
        let mut pivot_val = lu[col][col].abs();
        for row in (col + 1)..n {
            let candidate = lu[row][col].abs();
            if candidate > pivot_val {
                pivot_val = candidate;
                pivot_row = row;
            }
        }
        if pivot_val < SINGULAR_EPS {
            return Err(LcaError::SingularMatrix(col));
        }
        if pivot_row != col {
            lu.swap(pivot_row, col);
            perm.swap(pivot_row, col);
        }

        for row in (col + 1)..n {
            let factor = lu[row][col] / lu[col][col];
            lu[row][col] = factor;
            for k in (col + 1)..n {
                let sub = factor * lu[col][k];
                lu[row][k] -= sub;
            }
        }
    }

    Ok(LuFactorization { lu, perm, n })
}

fn lu_solve(fact: &LuFactorization, b: &[f64]) -> Vec<f64> {
    let n = fact.n;
    let mut permuted = vec![0.0; n];
    for i in 0..n {
        permuted[i] = b[fact.perm[i]];
    }

    // Forward substitution: L·y = Pb (L has implicit unit diagonal).
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut acc = permuted[i];
        for k in 0..i {
            acc -= fact.lu[i][k] * y[k];
        }
        y[i] = acc;
    }

    // Back substitution: U·x = y.
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut acc = y[i];
        for k in (i + 1)..n {
            acc -= fact.lu[i][k] * x[k];
        }
        x[i] = acc / fact.lu[i][i];
    }
    x
}

impl Solver for DenseLuSolver {
    fn solve(&self, a: &DenseMatrix, f: &[f64]) -> Result<Vec<f64>> {
        let fact = lu_decompose(a)?;
        Ok(lu_solve(&fact, f))
    }

    fn solve_col(&self, a: &DenseMatrix, j: usize, v: f64) -> Result<Vec<f64>> {
        let fact = lu_decompose(a)?;
        let mut rhs = vec![0.0; a.rows()];
        rhs[j] = v;
        Ok(lu_solve(&fact, &rhs))
    }

    fn invert(&self, a: &DenseMatrix) -> Result<DenseMatrix> {
        let fact = lu_decompose(a)?;
        let n = a.rows();
        let mut inverse = DenseMatrix::zeros(n, n);
        for j in 0..n {
            let mut unit = vec![0.0; n];
            unit[j] = 1.0;
            let column = lu_solve(&fact, &unit);
            inverse.set_column(j, &column);
        }
        Ok(inverse)
    }

    fn multiply(&self, x: &DenseMatrix, y: &DenseMatrix) -> DenseMatrix {
        x.multiply(y)
    }

    fn mul_vec(&self, x: &DenseMatrix, v: &[f64]) -> Vec<f64> {
        x.mul_vec(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} !~ {b}");
    }

    #[test]
    fn solves_identity_system() {
        let a = DenseMatrix::from_rows(vec![vec![1.0]]);
        let solver = DenseLuSolver;
        let s = solver.solve(&a, &[1.0]).unwrap();
        assert_close(s[0], 1.0);
    }

    #[test]
    fn solves_cyclic_system_from_spec_boundary_case() {
        // A = [[1,0,0],[-1,1,-0.1],[0,-2,1]], f = [1,0,0]
        let a = DenseMatrix::from_rows(vec![
            vec![1.0, 0.0, 0.0],
            vec![-1.0, 1.0, -0.1],
            vec![0.0, -2.0, 1.0],
        ]);
        let solver = DenseLuSolver;
        let s = solver.solve(&a, &[1.0, 0.0, 0.0]).unwrap();
        // A*s = f check
        let reconstructed = a.mul_vec(&s);
        assert_close(reconstructed[0], 1.0);
        assert_close(reconstructed[1], 0.0);
        assert_close(reconstructed[2], 0.0);
    }

    #[test]
    fn invert_round_trips_through_multiply() {
        let a = DenseMatrix::from_rows(vec![vec![2.0, 0.0], vec![0.0, 4.0]]);
        let solver = DenseLuSolver;
        let inv = solver.invert(&a).unwrap();
        let product = solver.multiply(&a, &inv);
        assert_close(product.get(0, 0), 1.0);
        assert_close(product.get(1, 1), 1.0);
        assert_close(product.get(0, 1), 0.0);
        assert_close(product.get(1, 0), 0.0);
    }

    #[test]
    fn singular_matrix_is_reported() {
        let a = DenseMatrix::from_rows(vec![vec![1.0, 1.0], vec![1.0, 1.0]]);
        let solver = DenseLuSolver;
        assert!(solver.solve(&a, &[1.0, 1.0]).is_err());
    }
}
