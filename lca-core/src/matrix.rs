//! Matrix façade (C2): a dense, ndarray-backed matrix plus a sparse
//! triplet accumulator that the assembler fills column by column and later
//! upgrades to dense for the solver. Column-major-vs-row-major is an
//! implementation detail the façade hides; `ndarray::Array2` stores
//! row-major by default, which is what every view below assumes.

use ndarray::{s, Array2};
use std::collections::HashMap;

/// A dense matrix of `f64`, used for `A`, `B`, `C` once assembly is
/// complete and for every solver operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    data: Array2<f64>,
}

impl DenseMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.len());
        let mut data = Array2::zeros((nrows, ncols));
        for (i, row) in rows.into_iter().enumerate() {
            for (j, v) in row.into_iter().enumerate() {
                data[[i, j]] = v;
            }
        }
        Self { data }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[[row, col]]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[[row, col]] = value;
    }

    pub fn add(&mut self, row: usize, col: usize, delta: f64) {
        self.data[[row, col]] += delta;
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        self.data.column(col).to_vec()
    }

    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).to_vec()
    }

    pub fn set_column(&mut self, col: usize, values: &[f64]) {
        for (row, v) in values.iter().enumerate() {
            self.data[[row, col]] = *v;
        }
    }

    /// Appends `count` zero rows, keeping column count unchanged, and
    /// returns the row index of the first appended row. Used to widen the
    /// intervention matrix when a flow surfaces after initial assembly
    /// (e.g. a sub-system-only elementary flow in the simulator, §4.7).
    pub fn push_rows(&mut self, count: usize) -> usize {
        let old_rows = self.rows();
        if count == 0 {
            return old_rows;
        }
        let cols = self.cols();
        let mut data = Array2::zeros((old_rows + count, cols));
        data.slice_mut(s![0..old_rows, ..]).assign(&self.data);
        self.data = data;
        old_rows
    }

    pub fn diag(&self) -> Vec<f64> {
        let n = self.rows().min(self.cols());
        (0..n).map(|i| self.data[[i, i]]).collect()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn as_array_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    /// `X·v`
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.cols(), "mul_vec: dimension mismatch");
        let mut out = vec![0.0; self.rows()];
        for i in 0..self.rows() {
            let mut acc = 0.0;
            for j in 0..self.cols() {
                acc += self.data[[i, j]] * v[j];
            }
            out[i] = acc;
        }
        out
    }

    /// Dense `X·Y`.
    pub fn multiply(&self, other: &DenseMatrix) -> DenseMatrix {
        assert_eq!(
            self.cols(),
            other.rows(),
            "multiply: inner dimension mismatch"
        );
        DenseMatrix {
            data: self.data.dot(&other.data),
        }
    }
}

/// A mutable sparse accumulator keyed by `(row, col)`. The assembler builds
/// `A`/`B`/`C` here — most entries stay zero — then the calculator upgrades
/// to [`DenseMatrix`] once, before any solver operation.
#[derive(Debug, Clone, Default)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    entries: HashMap<(usize, usize), f64>,
}

impl SparseMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: HashMap::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.rows && col < self.cols);
        if value == 0.0 {
            self.entries.remove(&(row, col));
        } else {
            self.entries.insert((row, col), value);
        }
    }

    pub fn add(&mut self, row: usize, col: usize, delta: f64) {
        debug_assert!(row < self.rows && col < self.cols);
        let entry = self.entries.entry((row, col)).or_insert(0.0);
        *entry += delta;
        if *entry == 0.0 {
            self.entries.remove(&(row, col));
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.entries.get(&(row, col)).copied().unwrap_or(0.0)
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// One-shot copy-on-write upgrade to a dense representation.
    pub fn to_dense(&self) -> DenseMatrix {
        let mut dense = DenseMatrix::zeros(self.rows, self.cols);
        for (&(row, col), &value) in &self.entries {
            dense.set(row, col, value);
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_upgrades_to_dense_preserving_values() {
        let mut sparse = SparseMatrix::zeros(2, 2);
        sparse.set(0, 0, 1.0);
        sparse.set(1, 1, -2.0);
        let dense = sparse.to_dense();
        assert_eq!(dense.get(0, 0), 1.0);
        assert_eq!(dense.get(0, 1), 0.0);
        assert_eq!(dense.get(1, 1), -2.0);
    }

    #[test]
    fn dense_mul_vec_matches_manual_sum() {
        let m = DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(m.mul_vec(&[1.0, 1.0]), vec![3.0, 7.0]);
    }

    #[test]
    fn push_rows_widens_without_disturbing_existing_values() {
        let mut m = DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let first_new = m.push_rows(2);
        assert_eq!(first_new, 2);
        assert_eq!(m.rows(), 4);
        assert_eq!(m.cols(), 2);
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(1, 1), 4.0);
        assert_eq!(m.get(2, 0), 0.0);
        assert_eq!(m.get(3, 1), 0.0);
    }

    #[test]
    fn sparse_add_cancels_back_to_zero_entry() {
        let mut sparse = SparseMatrix::zeros(1, 1);
        sparse.add(0, 0, 5.0);
        sparse.add(0, 0, -5.0);
        assert_eq!(sparse.nnz(), 0);
    }
}
