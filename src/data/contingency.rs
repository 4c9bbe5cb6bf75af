//! Labelled sparse contingency table of counts.

use crate::error::{EnrichError, Result};
use rayon::prelude::*;
use sprs::{CsMat, TriMat};
use std::collections::{BTreeSet, HashMap};

/// A sparse count table indexed by row and column labels.
///
/// Rows and columns are identified by unique string labels (categories,
/// classes or entities). Absent combinations read as zero. Uses CSR storage,
/// which keeps per-row operations cheap and sums duplicate observations on
/// construction.
#[derive(Debug, Clone)]
pub struct Contingency {
    /// Sparse counts in CSR format (rows × cols)
    data: CsMat<u64>,
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    row_index: HashMap<String, usize>,
    col_index: HashMap<String, usize>,
}

impl Contingency {
    /// Create a contingency table from a sparse matrix and labels.
    pub fn new(data: CsMat<u64>, row_labels: Vec<String>, col_labels: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != row_labels.len() {
            return Err(EnrichError::DimensionMismatch {
                expected: nrows,
                actual: row_labels.len(),
            });
        }
        if ncols != col_labels.len() {
            return Err(EnrichError::DimensionMismatch {
                expected: ncols,
                actual: col_labels.len(),
            });
        }
        let row_index = index_labels(&row_labels)?;
        let col_index = index_labels(&col_labels)?;
        Ok(Self {
            data,
            row_labels,
            col_labels,
            row_index,
            col_index,
        })
    }

    /// Count observed (row, col) label pairs.
    ///
    /// Each pair adds one. Pairs whose labels are not in `row_labels` /
    /// `col_labels` are ignored.
    pub fn from_pairs<'a, I>(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        pairs: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let row_index = index_labels(&row_labels)?;
        let col_index = index_labels(&col_labels)?;

        let mut tri_mat = TriMat::new((row_labels.len(), col_labels.len()));
        for (row, col) in pairs {
            if let (Some(&r), Some(&c)) = (row_index.get(row), col_index.get(col)) {
                tri_mat.add_triplet(r, c, 1u64);
            }
        }

        Ok(Self {
            data: tri_mat.to_csr(),
            row_labels,
            col_labels,
            row_index,
            col_index,
        })
    }

    /// Count observed pairs, taking the label sets from the data in name order.
    pub fn from_observed<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let pairs: Vec<(&str, &str)> = pairs.into_iter().collect();
        let rows: BTreeSet<&str> = pairs.iter().map(|(r, _)| *r).collect();
        let cols: BTreeSet<&str> = pairs.iter().map(|(_, c)| *c).collect();
        Self::from_pairs(
            rows.into_iter().map(String::from).collect(),
            cols.into_iter().map(String::from).collect(),
            pairs,
        )
    }

    /// Count at (row, col) by position, 0 for absent entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.data.get(row, col).copied().unwrap_or(0)
    }

    /// Count at (row label, col label), 0 if either label is unknown.
    pub fn count(&self, row: &str, col: &str) -> u64 {
        match (self.row_index.get(row), self.col_index.get(col)) {
            (Some(&r), Some(&c)) => self.get(r, c),
            _ => 0,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.data.rows()
    }

    /// Number of columns.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.data.cols()
    }

    /// Number of non-zero cells.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.data.nnz()
    }

    #[inline]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    #[inline]
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    /// Position of a row label.
    pub fn row_position(&self, label: &str) -> Option<usize> {
        self.row_index.get(label).copied()
    }

    /// Position of a column label.
    pub fn col_position(&self, label: &str) -> Option<usize> {
        self.col_index.get(label).copied()
    }

    /// Iterate over non-zero cells as (row, col, count).
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (usize, usize, u64)> + '_ {
        self.data
            .outer_iterator()
            .enumerate()
            .flat_map(|(row, row_vec)| {
                row_vec
                    .iter()
                    .map(move |(col, &val)| (row, col, val))
                    .collect::<Vec<_>>()
            })
    }

    /// Dense counts for one row.
    pub fn row_dense(&self, row: usize) -> Vec<u64> {
        let mut dense = vec![0u64; self.n_cols()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Total count per row.
    pub fn row_sums(&self) -> Vec<u64> {
        (0..self.n_rows())
            .into_par_iter()
            .map(|row| {
                self.data
                    .outer_view(row)
                    .map(|v| v.iter().map(|(_, &val)| val).sum())
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Total count per column.
    pub fn col_sums(&self) -> Vec<u64> {
        let mut sums = vec![0u64; self.n_cols()];
        for row_vec in self.data.outer_iterator() {
            for (col, &val) in row_vec.iter() {
                sums[col] += val;
            }
        }
        sums
    }

    /// Total count per row, restricted to the given column positions.
    pub fn row_sums_over(&self, cols: &[usize]) -> Vec<u64> {
        let mut keep = vec![false; self.n_cols()];
        for &c in cols {
            if c < keep.len() {
                keep[c] = true;
            }
        }
        (0..self.n_rows())
            .into_par_iter()
            .map(|row| {
                self.data
                    .outer_view(row)
                    .map(|v| v.iter().filter(|(c, _)| keep[*c]).map(|(_, &val)| val).sum())
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Grand total of all counts.
    pub fn total(&self) -> u64 {
        self.data.data().iter().sum()
    }

    /// Cell-wise sum of tables that share the same labels.
    pub fn sum<'a, I>(tables: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Contingency>,
    {
        let mut iter = tables.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| EnrichError::EmptyData("No tables to sum".to_string()))?;

        let mut tri_mat = TriMat::new((first.n_rows(), first.n_cols()));
        for (row, col, val) in first.iter_nonzero() {
            tri_mat.add_triplet(row, col, val);
        }
        for table in iter {
            if table.row_labels != first.row_labels || table.col_labels != first.col_labels {
                return Err(EnrichError::InvalidParameter(
                    "Cannot sum contingency tables with different labels".to_string(),
                ));
            }
            for (row, col, val) in table.iter_nonzero() {
                tri_mat.add_triplet(row, col, val);
            }
        }

        Self::new(
            tri_mat.to_csr(),
            first.row_labels.clone(),
            first.col_labels.clone(),
        )
    }

    /// Keep only the given column positions, in the given order.
    pub fn subset_cols(&self, indices: &[usize]) -> Result<Self> {
        let col_map: HashMap<usize, usize> = indices
            .iter()
            .enumerate()
            .map(|(new_idx, &old_idx)| (old_idx, new_idx))
            .collect();

        let mut new_col_labels = Vec::with_capacity(indices.len());
        for &old_col in indices {
            if old_col >= self.n_cols() {
                return Err(EnrichError::InvalidParameter(format!(
                    "Column index {} out of bounds",
                    old_col
                )));
            }
            new_col_labels.push(self.col_labels[old_col].clone());
        }

        let mut tri_mat = TriMat::new((self.n_rows(), indices.len()));
        for (row, old_col, val) in self.iter_nonzero() {
            if let Some(&new_col) = col_map.get(&old_col) {
                tri_mat.add_triplet(row, new_col, val);
            }
        }

        Self::new(tri_mat.to_csr(), self.row_labels.clone(), new_col_labels)
    }

    /// Dense copy as f64 (rows × cols).
    pub fn to_dense(&self) -> nalgebra::DMatrix<f64> {
        let mut dense = nalgebra::DMatrix::zeros(self.n_rows(), self.n_cols());
        for (row, col, val) in self.iter_nonzero() {
            dense[(row, col)] = val as f64;
        }
        dense
    }
}

fn index_labels(labels: &[String]) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        if index.insert(label.clone(), i).is_some() {
            return Err(EnrichError::InvalidParameter(format!(
                "Duplicate label '{}'",
                label
            )));
        }
    }
    Ok(index)
}
