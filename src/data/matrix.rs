//! Dense labelled matrix for heatmap-style outputs.

use crate::error::{EnrichError, Result};
use nalgebra::DMatrix;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A dense entity × category grid.
///
/// Every (row, column) cell is defined; combinations absent from the input
/// are 0. Row labels are unique, and so are column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    values: DMatrix<f64>,
}

impl Matrix {
    /// Build a dense matrix from sparse cells.
    ///
    /// Cells whose labels are not among `row_labels` / `col_labels` are
    /// ignored. A cell given twice keeps the last value.
    pub fn build<'a, I>(row_labels: Vec<String>, col_labels: Vec<String>, cells: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str, f64)>,
    {
        let row_index = unique_index(&row_labels, "row")?;
        let col_index = unique_index(&col_labels, "column")?;

        let mut values = DMatrix::zeros(row_labels.len(), col_labels.len());
        for (row, col, value) in cells {
            if let (Some(&r), Some(&c)) = (row_index.get(row), col_index.get(col)) {
                values[(r, c)] = value;
            }
        }

        Ok(Self {
            row_labels,
            col_labels,
            values,
        })
    }

    /// Wrap an existing dense matrix.
    pub fn from_dense(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        values: DMatrix<f64>,
    ) -> Result<Self> {
        if values.nrows() != row_labels.len() {
            return Err(EnrichError::DimensionMismatch {
                expected: values.nrows(),
                actual: row_labels.len(),
            });
        }
        if values.ncols() != col_labels.len() {
            return Err(EnrichError::DimensionMismatch {
                expected: values.ncols(),
                actual: col_labels.len(),
            });
        }
        unique_index(&row_labels, "row")?;
        unique_index(&col_labels, "column")?;
        Ok(Self {
            row_labels,
            col_labels,
            values,
        })
    }

    /// (rows, columns).
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    #[inline]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    #[inline]
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    /// Underlying dense values.
    #[inline]
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Value at (row label, column label).
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.col_labels.iter().position(|l| l == col)?;
        Some(self.values[(r, c)])
    }

    /// Values as a vector of rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.values.nrows())
            .map(|r| self.values.row(r).iter().copied().collect())
            .collect()
    }

    /// Sum of each column.
    pub fn col_sums(&self) -> Vec<f64> {
        self.values.column_iter().map(|c| c.sum()).collect()
    }

    /// Write the matrix to a TSV file with a `row_label` corner header.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "row_label")?;
        for col in &self.col_labels {
            write!(writer, "\t{}", col)?;
        }
        writeln!(writer)?;

        for (r, label) in self.row_labels.iter().enumerate() {
            write!(writer, "{}", label)?;
            for c in 0..self.values.ncols() {
                write!(writer, "\t{:.6}", self.values[(r, c)])?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Serialize for Matrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Matrix", 3)?;
        state.serialize_field("row_labels", &self.row_labels)?;
        state.serialize_field("col_labels", &self.col_labels)?;
        state.serialize_field("values", &self.to_rows())?;
        state.end()
    }
}

fn unique_index<'a>(labels: &'a [String], axis: &str) -> Result<HashMap<&'a str, usize>> {
    let mut index = HashMap::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        if index.insert(label.as_str(), i).is_some() {
            return Err(EnrichError::InvalidParameter(format!(
                "Duplicate {} label '{}'",
                axis, label
            )));
        }
    }
    Ok(index)
}
