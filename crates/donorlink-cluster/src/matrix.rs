use donorlink_core::error::{DonorlinkError, Result};
use donorlink_core::models::{DonorRecord, FeatureSet};
use serde::Serialize;

/// Dense row-major matrix of numeric features, one row per donor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    data: Vec<f64>,
    n_rows: usize,
}

impl FeatureMatrix {
    /// Build a matrix from named columns and rows of equal width
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(DonorlinkError::InsufficientData {
                reason: "a feature matrix needs at least one column".to_string(),
            });
        }

        let width = columns.len();
        let mut data = Vec::with_capacity(rows.len() * width);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(DonorlinkError::InsufficientData {
                    reason: format!("row {} has {} values, expected {}", i, row.len(), width),
                });
            }
            data.extend_from_slice(row);
        }

        Ok(Self { columns, data, n_rows: rows.len() })
    }

    /// Extract the given feature set from every donor, in collection order
    pub fn from_donors(donors: &[DonorRecord], set: FeatureSet) -> Self {
        let columns: Vec<String> = set.columns().iter().map(|c| c.to_string()).collect();
        let mut data = Vec::with_capacity(donors.len() * columns.len());
        for donor in donors {
            data.extend(donor.features(set));
        }
        Self { columns, data, n_rows: donors.len() }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row `i` as a slice
    ///
    /// # Panics
    /// Panics if `i >= n_rows()`.
    pub fn row(&self, i: usize) -> &[f64] {
        let width = self.n_cols();
        &self.data[i * width..(i + 1) * width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.n_cols())
    }

    /// Copy of column `j`
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows().map(|row| row[j]).collect()
    }

    pub(crate) fn column_mut(&mut self, j: usize) -> impl Iterator<Item = &mut f64> + '_ {
        let width = self.n_cols();
        self.data.iter_mut().skip(j).step_by(width)
    }
}

/// Squared Euclidean distance between two equal-length vectors
pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

pub(crate) fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    squared_distance(a, b).sqrt()
}
