use crate::matrix::FeatureMatrix;
use donorlink_core::error::{DonorlinkError, Result};
use donorlink_core::models::DegeneratePolicy;
use serde::Serialize;

/// Relative spread below which a column counts as constant
const DEGENERATE_TOLERANCE: f64 = 1e-12;

/// Statistics used to standardize one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub name: String,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// False when the column was degenerate and only mean-centred
    pub scaled: bool,
}

/// A standardized feature matrix and the statistics that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedFeatures {
    pub matrix: FeatureMatrix,
    pub stats: Vec<ColumnStats>,
}

impl NormalizedFeatures {
    /// Names of the columns that were left unscaled
    pub fn unscaled_columns(&self) -> Vec<&str> {
        self.stats.iter().filter(|s| !s.scaled).map(|s| s.name.as_str()).collect()
    }
}

/// Rescale every column to zero mean and unit variance.
///
/// Means and (population) deviations come from `matrix` itself. A
/// zero-variance column fails with `DegenerateFeature` under
/// [`DegeneratePolicy::Reject`]; under [`DegeneratePolicy::LeaveUnscaled`] it is
/// only mean-centred, which leaves it constant at 0.
pub fn normalize(matrix: &FeatureMatrix, policy: DegeneratePolicy) -> Result<NormalizedFeatures> {
    if matrix.is_empty() {
        return Err(DonorlinkError::InsufficientData {
            reason: "cannot normalize features of an empty donor collection".to_string(),
        });
    }

    let n = matrix.n_rows() as f64;
    let mut output = matrix.clone();
    let mut stats = Vec::with_capacity(matrix.n_cols());

    for (j, name) in matrix.columns().iter().enumerate() {
        let column = matrix.column(j);
        let mean = column.iter().sum::<f64>() / n;
        let variance = column.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let degenerate = std_dev <= DEGENERATE_TOLERANCE * mean.abs().max(1.0);
        if degenerate {
            match policy {
                DegeneratePolicy::Reject => {
                    return Err(DonorlinkError::DegenerateFeature { column: name.clone() });
                }
                DegeneratePolicy::LeaveUnscaled => {
                    tracing::warn!("Feature column '{}' has zero variance; leaving it unscaled", name);
                }
            }
        }

        for v in output.column_mut(j) {
            *v -= mean;
            if !degenerate {
                *v /= std_dev;
            }
        }

        stats.push(ColumnStats { name: name.clone(), mean, std_dev, scaled: !degenerate });
    }

    Ok(NormalizedFeatures { matrix: output, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn matrix(rows: Vec<Vec<f64>>) -> FeatureMatrix {
        let width = rows.first().map(|r| r.len()).unwrap_or(2);
        let columns = (0..width).map(|j| format!("f{}", j)).collect();
        FeatureMatrix::new(columns, rows).unwrap()
    }

    fn mean_and_variance(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        (mean, var)
    }

    #[test]
    fn test_empty_matrix_is_insufficient_data() {
        let empty = matrix(vec![]);
        assert!(matches!(
            normalize(&empty, DegeneratePolicy::LeaveUnscaled),
            Err(DonorlinkError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_known_values() {
        let m = matrix(vec![vec![1.0, 100.0], vec![3.0, 300.0]]);
        let normalized = normalize(&m, DegeneratePolicy::Reject).unwrap();

        assert_eq!(normalized.matrix.row(0), &[-1.0, -1.0]);
        assert_eq!(normalized.matrix.row(1), &[1.0, 1.0]);
        assert_eq!(normalized.stats[0].mean, 2.0);
        assert_eq!(normalized.stats[1].std_dev, 100.0);
        assert!(normalized.unscaled_columns().is_empty());
    }

    #[test]
    fn test_degenerate_column_rejected() {
        let m = matrix(vec![vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0]]);
        match normalize(&m, DegeneratePolicy::Reject) {
            Err(DonorlinkError::DegenerateFeature { column }) => assert_eq!(column, "f1"),
            other => panic!("Expected DegenerateFeature, got {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_column_left_unscaled() {
        let m = matrix(vec![vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0]]);
        let normalized = normalize(&m, DegeneratePolicy::LeaveUnscaled).unwrap();

        assert_eq!(normalized.unscaled_columns(), vec!["f1"]);
        assert_eq!(normalized.matrix.column(1), vec![0.0, 0.0, 0.0]);
        let (mean, var) = mean_and_variance(&normalized.matrix.column(0));
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_row_is_degenerate_everywhere() {
        let m = matrix(vec![vec![12.97, 77.59]]);
        assert!(normalize(&m, DegeneratePolicy::Reject).is_err());
        let normalized = normalize(&m, DegeneratePolicy::LeaveUnscaled).unwrap();
        assert_eq!(normalized.matrix.row(0), &[0.0, 0.0]);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let m = matrix(vec![vec![1.0, 2.0], vec![3.0, 8.0]]);
        let before = m.clone();
        let _ = normalize(&m, DegeneratePolicy::Reject).unwrap();
        assert_eq!(m, before);
    }

    proptest! {
        #[test]
        fn prop_standardized_columns(
            rows in prop::collection::vec(
                prop::collection::vec(-1000.0f64..1000.0, 3),
                2..60,
            )
        ) {
            let m = matrix(rows);
            let normalized = normalize(&m, DegeneratePolicy::LeaveUnscaled).unwrap();

            for (j, stat) in normalized.stats.iter().enumerate() {
                let (mean, var) = mean_and_variance(&normalized.matrix.column(j));
                prop_assert!(mean.abs() < 1e-9);
                if stat.scaled {
                    prop_assert!((var - 1.0).abs() < 1e-9);
                } else {
                    prop_assert!(var.abs() < 1e-9);
                }
            }
        }
    }
}
