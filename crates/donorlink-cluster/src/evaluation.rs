use crate::kmeans::{kmeans, KMeansConfig};
use crate::matrix::{euclidean, FeatureMatrix};
use chrono::{DateTime, Utc};
use donorlink_core::error::{DonorlinkError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Validation scores for one cluster count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRow {
    pub k: usize,
    pub inertia: f64,
    /// `None` when fewer than 2 or more than n - 1 clusters are populated
    pub silhouette: Option<f64>,
    /// `None` when fewer than 2 clusters are populated
    pub davies_bouldin: Option<f64>,
}

/// Cluster-quality diagnostics over a range of cluster counts, in increasing k
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    /// Feature columns the scores were computed on
    pub columns: Vec<String>,
    pub rows: Vec<EvaluationRow>,
    pub generated_at: DateTime<Utc>,
}

impl EvaluationReport {
    pub fn row(&self, k: usize) -> Option<&EvaluationRow> {
        self.rows.iter().find(|r| r.k == k)
    }
}

/// Run K-means for every k in `range` and score each partition.
///
/// Every run uses `base` with its `k` replaced. The report is meant for
/// charting; it does not pick a k.
pub fn evaluate(
    matrix: &FeatureMatrix,
    range: RangeInclusive<usize>,
    base: &KMeansConfig,
) -> Result<EvaluationReport> {
    let (min_k, max_k) = (*range.start(), *range.end());
    if min_k == 0 || min_k > max_k {
        return Err(DonorlinkError::InvalidClusterCount { k: min_k, donors: matrix.n_rows() });
    }
    if max_k > matrix.n_rows() {
        return Err(DonorlinkError::InvalidClusterCount { k: max_k, donors: matrix.n_rows() });
    }

    let mut rows = Vec::with_capacity(max_k - min_k + 1);
    for k in range {
        let assignment = kmeans(matrix, &base.clone().with_k(k))?;
        let row = EvaluationRow {
            k,
            inertia: assignment.inertia(),
            silhouette: silhouette_score(matrix, assignment.labels()),
            davies_bouldin: davies_bouldin_index(matrix, assignment.labels()),
        };
        tracing::debug!(
            k,
            inertia = row.inertia,
            silhouette = ?row.silhouette,
            davies_bouldin = ?row.davies_bouldin,
            "evaluated cluster count"
        );
        rows.push(row);
    }

    Ok(EvaluationReport { columns: matrix.columns().to_vec(), rows, generated_at: Utc::now() })
}

/// Group row indices by label, ordered by label
fn groups(labels: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(i);
    }
    groups
}

/// Mean silhouette coefficient over all points.
///
/// For point i, a is the mean distance to the other members of its cluster
/// and b the smallest mean distance to the members of another cluster; the
/// coefficient is (b - a) / max(a, b). Points alone in their cluster score 0.
/// Returns `None` unless between 2 and n - 1 clusters are populated.
pub fn silhouette_score(matrix: &FeatureMatrix, labels: &[usize]) -> Option<f64> {
    let n = matrix.n_rows();
    if labels.len() != n {
        return None;
    }
    let groups = groups(labels);
    if groups.len() < 2 || groups.len() >= n {
        return None;
    }

    let mut total = 0.0;
    for i in 0..n {
        let own = labels[i];
        let row = matrix.row(i);

        let mut a = 0.0;
        let mut b = f64::INFINITY;
        let mut own_size = 0;
        for (&label, members) in &groups {
            let sum: f64 = members.iter().filter(|&&j| j != i).map(|&j| euclidean(row, matrix.row(j))).sum();
            if label == own {
                own_size = members.len();
                if own_size > 1 {
                    a = sum / (own_size - 1) as f64;
                }
            } else {
                b = b.min(sum / members.len() as f64);
            }
        }

        if own_size > 1 {
            let denom = a.max(b);
            if denom > 0.0 {
                total += (b - a) / denom;
            }
        }
    }

    Some(total / n as f64)
}

/// Davies–Bouldin index: the mean, over clusters, of the worst ratio
/// (s_i + s_j) / d(c_i, c_j), where s is the mean distance of a cluster's
/// members to its centroid. Pairs with coincident centroids contribute 0.
/// Returns `None` unless at least 2 clusters are populated.
pub fn davies_bouldin_index(matrix: &FeatureMatrix, labels: &[usize]) -> Option<f64> {
    if labels.len() != matrix.n_rows() {
        return None;
    }
    let groups = groups(labels);
    if groups.len() < 2 {
        return None;
    }

    let dims = matrix.n_cols();
    let mut centroids = Vec::with_capacity(groups.len());
    let mut scatter = Vec::with_capacity(groups.len());
    for members in groups.values() {
        let mut centroid = vec![0.0; dims];
        for &i in members {
            for (c, v) in centroid.iter_mut().zip(matrix.row(i)) {
                *c += v;
            }
        }
        for c in centroid.iter_mut() {
            *c /= members.len() as f64;
        }
        let s = members.iter().map(|&i| euclidean(matrix.row(i), &centroid)).sum::<f64>()
            / members.len() as f64;
        centroids.push(centroid);
        scatter.push(s);
    }

    let m = centroids.len();
    let mut total = 0.0;
    for i in 0..m {
        let mut worst: f64 = 0.0;
        for j in 0..m {
            if i == j {
                continue;
            }
            let separation = euclidean(&centroids[i], &centroids[j]);
            if separation > 0.0 {
                worst = worst.max((scatter[i] + scatter[j]) / separation);
            }
        }
        total += worst;
    }

    Some(total / m as f64)
}
