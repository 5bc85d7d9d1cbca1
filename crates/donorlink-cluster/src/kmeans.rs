use crate::matrix::{squared_distance, FeatureMatrix};
use donorlink_core::error::{DonorlinkError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for K-means clustering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,
    /// Maximum assignment/update rounds per run
    pub max_iterations: usize,
    /// Number of seeded restarts (lowest inertia kept)
    pub n_init: usize,
    /// Seed for k-means++ initialization
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self { k: 3, max_iterations: 300, n_init: 10, seed: 42 }
    }
}

impl KMeansConfig {
    /// Set the number of clusters
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set max iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the number of restarts
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }
}

/// Cluster label for every donor, plus the centroids that produced them.
///
/// Labels are arbitrary ids in `[0, k)`; they carry no ordering or meaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    labels: Vec<usize>,
    centroids: Vec<Vec<f64>>,
    inertia: f64,
    iterations: usize,
}

impl ClusterAssignment {
    /// Cluster id per donor, by collection position
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> Option<usize> {
        self.labels.get(index).copied()
    }

    /// Number of clusters requested
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Centroids, in the feature space the clustering ran in
    pub fn centroids(&self) -> &[Vec<f64>] {
        &self.centroids
    }

    /// Sum of squared distances from each point to its centroid
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Rounds the winning run needed to converge (or the iteration cap)
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of donors per cluster id; empty clusters count 0
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Positions of the donors assigned to `cluster`
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == cluster)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Partition the rows of `matrix` into `config.k` clusters.
///
/// Runs `config.n_init` seeded k-means++/Lloyd runs (seeds `seed`,
/// `seed + 1`, ...) and keeps the one with the lowest inertia, so identical
/// input and configuration always give identical labels.
pub fn kmeans(matrix: &FeatureMatrix, config: &KMeansConfig) -> Result<ClusterAssignment> {
    let n = matrix.n_rows();
    if config.k == 0 || config.k > n {
        return Err(DonorlinkError::InvalidClusterCount { k: config.k, donors: n });
    }

    let mut best: Option<ClusterAssignment> = None;
    for restart in 0..config.n_init.max(1) {
        let seed = config.seed.wrapping_add(restart as u64);
        let run = fit_single(matrix, config.k, config.max_iterations.max(1), seed);
        tracing::debug!(
            k = config.k,
            seed,
            iterations = run.iterations,
            inertia = run.inertia,
            "k-means run finished"
        );
        let improves = best.as_ref().map_or(true, |current| run.inertia < current.inertia);
        if improves {
            best = Some(run);
        }
    }

    // n_init.max(1) guarantees at least one run
    best.ok_or(DonorlinkError::InsufficientData { reason: "no k-means run completed".to_string() })
}

/// Single seeded k-means run
fn fit_single(matrix: &FeatureMatrix, k: usize, max_iterations: usize, seed: u64) -> ClusterAssignment {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = kmeans_plus_plus_init(matrix, k, &mut rng);
    let mut labels: Vec<usize> = Vec::new();
    let mut iterations = 0;

    for iter in 0..max_iterations {
        iterations = iter + 1;

        let new_labels: Vec<usize> = matrix.rows().map(|row| nearest_centroid(row, &centroids)).collect();
        if new_labels == labels {
            break;
        }
        labels = new_labels;
        update_centroids(matrix, &labels, &mut centroids);
    }

    let inertia = matrix
        .rows()
        .zip(&labels)
        .map(|(row, &label)| squared_distance(row, &centroids[label]))
        .sum();

    ClusterAssignment { labels, centroids, inertia, iterations }
}

/// Recompute each centroid as the mean of its members.
///
/// A centroid with no members keeps its previous position.
fn update_centroids(matrix: &FeatureMatrix, labels: &[usize], centroids: &mut [Vec<f64>]) {
    let dims = matrix.n_cols();
    let mut sums = vec![vec![0.0; dims]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for (row, &label) in matrix.rows().zip(labels) {
        counts[label] += 1;
        for (acc, &v) in sums[label].iter_mut().zip(row) {
            *acc += v;
        }
    }

    for ((centroid, sum), &count) in centroids.iter_mut().zip(sums).zip(&counts) {
        if count > 0 {
            *centroid = sum.into_iter().map(|s| s / count as f64).collect();
        }
    }
}

/// K-means++ initialization
fn kmeans_plus_plus_init(matrix: &FeatureMatrix, k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = matrix.n_rows();
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);

    // First centroid: uniform
    centroids.push(matrix.row(rng.random_range(0..n)).to_vec());

    // Remaining centroids: weighted by squared distance to the closest chosen centroid
    let mut closest: Vec<f64> = matrix.rows().map(|row| squared_distance(row, &centroids[0])).collect();
    while centroids.len() < k {
        let total: f64 = closest.iter().sum();
        let selected = if total <= 0.0 {
            // Every point coincides with a centroid already
            rng.random_range(0..n)
        } else {
            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = n - 1;
            for (i, &d) in closest.iter().enumerate() {
                cumsum += d;
                if d > 0.0 && cumsum >= threshold {
                    selected = i;
                    break;
                }
            }
            selected
        };

        let centroid = matrix.row(selected).to_vec();
        for (d, row) in closest.iter_mut().zip(matrix.rows()) {
            *d = d.min(squared_distance(row, &centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

/// Index of the nearest centroid; ties go to the lowest id
fn nearest_centroid(row: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(row, centroid);
        if d < best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}
