//! Donorlink Cluster - Donor feature normalization, K-means, and cluster quality
//!
//! Donors are turned into a numeric [`FeatureMatrix`], standardized column by
//! column, partitioned with seeded K-means, and the partitions can be scored
//! with inertia, silhouette, and Davies–Bouldin over a range of cluster counts.

pub mod evaluation;
pub mod kmeans;
pub mod matrix;
pub mod normalize;

pub use evaluation::{davies_bouldin_index, evaluate, silhouette_score, EvaluationReport, EvaluationRow};
pub use kmeans::{kmeans, ClusterAssignment, KMeansConfig};
pub use matrix::FeatureMatrix;
pub use normalize::{normalize, ColumnStats, NormalizedFeatures};
