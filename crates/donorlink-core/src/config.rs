use crate::error::{DonorlinkError, Result};
use crate::models::{DegeneratePolicy, DistanceMethod, FeatureSet, RowPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default dataset file, relative to the working directory
pub const DEFAULT_DATASET: &str = "donor_dataset.csv";

/// Default Nominatim endpoint
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }

    fn update_opt(&mut self, value: Option<T>, source: ConfigSource) {
        if let Some(value) = value {
            self.update(value, source);
        }
    }
}

/// Layered configuration for donorlink
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub dataset: ConfigValue<PathBuf>,
    pub row_policy: ConfigValue<RowPolicy>,
    pub cluster_count: ConfigValue<usize>,
    pub seed: ConfigValue<u64>,
    pub max_iterations: ConfigValue<usize>,
    pub n_init: ConfigValue<usize>,
    pub degenerate_features: ConfigValue<DegeneratePolicy>,
    pub threshold_km: ConfigValue<f64>,
    pub distance_method: ConfigValue<DistanceMethod>,
    pub evaluation_min_k: ConfigValue<usize>,
    pub evaluation_max_k: ConfigValue<usize>,
    pub evaluation_features: ConfigValue<FeatureSet>,
    pub geocoder_url: ConfigValue<String>,
    pub geocoder_timeout_secs: ConfigValue<u64>,
    pub user_agent: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let d = ConfigSource::Default;
        Self {
            dataset: ConfigValue::new(PathBuf::from(DEFAULT_DATASET), d),
            row_policy: ConfigValue::new(RowPolicy::Reject, d),
            cluster_count: ConfigValue::new(3, d),
            seed: ConfigValue::new(42, d),
            max_iterations: ConfigValue::new(300, d),
            n_init: ConfigValue::new(10, d),
            degenerate_features: ConfigValue::new(DegeneratePolicy::LeaveUnscaled, d),
            threshold_km: ConfigValue::new(20.0, d),
            distance_method: ConfigValue::new(DistanceMethod::Geodesic, d),
            evaluation_min_k: ConfigValue::new(2, d),
            evaluation_max_k: ConfigValue::new(9, d),
            evaluation_features: ConfigValue::new(FeatureSet::Spatial, d),
            geocoder_url: ConfigValue::new(DEFAULT_GEOCODER_URL.to_string(), d),
            geocoder_timeout_secs: ConfigValue::new(10, d),
            user_agent: ConfigValue::new(format!("donorlink/{}", env!("CARGO_PKG_VERSION")), d),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| DonorlinkError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| DonorlinkError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        let src = ConfigSource::File;
        self.dataset.update_opt(file_config.dataset, src);
        self.row_policy.update_opt(file_config.row_policy, src);
        self.cluster_count.update_opt(file_config.cluster_count, src);
        self.seed.update_opt(file_config.seed, src);
        self.max_iterations.update_opt(file_config.max_iterations, src);
        self.n_init.update_opt(file_config.n_init, src);
        self.degenerate_features.update_opt(file_config.degenerate_features, src);
        self.threshold_km.update_opt(file_config.threshold_km, src);
        self.distance_method.update_opt(file_config.distance_method, src);
        self.evaluation_min_k.update_opt(file_config.evaluation_min_k, src);
        self.evaluation_max_k.update_opt(file_config.evaluation_max_k, src);
        self.evaluation_features.update_opt(file_config.evaluation_features, src);
        self.geocoder_url.update_opt(file_config.geocoder_url, src);
        self.geocoder_timeout_secs.update_opt(file_config.geocoder_timeout_secs, src);
        self.user_agent.update_opt(file_config.user_agent, src);

        Ok(self)
    }

    /// Load configuration from `DONORLINK_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn load_from_env(mut self) -> Self {
        let src = ConfigSource::Environment;

        if let Ok(dataset) = env::var("DONORLINK_DATASET") {
            self.dataset.update(PathBuf::from(dataset), src);
        }
        self.row_policy.update_opt(env_parsed("DONORLINK_ROW_POLICY", parse_row_policy), src);
        self.cluster_count.update_opt(env_parsed("DONORLINK_CLUSTER_COUNT", parse_number), src);
        self.seed.update_opt(env_parsed("DONORLINK_SEED", parse_number), src);
        self.max_iterations.update_opt(env_parsed("DONORLINK_MAX_ITERATIONS", parse_number), src);
        self.n_init.update_opt(env_parsed("DONORLINK_N_INIT", parse_number), src);
        self.degenerate_features.update_opt(
            env_parsed("DONORLINK_DEGENERATE_FEATURES", parse_degenerate_policy),
            src,
        );
        self.threshold_km.update_opt(env_parsed("DONORLINK_THRESHOLD_KM", parse_number), src);
        self.distance_method
            .update_opt(env_parsed("DONORLINK_DISTANCE_METHOD", parse_distance_method), src);
        self.evaluation_min_k
            .update_opt(env_parsed("DONORLINK_EVALUATION_MIN_K", parse_number), src);
        self.evaluation_max_k
            .update_opt(env_parsed("DONORLINK_EVALUATION_MAX_K", parse_number), src);
        self.evaluation_features
            .update_opt(env_parsed("DONORLINK_EVALUATION_FEATURES", parse_feature_set), src);
        if let Ok(url) = env::var("DONORLINK_GEOCODER_URL") {
            self.geocoder_url.update(url, src);
        }
        self.geocoder_timeout_secs
            .update_opt(env_parsed("DONORLINK_GEOCODER_TIMEOUT_SECS", parse_number), src);
        if let Ok(user_agent) = env::var("DONORLINK_USER_AGENT") {
            self.user_agent.update(user_agent, src);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        let src = ConfigSource::Cli;
        self.dataset.update_opt(overrides.dataset, src);
        self.row_policy.update_opt(overrides.row_policy, src);
        self.cluster_count.update_opt(overrides.cluster_count, src);
        self.seed.update_opt(overrides.seed, src);
        self.threshold_km.update_opt(overrides.threshold_km, src);
        self.distance_method.update_opt(overrides.distance_method, src);
        self.evaluation_min_k.update_opt(overrides.evaluation_min_k, src);
        self.evaluation_max_k.update_opt(overrides.evaluation_max_k, src);
        self.evaluation_features.update_opt(overrides.evaluation_features, src);
        self.geocoder_timeout_secs.update_opt(overrides.geocoder_timeout_secs, src);
    }

    /// Check cross-field and range constraints
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, reason: String| DonorlinkError::ConfigInvalid {
            key: key.to_string(),
            reason,
        };

        if self.cluster_count.value == 0 {
            return Err(invalid("cluster_count", "must be at least 1".to_string()));
        }
        if self.max_iterations.value == 0 {
            return Err(invalid("max_iterations", "must be at least 1".to_string()));
        }
        if self.n_init.value == 0 {
            return Err(invalid("n_init", "must be at least 1".to_string()));
        }
        let threshold = self.threshold_km.value;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(invalid("threshold_km", format!("{} is not a non-negative distance", threshold)));
        }
        if self.evaluation_min_k.value == 0 || self.evaluation_min_k.value > self.evaluation_max_k.value {
            return Err(invalid(
                "evaluation_min_k",
                format!(
                    "range {}..={} is empty or starts below 1",
                    self.evaluation_min_k.value, self.evaluation_max_k.value
                ),
            ));
        }
        if self.geocoder_timeout_secs.value == 0 {
            return Err(invalid("geocoder_timeout_secs", "must be at least 1".to_string()));
        }
        for (key, value) in [("geocoder_url", &self.geocoder_url), ("user_agent", &self.user_agent)] {
            if value.value.trim().is_empty() {
                return Err(DonorlinkError::ConfigMissing { key: key.to_string() });
            }
        }
        Ok(())
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        fn entry<T: Display>(v: &ConfigValue<T>) -> (String, ConfigSource) {
            (v.value.to_string(), v.source)
        }
        fn entry_debug<T: std::fmt::Debug>(v: &ConfigValue<T>) -> (String, ConfigSource) {
            (format!("{:?}", v.value), v.source)
        }

        let mut map = BTreeMap::new();
        map.insert(
            "dataset".to_string(),
            (self.dataset.value.display().to_string(), self.dataset.source),
        );
        map.insert("row_policy".to_string(), entry_debug(&self.row_policy));
        map.insert("cluster_count".to_string(), entry(&self.cluster_count));
        map.insert("seed".to_string(), entry(&self.seed));
        map.insert("max_iterations".to_string(), entry(&self.max_iterations));
        map.insert("n_init".to_string(), entry(&self.n_init));
        map.insert("degenerate_features".to_string(), entry_debug(&self.degenerate_features));
        map.insert("threshold_km".to_string(), entry(&self.threshold_km));
        map.insert("distance_method".to_string(), entry_debug(&self.distance_method));
        map.insert("evaluation_min_k".to_string(), entry(&self.evaluation_min_k));
        map.insert("evaluation_max_k".to_string(), entry(&self.evaluation_max_k));
        map.insert("evaluation_features".to_string(), entry_debug(&self.evaluation_features));
        map.insert("geocoder_url".to_string(), entry(&self.geocoder_url));
        map.insert("geocoder_timeout_secs".to_string(), entry(&self.geocoder_timeout_secs));
        map.insert("user_agent".to_string(), entry(&self.user_agent));
        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    dataset: Option<PathBuf>,
    row_policy: Option<RowPolicy>,
    cluster_count: Option<usize>,
    seed: Option<u64>,
    max_iterations: Option<usize>,
    n_init: Option<usize>,
    degenerate_features: Option<DegeneratePolicy>,
    threshold_km: Option<f64>,
    distance_method: Option<DistanceMethod>,
    evaluation_min_k: Option<usize>,
    evaluation_max_k: Option<usize>,
    evaluation_features: Option<FeatureSet>,
    geocoder_url: Option<String>,
    geocoder_timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub dataset: Option<PathBuf>,
    pub row_policy: Option<RowPolicy>,
    pub cluster_count: Option<usize>,
    pub seed: Option<u64>,
    pub threshold_km: Option<f64>,
    pub distance_method: Option<DistanceMethod>,
    pub evaluation_min_k: Option<usize>,
    pub evaluation_max_k: Option<usize>,
    pub evaluation_features: Option<FeatureSet>,
    pub geocoder_timeout_secs: Option<u64>,
}

fn env_parsed<T>(key: &str, parse: fn(&str) -> Result<T>) -> Option<T> {
    let raw = env::var(key).ok()?;
    match parse(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring invalid {} value '{}': {}", key, raw, e);
            None
        }
    }
}

fn parse_number<T: FromStr>(s: &str) -> Result<T> {
    s.trim().parse::<T>().map_err(|_| DonorlinkError::ConfigInvalid {
        key: "number".to_string(),
        reason: format!("'{}' is not a valid number", s),
    })
}

/// Parse distance method from string
pub fn parse_distance_method(s: &str) -> Result<DistanceMethod> {
    match s.to_lowercase().as_str() {
        "geodesic" | "ellipsoid" => Ok(DistanceMethod::Geodesic),
        "haversine" | "great-circle" => Ok(DistanceMethod::Haversine),
        _ => Err(DonorlinkError::ConfigInvalid {
            key: "distance_method".to_string(),
            reason: format!("Invalid distance method: {}. Use geodesic or haversine", s),
        }),
    }
}

/// Parse degenerate-feature policy from string
pub fn parse_degenerate_policy(s: &str) -> Result<DegeneratePolicy> {
    match s.to_lowercase().as_str() {
        "reject" | "fail" => Ok(DegeneratePolicy::Reject),
        "leave-unscaled" | "leave_unscaled" | "unscaled" => Ok(DegeneratePolicy::LeaveUnscaled),
        _ => Err(DonorlinkError::ConfigInvalid {
            key: "degenerate_features".to_string(),
            reason: format!("Invalid degenerate feature policy: {}. Use reject or leave-unscaled", s),
        }),
    }
}

/// Parse malformed-row policy from string
pub fn parse_row_policy(s: &str) -> Result<RowPolicy> {
    match s.to_lowercase().as_str() {
        "reject" | "strict" => Ok(RowPolicy::Reject),
        "quarantine" => Ok(RowPolicy::Quarantine),
        _ => Err(DonorlinkError::ConfigInvalid {
            key: "row_policy".to_string(),
            reason: format!("Invalid row policy: {}. Use reject or quarantine", s),
        }),
    }
}

/// Parse feature set from string
pub fn parse_feature_set(s: &str) -> Result<FeatureSet> {
    match s.to_lowercase().as_str() {
        "spatial" | "coordinates" => Ok(FeatureSet::Spatial),
        "full" | "all" => Ok(FeatureSet::Full),
        _ => Err(DonorlinkError::ConfigInvalid {
            key: "features".to_string(),
            reason: format!("Invalid feature set: {}. Use spatial or full", s),
        }),
    }
}
