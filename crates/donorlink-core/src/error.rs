//! Error types for donorlink

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DonorlinkError {
    // Geocoding errors
    #[error("Location not found: '{location}'")]
    LocationNotFound { location: String },

    #[error("Geocoding timed out after {timeout_secs}s while resolving '{location}'")]
    GeocodingTimeout { location: String, timeout_secs: u64 },

    #[error("Geocoder unavailable: {reason}")]
    GeocoderUnavailable { reason: String },

    // Dataset precondition errors
    #[error("Insufficient data: {reason}")]
    InsufficientData { reason: String },

    #[error("Feature column '{column}' has zero variance and cannot be rescaled")]
    DegenerateFeature { column: String },

    #[error("Invalid cluster count {k}: must be between 1 and the number of donors ({donors})")]
    InvalidClusterCount { k: usize, donors: usize },

    // Record and query validation errors
    #[error("Invalid coordinates ({latitude}, {longitude}): {reason}")]
    InvalidCoordinates {
        latitude: f64,
        longitude: f64,
        reason: String,
    },

    #[error("Invalid distance threshold {threshold_km} km: must be a finite, non-negative number")]
    InvalidThreshold { threshold_km: f64 },

    #[error("Unknown blood type '{value}'. Expected one of A+, A-, B+, B-, AB+, AB-, O+, O-")]
    UnknownBloodType { value: String },

    #[error("Invalid donor record at row {row}: {reason}")]
    InvalidDonorRecord { row: usize, reason: String },

    // Store errors
    #[error("Dataset at {path} does not match the donor schema: {reason}")]
    InvalidSchema { path: PathBuf, reason: String },

    #[error("Donor store is closed")]
    StoreClosed,

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DonorlinkError {
    /// Whether the user can retry the request with different input.
    ///
    /// Geocoding failures are recoverable; dataset and configuration
    /// precondition violations abort the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DonorlinkError::LocationNotFound { .. }
                | DonorlinkError::GeocodingTimeout { .. }
                | DonorlinkError::GeocoderUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DonorlinkError>;
