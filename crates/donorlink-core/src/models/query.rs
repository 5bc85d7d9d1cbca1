use crate::error::{DonorlinkError, Result};
use crate::models::donor::{BloodType, Coordinates};
use serde::{Deserialize, Serialize};

/// A single proximity match request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DonorQuery {
    /// Requester location
    pub origin: Coordinates,

    /// Maximum distance from the origin, in kilometers
    pub threshold_km: f64,

    /// Required blood type
    pub blood_type: BloodType,
}

impl DonorQuery {
    /// Create a validated query
    pub fn new(origin: Coordinates, threshold_km: f64, blood_type: BloodType) -> Result<Self> {
        let query = Self { origin, threshold_km, blood_type };
        query.validate()?;
        Ok(query)
    }

    /// Check the origin and threshold
    pub fn validate(&self) -> Result<()> {
        self.origin.validate()?;
        if !self.threshold_km.is_finite() || self.threshold_km < 0.0 {
            return Err(DonorlinkError::InvalidThreshold { threshold_km: self.threshold_km });
        }
        Ok(())
    }
}
