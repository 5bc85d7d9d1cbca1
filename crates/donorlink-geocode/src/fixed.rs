use crate::ports::Geocoder;
use donorlink_core::error::{DonorlinkError, Result};
use donorlink_core::models::Coordinates;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Geocoder backed by a fixed location table
///
/// Lookups ignore case and surrounding whitespace. Useful offline and in
/// tests, where it can also be told to behave like a service that times out.
#[derive(Debug, Default)]
pub struct FixedGeocoder {
    places: HashMap<String, Coordinates>,
    fallback: Option<Coordinates>,
    timeout_secs: Option<u64>,
    lookups: AtomicUsize,
}

fn normalize_key(location: &str) -> String {
    location.trim().to_lowercase()
}

impl FixedGeocoder {
    /// Create an empty geocoder that resolves nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every non-blank location to `coordinates`
    pub fn always(coordinates: Coordinates) -> Self {
        Self { fallback: Some(coordinates), ..Self::default() }
    }

    /// Add a known place
    pub fn with_place(mut self, location: &str, coordinates: Coordinates) -> Self {
        self.places.insert(normalize_key(location), coordinates);
        self
    }

    /// Fail every lookup with `GeocodingTimeout`
    pub fn timing_out(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Number of lookups attempted so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl Geocoder for FixedGeocoder {
    fn resolve(&self, location: &str) -> Result<Coordinates> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let key = normalize_key(location);
        if let Some(timeout_secs) = self.timeout_secs {
            return Err(DonorlinkError::GeocodingTimeout {
                location: location.trim().to_string(),
                timeout_secs,
            });
        }
        if key.is_empty() {
            return Err(DonorlinkError::LocationNotFound { location: String::new() });
        }

        self.places
            .get(&key)
            .copied()
            .or(self.fallback)
            .ok_or_else(|| DonorlinkError::LocationNotFound { location: location.trim().to_string() })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
