//! Geocoding port definition

use donorlink_core::error::Result;
use donorlink_core::models::Coordinates;

/// Port for resolving free-text locations to coordinates
pub trait Geocoder: Send + Sync {
    /// Resolve a location to coordinates
    ///
    /// # Errors
    /// * `LocationNotFound` - the service has no match for `location`
    /// * `GeocodingTimeout` - the service did not answer within its timeout
    /// * `GeocoderUnavailable` - any other transport or protocol failure
    ///
    /// Implementations make a single attempt and never retry.
    fn resolve(&self, location: &str) -> Result<Coordinates>;

    /// Get the name of the geocoding backend
    fn name(&self) -> &str;
}

impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    fn resolve(&self, location: &str) -> Result<Coordinates> {
        (**self).resolve(location)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
