//src/geolocation.rs
use thiserror::Error;

use crate::workout::Coordinates;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Geolocation is not available")]
    Unavailable,
    #[error("Could not get current position: {0}")]
    PositionUnavailable(String),
}

/// One-shot position lookup.
pub trait Geolocation {
    fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// A position known up front (e.g. the `home` entry in the config file).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FixedLocation(pub Option<Coordinates>);

impl Geolocation for FixedLocation {
    fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        match self.0 {
            Some(coords) if coords.is_valid() => Ok(coords),
            Some(coords) => Err(GeolocationError::PositionUnavailable(format!(
                "{coords} is not a valid position"
            ))),
            None => Err(GeolocationError::Unavailable),
        }
    }
}
