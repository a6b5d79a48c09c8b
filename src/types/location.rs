//! The place a forecast or a weather log belongs to.

use crate::types::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use forecast_arbiter::LatLon;
///
/// let berlin_center = LatLon(52.5200, 13.4050);
/// assert_eq!(berlin_center.0, 52.5200); // Latitude
/// assert_eq!(berlin_center.1, 13.4050); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// An immutable, named location.
///
/// Coordinates are kept as the decimal-degree strings the caller supplied, because that
/// is what every provider query embeds verbatim. Two locations are equal when name and
/// both coordinate strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    lon: String,
    lat: String,
    name: String,
}

impl Location {
    pub fn new(name: impl Into<String>, lon: impl Into<String>, lat: impl Into<String>) -> Self {
        Self {
            lon: lon.into(),
            lat: lat.into(),
            name: name.into(),
        }
    }

    /// Longitude in decimal degrees, as supplied.
    pub fn lon(&self) -> &str {
        &self.lon
    }

    /// Latitude in decimal degrees, as supplied.
    pub fn lat(&self) -> &str {
        &self.lat
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parses the coordinate strings.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidCoordinate`] if either string is not a finite number
    /// or lies outside the valid latitude/longitude range.
    pub fn coordinates(&self) -> Result<LatLon, DomainError> {
        let lat = parse_degrees(&self.lat, 90.0)?;
        let lon = parse_degrees(&self.lon, 180.0)?;
        Ok(LatLon(lat, lon))
    }
}

fn parse_degrees(raw: &str, limit: f64) -> Result<f64, DomainError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.abs() <= limit)
        .ok_or_else(|| DomainError::InvalidCoordinate(raw.to_string()))
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.lat, self.lon)
    }
}
