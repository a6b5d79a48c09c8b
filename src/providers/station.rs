//! Meteostat weather stations and nearest-station lookup.

use crate::types::location::LatLon;
use haversine::{distance, Location as HaversineLocation, Units};
use ordered_float::OrderedFloat;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A Meteostat weather station, as listed in the bulk station metadata.
///
/// Only the fields needed to pick a station are kept; the rest of the metadata is ignored
/// while parsing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// The unique Meteostat station identifier (e.g., "10637").
    pub id: String,
    /// The country code where the station is located (e.g., "NL", "DE").
    pub country: String,
    /// The region code (state, province, etc.), if available.
    pub region: Option<String>,
    /// The IANA timezone name for the station's location, if available.
    pub timezone: Option<String>,
    /// Station names by language (e.g., {"en": "Berlin / Tempelhof"}).
    pub name: HashMap<String, String>,
    pub location: StationLocation,
}

/// Geographical position of a weather station.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct StationLocation {
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
    /// Elevation above sea level in meters, if available.
    pub elevation: Option<i32>,
}

impl Station {
    /// English name if present, otherwise any name, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.name
            .get("en")
            .or_else(|| self.name.values().next())
            .map(String::as_str)
            .unwrap_or(&self.id)
    }

    /// Great-circle distance in kilometers.
    pub fn distance_km(&self, point: LatLon) -> f64 {
        distance(
            HaversineLocation {
                latitude: point.0,
                longitude: point.1,
            },
            HaversineLocation {
                latitude: self.location.latitude,
                longitude: self.location.longitude,
            },
            Units::Kilometers,
        )
    }
}

impl RTreeObject for Station {
    type Envelope = AABB<[f64; 2]>;

    /// A degenerate box at `[latitude, longitude]`.
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.latitude, self.location.longitude])
    }
}

impl PointDistance for Station {
    /// Squared planar distance in degrees, only used to order candidates.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.location.latitude - point[0];
        let dy = self.location.longitude - point[1];
        dx * dx + dy * dy
    }
}

/// How many R-tree neighbours are re-ranked by great-circle distance. Planar order in
/// degrees can differ from haversine order away from the equator.
const CANDIDATE_LIMIT: usize = 20;

/// Spatial index over a station list.
#[derive(Debug, Clone)]
pub struct StationIndex {
    rtree: RTree<Station>,
}

impl StationIndex {
    pub fn new(stations: Vec<Station>) -> Self {
        Self {
            rtree: RTree::bulk_load(stations),
        }
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// Returns the station closest to `point` together with its distance in km, if one
    /// lies within `max_distance_km`.
    pub fn nearest(&self, point: LatLon, max_distance_km: f64) -> Option<(&Station, f64)> {
        self.rtree
            .nearest_neighbor_iter(&[point.0, point.1])
            .take(CANDIDATE_LIMIT)
            .map(|station| (station, station.distance_km(point)))
            .filter(|(_, km)| *km <= max_distance_km)
            .min_by_key(|(_, km)| OrderedFloat(*km))
    }
}
