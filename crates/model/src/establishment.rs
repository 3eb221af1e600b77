use serde::{Deserialize, Serialize};
use utility::{geo, id::HasId};

/// Category tags that ship with the dataset. Categories are free-form, these
/// are just the ones the importer knows flags for.
pub const PHARMACY: &str = "pharmacy";
pub const GAS_STATION: &str = "gas_station";

/// A point of interest, e.g. a pharmacy or a gas station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Establishment {
    pub name: String,
    #[serde(rename = "type")]
    pub establishment_type: String,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "coordinates")]
    pub location: Coordinates,
}

impl Establishment {
    pub fn new<N, T, A>(name: N, establishment_type: T, address: A, location: Coordinates) -> Self
    where
        N: Into<String>,
        T: Into<String>,
        A: Into<String>,
    {
        Self {
            name: name.into(),
            establishment_type: establishment_type.into(),
            address: address.into(),
            location,
        }
    }
}

impl HasId for Establishment {
    type IdType = i32;
}

/// A WGS84 (SRID 4326) position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        geo::is_valid_latitude(self.latitude) && geo::is_valid_longitude(self.longitude)
    }

    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        geo::haversine_distance_m(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}
