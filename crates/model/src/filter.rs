use serde::{Deserialize, Serialize};
use thiserror::Error;
use utility::geo;

use crate::establishment::{Coordinates, Establishment};

/// Radius used by the proximity filter when none is given.
pub const DEFAULT_RADIUS_M: f64 = 1000.0;

/// Type filter value that disables type filtering.
pub const ALL_TYPES: &str = "all";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Invalid coordinates provided: `{parameter}` must be a number, got {value:?}")]
    NotANumber {
        parameter: &'static str,
        value: String,
    },

    #[error("Invalid coordinates provided: `{parameter}` = {value} is out of range")]
    OutOfRange { parameter: &'static str, value: f64 },

    #[error("Invalid radius provided: {0:?} is not a non-negative number of meters")]
    InvalidRadius(String),
}

/// Query parameters as they arrive over the wire. Everything is kept as text
/// so that malformed numbers can be reported instead of rejected wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEstablishmentQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub establishment_type: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub radius: Option<String>,
}

/// Include only establishments within `radius` meters of a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Proximity {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    pub radius: f64,
}

impl Proximity {
    pub fn center(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn contains(&self, location: &Coordinates) -> bool {
        self.center().distance_m(location) <= self.radius
    }
}

/// The effective filters of a list query. `None` means "not filtered". All
/// present filters are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EstablishmentFilter {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub establishment_type: Option<String>,
    pub proximity: Option<Proximity>,
}

impl EstablishmentFilter {
    pub fn matches(&self, establishment: &Establishment) -> bool {
        let search_matches = self.search.as_ref().map_or(true, |search| {
            establishment
                .name
                .to_lowercase()
                .contains(&search.to_lowercase())
        });
        let type_matches = self
            .establishment_type
            .as_ref()
            .map_or(true, |t| &establishment.establishment_type == t);
        let proximity_matches = self
            .proximity
            .as_ref()
            .map_or(true, |proximity| proximity.contains(&establishment.location));

        search_matches && type_matches && proximity_matches
    }
}

impl TryFrom<RawEstablishmentQuery> for EstablishmentFilter {
    type Error = FilterError;

    fn try_from(raw: RawEstablishmentQuery) -> Result<Self, Self::Error> {
        let search = non_blank(raw.search);
        let establishment_type = non_blank(raw.establishment_type)
            .filter(|t| !t.eq_ignore_ascii_case(ALL_TYPES));

        let latitude = non_blank(raw.lat)
            .map(|lat| parse_coordinate("lat", &lat, geo::is_valid_latitude))
            .transpose()?;
        let longitude = non_blank(raw.lon)
            .map(|lon| parse_coordinate("lon", &lon, geo::is_valid_longitude))
            .transpose()?;
        let radius = non_blank(raw.radius)
            .map(|radius| parse_radius(&radius))
            .transpose()?
            .unwrap_or(DEFAULT_RADIUS_M);

        let proximity = latitude.zip(longitude).map(|(latitude, longitude)| Proximity {
            latitude,
            longitude,
            radius,
        });

        Ok(Self {
            search,
            establishment_type,
            proximity,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_coordinate(
    parameter: &'static str,
    value: &str,
    in_range: fn(f64) -> bool,
) -> Result<f64, FilterError> {
    let parsed: f64 = value.parse().map_err(|_| FilterError::NotANumber {
        parameter,
        value: value.to_owned(),
    })?;
    if !in_range(parsed) {
        return Err(FilterError::OutOfRange {
            parameter,
            value: parsed,
        });
    }
    Ok(parsed)
}

fn parse_radius(value: &str) -> Result<f64, FilterError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|radius| radius.is_finite() && *radius >= 0.0)
        .ok_or_else(|| FilterError::InvalidRadius(value.to_owned()))
}
