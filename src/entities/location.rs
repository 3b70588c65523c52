use geo_types::{Geometry, Point};
use serde::{Deserialize, Serialize};

use crate::error::Error;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub coordinates: Coordinates,
}

impl Location {
    pub fn new(coordinates: Coordinates, address: String) -> Self {
        Self {
            address,
            coordinates,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::validation("latitude must be a number between -90 and 90"));
        }

        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::validation(
                "longitude must be a number between -180 and 180",
            ));
        }

        Ok(())
    }

    /// Great-circle distance in meters.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_METERS * c
    }
}

impl From<Coordinates> for Geometry<f64> {
    fn from(coordinates: Coordinates) -> Self {
        Geometry::Point(Point::new(coordinates.lng, coordinates.lat))
    }
}

/// Restricts the availability query to rides picked up within `radius_m`
/// meters of `center`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Proximity {
    pub center: Coordinates,
    pub radius_m: f64,
}

impl Proximity {
    pub fn validate(&self) -> Result<(), Error> {
        self.center.validate()?;

        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(Error::validation("radius must be a positive number of meters"));
        }

        Ok(())
    }

    pub fn contains(&self, coordinates: &Coordinates) -> bool {
        self.center.distance_to(coordinates) <= self.radius_m
    }
}
