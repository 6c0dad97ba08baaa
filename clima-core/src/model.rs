use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A point on the earth in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Mean earth radius in meters.
    const EARTH_RADIUS_M: f64 = 6_371_000.0;

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle (haversine) distance to `other`, in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let d = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        Self::EARTH_RADIUS_M * d.abs()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = anyhow::Error;

    /// Parses `"lat,lon"`, e.g. `"19.4326,-99.1332"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("Expected a coordinate as 'lat,lon', got '{s}'"))?;

        let latitude: f64 = lat
            .trim()
            .parse()
            .with_context(|| format!("Invalid latitude '{}'", lat.trim()))?;
        let longitude: f64 = lon
            .trim()
            .parse()
            .with_context(|| format!("Invalid longitude '{}'", lon.trim()))?;

        if !(-90.0..=90.0).contains(&latitude) {
            return Err(anyhow!("Latitude {latitude} is outside -90..=90"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(anyhow!("Longitude {longitude} is outside -180..=180"));
        }

        Ok(Self::new(latitude, longitude))
    }
}

/// A single weather snapshot for a coordinate, as returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub condition: String,
    pub message: String,
    pub icon: String,
    pub background: String,
    pub celsius: f64,
}

/// What the weather screen currently shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayState {
    pub condition: String,
    pub message: String,
    pub icon: String,
    pub background: String,
    pub temperature: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DisplayState {
    /// True until the first reading has been rendered.
    pub fn is_empty(&self) -> bool {
        self.updated_at.is_none()
    }
}

/// Temperature label, e.g. `"22° C"`.
pub fn temperature_label(celsius: f64) -> String {
    // Rounding -0.4 would otherwise print as "-0".
    let rounded = celsius.round() as i64;
    format!("{rounded}° C")
}
