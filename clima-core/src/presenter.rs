//! Location acceptance policy and rendering of readings into display state.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    error::ClimaError,
    model::{Coordinate, DisplayState, WeatherReading, temperature_label},
    notice::Notice,
};

pub const DEFAULT_THRESHOLD_METERS: f64 = 1000.0;

/// Outcome of feeding a location into the presenter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationDecision {
    /// No anchor yet: this fix becomes the anchor and is fetched.
    First(Coordinate),
    /// Far enough from the anchor to be fetched.
    Moved { coordinate: Coordinate, distance_m: f64 },
    /// Too close to the anchor; nothing to do.
    TooClose { distance_m: f64 },
}

impl LocationDecision {
    /// The coordinate to fetch, if the location was accepted.
    pub fn fetch_target(&self) -> Option<Coordinate> {
        match *self {
            LocationDecision::First(coordinate) => Some(coordinate),
            LocationDecision::Moved { coordinate, .. } => Some(coordinate),
            LocationDecision::TooClose { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Presenter {
    last_location: Option<Coordinate>,
    display: DisplayState,
    threshold_meters: f64,
    /// Move the anchor to every accepted fix instead of keeping the first one.
    advance_anchor: bool,
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_METERS, false)
    }
}

impl Presenter {
    pub fn new(threshold_meters: f64, advance_anchor: bool) -> Self {
        Self {
            last_location: None,
            display: DisplayState::default(),
            threshold_meters,
            advance_anchor,
        }
    }

    pub fn last_location(&self) -> Option<Coordinate> {
        self.last_location
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn on_location(&mut self, location: Coordinate) -> LocationDecision {
        let Some(anchor) = self.last_location else {
            self.last_location = Some(location);
            return LocationDecision::First(location);
        };

        let distance_m = location.distance_to(&anchor);
        if distance_m >= self.threshold_meters {
            info!(%location, %anchor, distance_m, "location moved past threshold");
            // The anchor stays put by default, so later fixes keep being
            // measured against the first one.
            if self.advance_anchor {
                self.last_location = Some(location);
            }
            LocationDecision::Moved { coordinate: location, distance_m }
        } else {
            debug!(%location, %anchor, distance_m, "location too similar to last one");
            LocationDecision::TooClose { distance_m }
        }
    }

    /// Coordinate for a manual refresh.
    pub fn refresh_target(&self) -> Result<Coordinate, ClimaError> {
        self.last_location.ok_or(ClimaError::NoLocation)
    }

    /// Overwrites every display field; the newest completion always wins.
    pub fn on_fetch_succeeded(&mut self, reading: &WeatherReading) {
        self.display = DisplayState {
            condition: reading.condition.clone(),
            message: reading.message.clone(),
            icon: reading.icon.clone(),
            background: reading.background.clone(),
            temperature: temperature_label(reading.celsius),
            updated_at: Some(Utc::now()),
        };
    }

    /// Leaves the display untouched and returns the notice to show.
    pub fn on_fetch_failed(&self, err: &ClimaError) -> Notice {
        warn!(error = %err, "weather fetch failed");
        Notice::from(err)
    }
}
