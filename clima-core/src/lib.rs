//! Core library for the `clima` weather client.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Location permission handling and the distance-based refetch policy
//! - Abstraction over weather providers
//! - The weather screen event loop, notices and sharing
//!
//! It is used by `clima-cli`, but the screen only talks to its host through
//! the [`LocationService`], [`Notifier`] and [`ShareComposer`] traits, so other
//! front ends can drive it too.

pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod notice;
pub mod presenter;
pub mod provider;
pub mod screen;
pub mod share;

pub use config::{Config, LocationConfig, NoticeConfig, ProviderConfig};
pub use error::ClimaError;
pub use location::{AuthorizationState, LocationService, LocationTracker};
pub use model::{Coordinate, DisplayState, WeatherReading};
pub use notice::{Notice, Notifier};
pub use presenter::{LocationDecision, Presenter};
pub use provider::{ProviderId, WeatherProvider};
pub use screen::{Event, RunMode, WeatherScreen};
pub use share::{ShareComposer, ShareTarget, Snapshot};
