//! Location permission handling and the single-shot update subscription.

use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};
use tracing::{debug, info};

use crate::{error::ClimaError, model::Coordinate, notice::Notice};

/// Platform-reported permission level for location access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    #[default]
    Undetermined,
    RestrictedOrDenied,
    Authorized,
    Other,
}

impl AuthorizationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationState::Undetermined => "undetermined",
            AuthorizationState::RestrictedOrDenied => "restricted_or_denied",
            AuthorizationState::Authorized => "authorized",
            AuthorizationState::Other => "other",
        }
    }
}

impl std::fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The host's location service.
///
/// Results of `request_authorization` and of `start_updates` come back
/// asynchronously, as authorization-change and location-update events.
pub trait LocationService: Send + Sync + Debug {
    fn authorization_status(&self) -> AuthorizationState;
    fn request_authorization(&self);
    fn start_updates(&self);
    fn stop_updates(&self);
    fn is_updating(&self) -> bool;
}

#[derive(Debug)]
pub struct LocationTracker {
    service: Arc<dyn LocationService>,
    /// Last authorization state reported by a change event.
    authorization: AuthorizationState,
}

impl LocationTracker {
    pub fn new(service: Arc<dyn LocationService>) -> Self {
        let authorization = service.authorization_status();
        Self { service, authorization }
    }

    pub fn authorization(&self) -> AuthorizationState {
        self.authorization
    }

    pub fn is_updating(&self) -> bool {
        self.service.is_updating()
    }

    /// Starts updates or asks for permission, depending on the current status.
    pub fn start(&mut self) -> Option<Notice> {
        let status = self.service.authorization_status();
        if status != AuthorizationState::Undetermined {
            self.authorization = status;
        }

        match status {
            AuthorizationState::Undetermined => {
                debug!("location permission undetermined, requesting it");
                self.service.request_authorization();
                None
            }
            AuthorizationState::RestrictedOrDenied => Some(Notice::NoGps),
            AuthorizationState::Authorized | AuthorizationState::Other => {
                self.service.start_updates();
                None
            }
        }
    }

    /// Handles a batch of raw location updates.
    ///
    /// Stops the subscription and yields only the newest fix of the batch.
    pub fn on_locations(&mut self, batch: &[Coordinate]) -> Option<Coordinate> {
        self.service.stop_updates();
        let newest = batch.last().copied();
        if let Some(location) = newest {
            info!(%location, batch = batch.len(), "location update");
        }
        newest
    }

    pub fn on_authorization_changed(&mut self, state: AuthorizationState) -> Option<Notice> {
        if state == AuthorizationState::Undetermined {
            if self.authorization != AuthorizationState::Undetermined {
                debug!(current = %self.authorization, "ignoring change back to undetermined");
            }
            return None;
        }

        info!(from = %self.authorization, to = %state, "location authorization changed");
        self.authorization = state;

        if state == AuthorizationState::Authorized {
            self.service.start_updates();
            None
        } else {
            Some(Notice::from(&ClimaError::PermissionDenied))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum Call {
        RequestAuthorization,
        Start,
        Stop,
    }

    #[derive(Debug, Default)]
    pub(crate) struct FakeLocationService {
        pub status: Mutex<AuthorizationState>,
        pub updating: Mutex<bool>,
        pub calls: Mutex<Vec<Call>>,
    }

    impl FakeLocationService {
        pub fn with_status(status: AuthorizationState) -> Arc<Self> {
            Arc::new(Self { status: Mutex::new(status), ..Default::default() })
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl LocationService for FakeLocationService {
        fn authorization_status(&self) -> AuthorizationState {
            *self.status.lock().unwrap()
        }

        fn request_authorization(&self) {
            self.calls.lock().unwrap().push(Call::RequestAuthorization);
        }

        fn start_updates(&self) {
            *self.updating.lock().unwrap() = true;
            self.calls.lock().unwrap().push(Call::Start);
        }

        fn stop_updates(&self) {
            *self.updating.lock().unwrap() = false;
            self.calls.lock().unwrap().push(Call::Stop);
        }

        fn is_updating(&self) -> bool {
            *self.updating.lock().unwrap()
        }
    }

    #[test]
    fn start_requests_permission_when_undetermined() {
        let service = FakeLocationService::with_status(AuthorizationState::Undetermined);
        let mut tracker = LocationTracker::new(service.clone());

        assert_eq!(tracker.start(), None);
        assert_eq!(service.calls(), vec![Call::RequestAuthorization]);
    }

    #[test]
    fn start_raises_no_gps_when_denied() {
        let service = FakeLocationService::with_status(AuthorizationState::RestrictedOrDenied);
        let mut tracker = LocationTracker::new(service.clone());

        assert_eq!(tracker.start(), Some(Notice::NoGps));
        assert!(service.calls().is_empty());
    }

    #[test]
    fn start_begins_updates_when_authorized_or_other() {
        for status in [AuthorizationState::Authorized, AuthorizationState::Other] {
            let service = FakeLocationService::with_status(status);
            let mut tracker = LocationTracker::new(service.clone());

            assert_eq!(tracker.start(), None);
            assert_eq!(service.calls(), vec![Call::Start]);
            assert!(tracker.is_updating());
        }
    }

    #[test]
    fn batch_stops_updates_and_yields_last_fix() {
        let service = FakeLocationService::with_status(AuthorizationState::Authorized);
        let mut tracker = LocationTracker::new(service.clone());
        tracker.start();

        let batch = [
            Coordinate::new(1.0, 1.0),
            Coordinate::new(2.0, 2.0),
            Coordinate::new(3.0, 3.0),
        ];
        assert_eq!(tracker.on_locations(&batch), Some(Coordinate::new(3.0, 3.0)));
        assert!(!tracker.is_updating());
        assert_eq!(service.calls(), vec![Call::Start, Call::Stop]);
    }

    #[test]
    fn every_delivery_yields_its_newest_fix() {
        let service = FakeLocationService::with_status(AuthorizationState::Authorized);
        let mut tracker = LocationTracker::new(service.clone());
        tracker.start();
        tracker.on_locations(&[Coordinate::new(1.0, 1.0)]);

        assert_eq!(
            tracker.on_locations(&[Coordinate::new(2.0, 2.0)]),
            Some(Coordinate::new(2.0, 2.0))
        );
        assert_eq!(service.calls(), vec![Call::Start, Call::Stop, Call::Stop]);
    }

    #[test]
    fn empty_batch_still_stops_updates() {
        let service = FakeLocationService::with_status(AuthorizationState::Authorized);
        let mut tracker = LocationTracker::new(service.clone());
        tracker.start();

        assert_eq!(tracker.on_locations(&[]), None);
        assert!(!tracker.is_updating());
    }

    #[test]
    fn grant_starts_updates_without_notice() {
        let service = FakeLocationService::with_status(AuthorizationState::Undetermined);
        let mut tracker = LocationTracker::new(service.clone());
        tracker.start();

        assert_eq!(tracker.on_authorization_changed(AuthorizationState::Authorized), None);
        assert!(tracker.is_updating());
        assert_eq!(tracker.authorization(), AuthorizationState::Authorized);
    }

    #[test]
    fn denial_raises_permission_notice() {
        let service = FakeLocationService::with_status(AuthorizationState::Undetermined);
        let mut tracker = LocationTracker::new(service.clone());
        tracker.start();

        assert_eq!(
            tracker.on_authorization_changed(AuthorizationState::RestrictedOrDenied),
            Some(Notice::PermissionDenied)
        );
        assert_eq!(
            tracker.on_authorization_changed(AuthorizationState::Other),
            Some(Notice::PermissionDenied)
        );
        assert!(!tracker.is_updating());
    }

    #[test]
    fn undetermined_change_raises_nothing_and_never_goes_back() {
        let service = FakeLocationService::with_status(AuthorizationState::Undetermined);
        let mut tracker = LocationTracker::new(service.clone());

        assert_eq!(tracker.on_authorization_changed(AuthorizationState::Undetermined), None);

        tracker.on_authorization_changed(AuthorizationState::Authorized);
        assert_eq!(tracker.on_authorization_changed(AuthorizationState::Undetermined), None);
        assert_eq!(tracker.authorization(), AuthorizationState::Authorized);
    }
}
