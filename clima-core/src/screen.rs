//! The weather screen: a single task that owns all state and reacts to
//! location, permission, fetch-completion and user events in arrival order.
//!
//! Fetches are spawned fire-and-forget and post their result back into the
//! same queue. Overlapping fetches are not de-duplicated or cancelled: the
//! completion that arrives last decides what is shown.

use std::{sync::Arc, time::Duration};

use tokio::sync::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    watch,
};
use tracing::{debug, info, warn};

use crate::{
    error::ClimaError,
    location::{AuthorizationState, LocationService, LocationTracker},
    model::{Coordinate, DisplayState, WeatherReading},
    notice::{Notice, Notifier},
    presenter::Presenter,
    provider::WeatherProvider,
    share::{ShareComposer, ShareTarget, Snapshot},
};

#[derive(Debug)]
pub enum Event {
    AuthorizationChanged(AuthorizationState),
    LocationsUpdated(Vec<Coordinate>),
    RefreshRequested,
    ShareRequested(ShareTarget),
    FetchCompleted { id: u64, result: Result<WeatherReading, ClimaError> },
    /// The host brought the screen back; re-run the start-up permission check.
    Resume,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    UntilShutdown,
    /// Stop once no location subscription is running, no fetch is in flight
    /// and nothing is left in the queue.
    UntilSettled,
}

pub struct WeatherScreen {
    tracker: LocationTracker,
    presenter: Presenter,
    provider: Arc<dyn WeatherProvider>,
    notifier: Box<dyn Notifier>,
    composer: Box<dyn ShareComposer>,
    notice_duration: Duration,
    events: UnboundedSender<Event>,
    rendered: watch::Sender<DisplayState>,
    next_fetch_id: u64,
    in_flight: usize,
}

/// Creates the queue the screen reads from.
pub fn channel() -> (UnboundedSender<Event>, UnboundedReceiver<Event>) {
    mpsc::unbounded_channel()
}

impl WeatherScreen {
    pub fn new(
        service: Arc<dyn LocationService>,
        presenter: Presenter,
        provider: Arc<dyn WeatherProvider>,
        notifier: Box<dyn Notifier>,
        composer: Box<dyn ShareComposer>,
        events: UnboundedSender<Event>,
    ) -> Self {
        Self {
            tracker: LocationTracker::new(service),
            presenter,
            provider,
            notifier,
            composer,
            notice_duration: crate::notice::DEFAULT_NOTICE_DURATION,
            events,
            rendered: watch::channel(DisplayState::default()).0,
            next_fetch_id: 0,
            in_flight: 0,
        }
    }

    pub fn with_notice_duration(mut self, duration: Duration) -> Self {
        self.notice_duration = duration;
        self
    }

    pub fn display(&self) -> &DisplayState {
        self.presenter.display()
    }

    /// Yields the display every time a reading is rendered.
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.rendered.subscribe()
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn authorization(&self) -> AuthorizationState {
        self.tracker.authorization()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn is_settled(&self) -> bool {
        self.in_flight == 0 && !self.tracker.is_updating()
    }

    /// Runs the permission check done when the screen is first shown.
    pub fn start(&mut self) {
        if let Some(notice) = self.tracker.start() {
            self.show(notice);
        }
    }

    /// Processes events until `mode` says to stop. Call [`start`](Self::start)
    /// first; the host decides when the screen is shown.
    pub async fn run(
        &mut self,
        mut events: UnboundedReceiver<Event>,
        mode: RunMode,
    ) -> DisplayState {
        loop {
            let next = if mode == RunMode::UntilSettled && self.is_settled() {
                // Drain what is already queued, but don't wait for more.
                match events.try_recv() {
                    Ok(event) => Some(event),
                    Err(_) => {
                        debug!("screen settled");
                        break;
                    }
                }
            } else {
                events.recv().await
            };

            let Some(event) = next else {
                break;
            };

            if !self.handle(event) {
                break;
            }
        }

        self.presenter.display().clone()
    }

    /// Applies one event. Returns `false` on shutdown.
    pub fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::AuthorizationChanged(state) => {
                if let Some(notice) = self.tracker.on_authorization_changed(state) {
                    self.show(notice);
                }
            }
            Event::LocationsUpdated(batch) => {
                if let Some(location) = self.tracker.on_locations(&batch) {
                    let decision = self.presenter.on_location(location);
                    if let Some(target) = decision.fetch_target() {
                        self.spawn_fetch(target);
                    }
                }
            }
            Event::RefreshRequested => match self.presenter.refresh_target() {
                Ok(target) => self.spawn_fetch(target),
                Err(err) => {
                    debug!(error = %err, "manual refresh without a location");
                    self.show(Notice::from(&err));
                }
            },
            Event::ShareRequested(target) => {
                let snapshot = Snapshot::capture(self.presenter.display());
                if let Err(err) = self.composer.compose(target, &snapshot) {
                    warn!(%target, error = %format!("{err:#}"), "share failed");
                }
            }
            Event::FetchCompleted { id, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                match result {
                    Ok(reading) => {
                        info!(
                            id,
                            condition = %reading.condition,
                            celsius = reading.celsius,
                            "fetch completed"
                        );
                        self.presenter.on_fetch_succeeded(&reading);
                        self.rendered.send_replace(self.presenter.display().clone());
                    }
                    Err(err) => {
                        let notice = self.presenter.on_fetch_failed(&err);
                        self.show(notice);
                    }
                }
            }
            Event::Resume => self.start(),
            Event::Shutdown => {
                if self.in_flight > 0 {
                    debug!(in_flight = self.in_flight, "shutting down with fetches in flight");
                }
                return false;
            }
        }
        true
    }

    fn spawn_fetch(&mut self, coordinate: Coordinate) {
        self.next_fetch_id += 1;
        self.in_flight += 1;
        let id = self.next_fetch_id;

        if self.in_flight > 1 {
            debug!(id, in_flight = self.in_flight, "fetch overlaps an earlier one");
        }
        info!(id, %coordinate, "fetching weather");

        let provider = Arc::clone(&self.provider);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = provider
                .current(coordinate)
                .await
                .map_err(|err| ClimaError::fetch_failed(&err));
            // The screen may already be gone; nothing to deliver to then.
            let _ = events.send(Event::FetchCompleted { id, result });
        });
    }

    fn show(&mut self, notice: Notice) {
        warn!(?notice, "{}", notice.message());
        self.notifier.notify(notice, self.notice_duration);
    }
}
