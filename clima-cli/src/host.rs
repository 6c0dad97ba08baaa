//! Terminal implementations of the screen's host traits.

use std::{
    io::BufRead,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Result, anyhow};
use chrono::Local;
use clima_core::{
    AuthorizationState, Coordinate, DisplayState, Event, LocationService, Notice, Notifier,
    ShareComposer, ShareTarget, Snapshot,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Location service for the terminal.
///
/// Permission is answered with a yes/no prompt. Fixes come either from a
/// single coordinate given on the command line or from stdin lines.
#[derive(Debug)]
pub struct TerminalLocationService {
    status: Mutex<AuthorizationState>,
    updating: AtomicBool,
    /// Cleared once stdin belongs to the line reader.
    prompt_enabled: AtomicBool,
    fixed: Option<Coordinate>,
    events: UnboundedSender<Event>,
}

impl TerminalLocationService {
    pub fn new(status: AuthorizationState, events: UnboundedSender<Event>) -> Self {
        Self {
            status: Mutex::new(status),
            updating: AtomicBool::new(false),
            prompt_enabled: AtomicBool::new(true),
            fixed: None,
            events,
        }
    }

    /// Delivers `fix` every time updates are started.
    pub fn with_fix(
        status: AuthorizationState,
        fix: Coordinate,
        events: UnboundedSender<Event>,
    ) -> Self {
        Self { fixed: Some(fix), ..Self::new(status, events) }
    }

    /// Stops asking for permission interactively. Later requests leave the
    /// status undetermined and point at `clima permission`.
    pub fn disable_prompt(&self) {
        self.prompt_enabled.store(false, Ordering::SeqCst);
    }

    fn set_status(&self, state: AuthorizationState) {
        *self.status.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    fn send(&self, event: Event) {
        if self.events.send(event).is_err() {
            debug!("screen is gone, dropping location event");
        }
    }
}

impl LocationService for TerminalLocationService {
    fn authorization_status(&self) -> AuthorizationState {
        *self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn request_authorization(&self) {
        if !self.prompt_enabled.load(Ordering::SeqCst) {
            warn!("location permission requested while stdin is taken, not prompting");
            eprintln!("Location permission is undetermined; run `clima permission allow`.");
            self.send(Event::AuthorizationChanged(AuthorizationState::Undetermined));
            return;
        }

        let answer = inquire::Confirm::new("Allow clima to use your location?")
            .with_default(true)
            .with_help_message("The answer is remembered; change it with `clima permission`.")
            .prompt();

        let state = match answer {
            Ok(true) => AuthorizationState::Authorized,
            Ok(false) => AuthorizationState::RestrictedOrDenied,
            Err(err) => {
                // Left undetermined, so the question comes back next time.
                warn!(error = %err, "location permission prompt failed");
                AuthorizationState::Undetermined
            }
        };

        self.set_status(state);
        self.send(Event::AuthorizationChanged(state));
    }

    fn start_updates(&self) {
        self.updating.store(true, Ordering::SeqCst);
        if let Some(fix) = self.fixed {
            self.send(Event::LocationsUpdated(vec![fix]));
        } else {
            println!("Waiting for a location (enter lat,lon)...");
        }
    }

    fn stop_updates(&self) {
        self.updating.store(false, Ordering::SeqCst);
    }

    fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }
}

/// Parses one line typed in `clima track`.
///
/// `lat,lon` or `lat,lon;lat,lon;...` is a batch of fixes.
pub fn parse_line(line: &str) -> Result<Option<Event>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let event = match words.next() {
        Some("refresh") => Event::RefreshRequested,
        Some("resume") => Event::Resume,
        Some("quit") | Some("exit") => Event::Shutdown,
        Some("share") => {
            let target = words
                .next()
                .ok_or_else(|| anyhow!("Usage: share <facebook|twitter>"))?;
            Event::ShareRequested(ShareTarget::try_from(target)?)
        }
        _ => {
            let batch = line
                .split(';')
                .filter(|part| !part.trim().is_empty())
                .map(str::parse::<Coordinate>)
                .collect::<Result<Vec<_>>>()?;
            Event::LocationsUpdated(batch)
        }
    };

    Ok(Some(event))
}

/// Feeds stdin lines into the screen until EOF or `quit`.
pub fn spawn_stdin_reader(events: UnboundedSender<Event>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "failed to read stdin");
                    break;
                }
            };

            match parse_line(&line) {
                Ok(Some(event)) => {
                    let shutdown = matches!(event, Event::Shutdown);
                    if events.send(event).is_err() || shutdown {
                        return;
                    }
                }
                Ok(None) => {}
                Err(err) => eprintln!("{err:#}"),
            }
        }
        let _ = events.send(Event::Shutdown);
    });
}

#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&mut self, notice: Notice, duration: Duration) {
        debug!(?duration, "showing notice");
        eprintln!("! {notice}");
    }
}

/// Prints a web share-intent URL for the snapshot.
#[derive(Debug, Default)]
pub struct IntentComposer;

impl ShareComposer for IntentComposer {
    fn compose(&mut self, target: ShareTarget, snapshot: &Snapshot) -> Result<()> {
        let url = target.intent_url(snapshot)?;
        println!("Share on {target}: {url}");
        Ok(())
    }
}

/// Human-readable weather card.
pub fn render(display: &DisplayState) -> String {
    let mut out = format!(
        "{}  {}\n{}\nicon: {}  background: {}",
        display.temperature, display.condition, display.message, display.icon, display.background
    );
    if let Some(at) = display.updated_at {
        out.push_str(&format!("\nupdated {}", at.with_timezone(&Local).format("%H:%M")));
    }
    out
}
