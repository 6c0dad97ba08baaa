use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use clima_core::{
    AuthorizationState, Config, Coordinate, Event, LocationService, Presenter, ProviderId, RunMode,
    WeatherProvider, WeatherScreen, provider, screen,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::host::{self, IntentComposer, TerminalLocationService, TerminalNotifier};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "clima", version, about = "Weather for where you are")]
pub struct Cli {
    /// Use this provider instead of the configured default.
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Log what the screen is doing to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        #[arg(value_name = "PROVIDER")]
        name: String,
    },

    /// Show the weather once for a location given as "lat,lon".
    Show {
        #[arg(allow_hyphen_values = true)]
        location: Coordinate,
    },

    /// Read locations and commands from stdin and keep the screen updated.
    Track,

    /// Change the remembered answer to the location permission prompt.
    Permission {
        #[arg(value_enum)]
        action: PermissionAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionAction {
    Allow,
    Deny,
    Reset,
}

impl PermissionAction {
    fn state(self) -> AuthorizationState {
        match self {
            PermissionAction::Allow => AuthorizationState::Authorized,
            PermissionAction::Deny => AuthorizationState::RestrictedOrDenied,
            PermissionAction::Reset => AuthorizationState::Undetermined,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match &self.command {
            Command::Configure { name } => configure(name),
            Command::Show { location } => {
                let config = Config::load()?;
                let provider = self.provider(&config)?;
                show(config, provider, *location).await
            }
            Command::Track => {
                let config = Config::load()?;
                let provider = self.provider(&config)?;
                track(config, provider).await
            }
            Command::Permission { action } => {
                let mut config = Config::load()?;
                config.location.authorization = action.state();
                config.save()?;
                println!("Location permission: {}", config.location.authorization);
                Ok(())
            }
        }
    }

    fn provider(&self, config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
        let boxed = match &self.provider {
            Some(name) => {
                provider::provider_from_config(ProviderId::try_from(name.as_str())?, config)?
            }
            None => provider::default_provider_from_config(config)?,
        };
        Ok(Arc::from(boxed))
    }
}

fn configure(name: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(name)?;
    let mut config = Config::load()?;

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key);

    if config.default_provider_id().ok() != Some(id) {
        let make_default = inquire::Confirm::new(&format!("Use {id} by default?"))
            .with_default(false)
            .prompt()
            .context("Failed to read answer")?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn build_screen(
    config: &Config,
    service: Arc<TerminalLocationService>,
    provider: Arc<dyn WeatherProvider>,
    events: UnboundedSender<Event>,
) -> WeatherScreen {
    WeatherScreen::new(
        service,
        Presenter::new(config.location.threshold_meters, config.location.advance_anchor),
        provider,
        Box::new(TerminalNotifier),
        Box::new(IntentComposer),
        events,
    )
    .with_notice_duration(config.notice_duration())
}

async fn show(
    mut config: Config,
    provider: Arc<dyn WeatherProvider>,
    location: Coordinate,
) -> anyhow::Result<()> {
    let (tx, rx) = screen::channel();
    let service = Arc::new(TerminalLocationService::with_fix(
        config.location.authorization,
        location,
        tx.clone(),
    ));

    let mut screen = build_screen(&config, service.clone(), provider, tx);
    screen.start();
    let display = screen.run(rx, RunMode::UntilSettled).await;

    remember_authorization(&mut config, service.authorization_status())?;

    if !display.is_empty() {
        println!("{}", host::render(&display));
    }
    Ok(())
}

async fn track(mut config: Config, provider: Arc<dyn WeatherProvider>) -> anyhow::Result<()> {
    let (tx, rx) = screen::channel();
    let service =
        Arc::new(TerminalLocationService::new(config.location.authorization, tx.clone()));

    let mut screen = build_screen(&config, service.clone(), provider, tx.clone());

    let mut rendered = screen.subscribe();
    let printer = tokio::spawn(async move {
        while rendered.changed().await.is_ok() {
            let display = rendered.borrow_and_update().clone();
            println!("{}", host::render(&display));
        }
    });

    // Permission is settled before stdin is handed to the reader.
    screen.start();
    remember_authorization(&mut config, service.authorization_status())?;

    println!("Commands: lat,lon[;lat,lon...] | refresh | resume | share <facebook|twitter> | quit");
    service.disable_prompt();
    host::spawn_stdin_reader(tx);

    screen.run(rx, RunMode::UntilShutdown).await;
    drop(screen);
    // The printer stops once the screen is dropped.
    printer.await.context("Display printer task failed")?;

    remember_authorization(&mut config, service.authorization_status())?;
    Ok(())
}

fn remember_authorization(config: &mut Config, state: AuthorizationState) -> anyhow::Result<()> {
    if state == AuthorizationState::Undetermined || state == config.location.authorization {
        return Ok(());
    }

    info!(%state, "remembering location permission");
    config.location.authorization = state;
    config.save()
}
