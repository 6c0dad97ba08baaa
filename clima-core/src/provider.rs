use crate::{
    Config, Coordinate, WeatherReading,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => {
                let supported: Vec<&str> = ProviderId::all().iter().map(|id| id.as_str()).collect();
                Err(anyhow::anyhow!(
                    "Unknown provider '{value}'. Supported providers: {}.",
                    supported.join(", ")
                ))
            }
        }
    }
}

/// One-shot current-weather lookup. No retries, no timeout, no caching.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, coordinate: Coordinate) -> anyhow::Result<WeatherReading>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let provider_cfg = config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `clima configure {id}` and enter your API key."
        )
    })?;

    let api_key = provider_cfg.api_key.clone();
    let base_url = provider_cfg.base_url.clone();

    let boxed: Box<dyn WeatherProvider> = match (id, base_url) {
        (ProviderId::OpenWeather, Some(url)) => {
            Box::new(OpenWeatherProvider::with_base_url(api_key, url))
        }
        (ProviderId::OpenWeather, None) => Box::new(OpenWeatherProvider::new(api_key)),
        (ProviderId::WeatherApi, Some(url)) => {
            Box::new(WeatherApiProvider::with_base_url(api_key, url))
        }
        (ProviderId::WeatherApi, None) => Box::new(WeatherApiProvider::new(api_key)),
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

/// Icon identifier for a free-text condition such as "Clouds" or "Light rain".
pub(crate) fn icon_for(condition: &str) -> &'static str {
    let c = condition.to_lowercase();
    let any = |words: &[&str]| words.iter().any(|w| c.contains(w));

    if any(&["thunder", "storm"]) {
        "storm"
    } else if any(&["snow", "sleet", "blizzard", "ice", "freezing"]) {
        "snow"
    } else if any(&["rain", "drizzle", "shower"]) {
        "rain"
    } else if any(&["fog", "mist", "haze", "smoke", "dust", "sand"]) {
        "fog"
    } else if any(&["clear", "sunny"]) {
        "sun"
    } else {
        "cloud"
    }
}

pub(crate) fn background_for(icon: &str) -> String {
    format!("bg_{icon}")
}

pub(crate) fn message_for(celsius: f64) -> &'static str {
    match celsius {
        t if t < 0.0 => "Bundle up, it's freezing",
        t if t < 10.0 => "Chilly out there",
        t if t < 18.0 => "Grab a light jacket",
        t if t < 28.0 => "Nice day",
        _ => "Stay cool and hydrated",
    }
}

/// Builds a reading from the two values every provider returns.
pub(crate) fn reading_from(condition: String, celsius: f64) -> WeatherReading {
    let icon = icon_for(&condition);
    WeatherReading {
        message: message_for(celsius).to_string(),
        icon: icon.to_string(),
        background: background_for(icon),
        condition,
        celsius,
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
