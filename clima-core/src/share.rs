//! Snapshots of the weather screen and handing them to a share composer.

use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use std::fmt::Debug;

use crate::model::DisplayState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareTarget {
    Facebook,
    Twitter,
}

impl ShareTarget {
    /// Service type string the composer uses to pick the network.
    pub fn service_type(&self) -> &'static str {
        match self {
            ShareTarget::Facebook => "facebook",
            ShareTarget::Twitter => "twitter",
        }
    }

    /// Web share-intent URL carrying the snapshot text.
    pub fn intent_url(&self, snapshot: &Snapshot) -> Result<Url> {
        let url = match self {
            ShareTarget::Facebook => Url::parse_with_params(
                "https://www.facebook.com/sharer/sharer.php",
                &[("quote", snapshot.text())],
            ),
            ShareTarget::Twitter => Url::parse_with_params(
                "https://twitter.com/intent/tweet",
                &[("text", snapshot.text())],
            ),
        };
        url.with_context(|| format!("Failed to build {} share URL", self.service_type()))
    }
}

impl TryFrom<&str> for ShareTarget {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "facebook" => Ok(ShareTarget::Facebook),
            "twitter" => Ok(ShareTarget::Twitter),
            _ => Err(anyhow!("Unknown share target '{value}'. Supported: facebook, twitter.")),
        }
    }
}

impl std::fmt::Display for ShareTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.service_type())
    }
}

/// A rendered card of what the screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    text: String,
}

impl Snapshot {
    pub fn capture(display: &DisplayState) -> Self {
        if display.is_empty() {
            return Self { text: "Clima: no weather yet".to_string() };
        }

        let mut text = format!(
            "{} {} · {}\n{}",
            display.temperature, display.condition, display.icon, display.message
        );
        if let Some(at) = display.updated_at {
            text.push_str(&format!("\nUpdated {}", at.format("%Y-%m-%d %H:%M UTC")));
        }
        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

pub trait ShareComposer: Send + Debug {
    fn compose(&mut self, target: ShareTarget, snapshot: &Snapshot) -> Result<()>;
}
