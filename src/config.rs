//! Configuration types.

use crate::deck::engine::EngineOptions;
use crate::deck::store::CollisionPolicy;
use crate::error::ConfigError;
use crate::import::SlackConfig;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct DeckConfig {
    /// HTTP / WebSocket listen port.
    pub port: u16,
    /// How imports handle ids that already exist.
    pub collision_policy: CollisionPolicy,
    /// Whether reset also clears favorites.
    pub reset_clears_favorites: bool,
    /// Run the terminal triage REPL alongside the server.
    pub cli: bool,
    /// Slack import (None if not configured).
    pub slack: Option<SlackConfig>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            collision_policy: CollisionPolicy::Reject,
            reset_clears_favorites: false,
            cli: true,
            slack: None,
        }
    }
}

impl DeckConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port: u16 = match lookup("SIGNAL_DECK_PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "SIGNAL_DECK_PORT".into(),
                message: format!("expected a port number, got {v:?}"),
            })?,
            None => defaults.port,
        };

        let collision_policy: CollisionPolicy = match lookup("SIGNAL_DECK_COLLISION_POLICY") {
            Some(v) => v
                .trim()
                .to_lowercase()
                .parse()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "SIGNAL_DECK_COLLISION_POLICY".into(),
                    message,
                })?,
            None => defaults.collision_policy,
        };

        let reset_clears_favorites = match lookup("SIGNAL_DECK_RESET_FAVORITES") {
            Some(v) => parse_bool("SIGNAL_DECK_RESET_FAVORITES", &v)?,
            None => defaults.reset_clears_favorites,
        };

        let cli = match lookup("SIGNAL_DECK_CLI") {
            Some(v) => parse_bool("SIGNAL_DECK_CLI", &v)?,
            None => defaults.cli,
        };

        Ok(Self {
            port,
            collision_policy,
            reset_clears_favorites,
            cli,
            slack: SlackConfig::from_lookup(&lookup),
        })
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            reset_clears_favorites: self.reset_clears_favorites,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
