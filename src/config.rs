// src/config.rs
use anyhow::{Context, Result};
use log::warn;
use std::env;
use std::time::Duration;

use crate::services::yahoo::DEFAULT_YAHOO_BASE_URL;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub yahoo_base_url: String,
    pub fetch_timeout: Duration,
    pub assumed_pe: f64,
    pub refresh_schedule: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 3030,
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            fetch_timeout: Duration::from_secs(10),
            assumed_pe: 20.0,
            refresh_schedule: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(value) => value.parse().with_context(|| format!("PORT must be a number, got '{}'", value))?,
            None => {
                warn!("$PORT not set, defaulting to {}", defaults.port);
                defaults.port
            }
        };

        let fetch_timeout = match get("FETCH_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(
                value
                    .parse()
                    .with_context(|| format!("FETCH_TIMEOUT_SECS must be a whole number, got '{}'", value))?,
            ),
            None => defaults.fetch_timeout,
        };

        let assumed_pe = match get("ASSUMED_PE") {
            Some(value) => {
                let pe: f64 = value
                    .parse()
                    .with_context(|| format!("ASSUMED_PE must be a number, got '{}'", value))?;
                if !pe.is_finite() || pe <= 0.0 {
                    anyhow::bail!("ASSUMED_PE must be positive, got {}", pe);
                }
                pe
            }
            None => defaults.assumed_pe,
        };

        Ok(AppConfig {
            port,
            yahoo_base_url: get("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
            fetch_timeout,
            assumed_pe,
            refresh_schedule: get("REFRESH_SCHEDULE"),
        })
    }
}
