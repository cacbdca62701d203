use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{debug, warn};

use crate::error::{ClientError, Result};

const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Runtime settings for the client
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the HomeFit backend, without a trailing slash
    pub api_url: String,
    /// Number of matches per page
    pub page_size: u32,
    /// Minimum spacing between manual refreshes
    pub refresh_cooldown: Duration,
    /// How often an unapproved broker's status is re-checked
    pub approval_poll_interval: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: 4,
            refresh_cooldown: Duration::from_secs(30),
            approval_poll_interval: Duration::from_secs(5 * 60),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load settings from `HOMEFIT_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let api_url: String = try_load("HOMEFIT_API_URL", DEFAULT_API_URL)?;
        let page_size: u32 = try_load("HOMEFIT_PAGE_SIZE", "4")?;
        if page_size == 0 {
            return Err(ClientError::Config {
                key: "HOMEFIT_PAGE_SIZE".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            page_size,
            refresh_cooldown: Duration::from_secs(try_load("HOMEFIT_REFRESH_COOLDOWN_SECS", "30")?),
            approval_poll_interval: Duration::from_secs(try_load(
                "HOMEFIT_APPROVAL_POLL_SECS",
                "300",
            )?),
            timeout: Duration::from_secs(try_load("HOMEFIT_TIMEOUT_SECS", "30")?),
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ClientError::Config {
            key: key.to_string(),
            message: e.to_string(),
        }
    })
}
