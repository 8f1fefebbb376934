use crate::prelude::*;
use crate::{practicum, tg, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_with::serde_as;
use std::time::Duration;

pub struct Config {
    pub(crate) practicum: practicum::Config,
    pub(crate) tg: tg::Config,
    pub(crate) poll: PollConfig,
    pub metrics: MetricsConfig,
}

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct PollConfig {
    /// How long to sleep between two consecutive polls of the review API
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(rename = "retry_period_secs", default = "default_retry_period")]
    pub(crate) retry_period: Duration,

    /// Upper bound for every outbound HTTP request, including Telegram ones
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(rename = "request_timeout_secs", default = "default_request_timeout")]
    pub(crate) request_timeout: Duration,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct MetricsConfig {
    /// Port of the prometheus scrape endpoint. Metrics are not exported if unset.
    pub port: Option<u16>,
}

fn default_retry_period() -> Duration {
    Duration::from_secs(600)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Config {
    /// Load the config from the process environment. Logs and returns an
    /// error naming the variable if any of the required ones is missing.
    pub fn load() -> Result<Config> {
        Self::from_vars(std::env::vars()).map_err(|err| {
            error!(err = tracing_err(&err), "Invalid configuration, can't start");
            err.into()
        })
    }

    pub(crate) fn from_vars(
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Config, ConfigError> {
        let vars = non_empty_vars(vars);

        Ok(Self {
            practicum: from_vars("PRACTICUM_", &vars)?,
            tg: from_vars("TELEGRAM_", &vars)?,
            poll: from_vars("POLL_", &vars)?,
            metrics: from_vars("METRICS_", &vars)?,
        })
    }
}

/// Drops the variables with blank values, so that they are treated the
/// same way as absent ones.
pub(crate) fn non_empty_vars(
    vars: impl IntoIterator<Item = (String, String)>,
) -> Vec<(String, String)> {
    vars.into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect()
}

pub(crate) fn from_vars<T: DeserializeOwned>(
    prefix: &'static str,
    vars: &[(String, String)],
) -> Result<T, ConfigError> {
    envy::prefixed(prefix)
        .from_iter(vars.iter().cloned())
        .map_err(|err| match err {
            envy::Error::MissingValue(field) => ConfigError::MissingVar {
                var: format!("{prefix}{}", field.to_uppercase()),
            },
            envy::Error::Custom(message) => ConfigError::InvalidVars { prefix, message },
        })
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("Required environment variable `{var}` is not set or empty")]
    MissingVar { var: String },

    #[error("Invalid value in `{prefix}*` environment variables: {message}")]
    InvalidVars {
        prefix: &'static str,
        message: String,
    },
}
