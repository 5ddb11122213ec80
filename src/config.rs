use crate::clock::{Clock, FixedClock, SystemClock};
use crate::cycle::parse_date;
use chrono::NaiveDate;
use std::{env, path::PathBuf, sync::Arc, time::Duration};
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/state.json";
const DEFAULT_NOTIFY_INTERVAL_SECS: u64 = 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("NOTIFY_INTERVAL_SECS must be a positive integer, got '{0}'")]
    NotifyInterval(String),
    #[error("APP_FIXED_DATE must be YYYY-MM-DD, got '{0}'")]
    FixedDate(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub notify_interval: Duration,
    pub fixed_date: Option<NaiveDate>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let notify_interval = match lookup("NOTIFY_INTERVAL_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::NotifyInterval(value)),
            },
            None => Duration::from_secs(DEFAULT_NOTIFY_INTERVAL_SECS),
        };

        let fixed_date = lookup("APP_FIXED_DATE")
            .map(|value| parse_date(&value).map_err(|_| ConfigError::FixedDate(value)))
            .transpose()?;

        Ok(Self {
            port,
            data_path,
            notify_interval,
            fixed_date,
        })
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        match self.fixed_date {
            Some(date) => Arc::new(FixedClock::at_midnight(date)),
            None => Arc::new(SystemClock),
        }
    }
}
