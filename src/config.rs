//! Bot configuration from environment variables

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_PORT: u16 = 10000;
const DEFAULT_ORDERS_FILE: &str = "orders.csv";
const DEFAULT_PHOTOS_DIR: &str = "photos";
const DEFAULT_CONTACT_URL: &str = "https://t.me/xatyba";
const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub token: String,
    /// Chat id of the operator; 0 when unset
    pub owner_id: i64,
    pub port: u16,
    /// Public URL Telegram should deliver updates to
    pub webhook_url: Option<String>,
    pub orders_file: PathBuf,
    pub photos_dir: PathBuf,
    pub contact_url: String,
    pub api_url: String,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let token = var("TOKEN").ok_or(ConfigError::Missing("TOKEN"))?;

        Ok(Self {
            token,
            owner_id: parse_or(var("OWNER_ID"), "OWNER_ID", 0)?,
            port: parse_or(var("PORT"), "PORT", DEFAULT_PORT)?,
            webhook_url: var("WEBHOOK_URL"),
            orders_file: var("ORDERS_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_ORDERS_FILE), PathBuf::from),
            photos_dir: var("PHOTOS_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_PHOTOS_DIR), PathBuf::from),
            contact_url: var("CONTACT_URL").unwrap_or_else(|| DEFAULT_CONTACT_URL.to_string()),
            api_url: var("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }

    pub fn has_owner(&self) -> bool {
        self.owner_id != 0
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
