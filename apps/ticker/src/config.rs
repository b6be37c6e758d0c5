use std::env::var;

use anyhow::{Context, Result};
use stock::DEFAULT_BASE_API;

const DEFAULT_SYMBOL: &str = "UNH";
const DEFAULT_DAYS: u32 = 7;

#[derive(Clone)]
pub struct Config {
    pub base_api: String,
    pub key_id: Option<String>,
    pub secret: Option<String>,
    pub symbol: String,
    pub days: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let days = match present("TICKER_DAYS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("TICKER_DAYS must be a whole number, got {raw:?}"))?,
            None => DEFAULT_DAYS,
        };

        Ok(Self {
            base_api: present("APCA_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_API.to_string()),
            key_id: present("APCA_API_KEY_ID"),
            secret: present("APCA_API_SECRET_KEY"),
            symbol: present("TICKER_SYMBOL")
                .map(|s| s.trim().to_uppercase())
                .unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
            days,
        })
    }

    /// `(key_id, secret)` when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.key_id, &self.secret) {
            (Some(key_id), Some(secret)) => Some((key_id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}
