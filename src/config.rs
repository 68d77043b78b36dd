// src/config.rs
use std::{env, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub apiai_access_token: String,
    pub apiai_lang: String,
    pub apiai_base_url: String,
    pub fb_verify_token: String,
    pub fb_page_access_token: String,
    pub fb_graph_url: String,
    pub dispatch_delay: Duration,
    pub subscribe_delay: Duration,
    pub session_ttl: Option<Duration>,
    pub test_recipient_id: Option<String>,
}

impl Config {
    /// Read settings from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            port: parse_or(&get, "PORT", 5000)?,
            apiai_access_token: required("APIAI_ACCESS_TOKEN")?,
            apiai_lang: get("APIAI_LANG").unwrap_or_else(|| "en".to_string()),
            apiai_base_url: get("APIAI_BASE_URL")
                .unwrap_or_else(|| "https://api.api.ai/v1".to_string()),
            fb_verify_token: required("FB_VERIFY_TOKEN")?,
            fb_page_access_token: required("FB_PAGE_ACCESS_TOKEN")?,
            fb_graph_url: get("FB_GRAPH_URL")
                .unwrap_or_else(|| "https://graph.facebook.com/v2.6".to_string()),
            dispatch_delay: Duration::from_millis(parse_or(&get, "DISPATCH_DELAY_MS", 1000)?),
            subscribe_delay: Duration::from_millis(parse_or(&get, "SUBSCRIBE_DELAY_MS", 3000)?),
            session_ttl: parse_opt::<u64, _>(&get, "SESSION_TTL_SECS")?.map(Duration::from_secs),
            test_recipient_id: get("TEST_RECIPIENT_ID"),
        })
    }
}

fn parse_opt<T, G>(get: &G, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, name)?.unwrap_or(default))
}
