use crate::error::ConfigError;

use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_VAPI_BASE_URL: &str = "https://api.vapi.ai";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_FOLLOW_UP_DELAY_SECS: u64 = 300;
pub const DEFAULT_MAX_DB_CONNECTIONS: u32 = 5;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub vapi_api_token: String,
    pub vapi_assistant_id: String,
    pub vapi_phone_number_id: String,
    pub vapi_base_url: String,
    pub port: u16,
    pub follow_up_delay: Duration,
    pub max_db_connections: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("vapi_assistant_id", &self.vapi_assistant_id)
            .field("vapi_phone_number_id", &self.vapi_phone_number_id)
            .field("vapi_base_url", &self.vapi_base_url)
            .field("port", &self.port)
            .field("follow_up_delay", &self.follow_up_delay)
            .field("max_db_connections", &self.max_db_connections)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.  Secrets have no fallback value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            vapi_api_token: required("VAPI_API_TOKEN")?,
            vapi_assistant_id: required("VAPI_ASSISTANT_ID")?,
            vapi_phone_number_id: required("VAPI_PHONE_NUMBER_ID")?,
            vapi_base_url: get("VAPI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_VAPI_BASE_URL.to_string()),
            port: parse_or(get("PORT"), "PORT", DEFAULT_PORT)?,
            follow_up_delay: Duration::from_secs(parse_or(
                get("FOLLOW_UP_DELAY_SECS"),
                "FOLLOW_UP_DELAY_SECS",
                DEFAULT_FOLLOW_UP_DELAY_SECS,
            )?),
            max_db_connections: parse_or(
                get("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_DB_CONNECTIONS,
            )?,
        })
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: v }),
        None => Ok(default),
    }
}
