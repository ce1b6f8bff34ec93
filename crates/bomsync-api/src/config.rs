use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use bomsync_core::util::{is_http_url, normalize_text_option};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub supabase_url: String,
    pub supabase_key: String,
    pub supabase_timeout: Duration,
    pub sage100_db_path: PathBuf,
    pub allow_clear: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &"[REDACTED]")
            .field("supabase_timeout", &self.supabase_timeout)
            .field("sage100_db_path", &self.sage100_db_path)
            .field("allow_clear", &self.allow_clear)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "BOMSYNC_BIND_ADDR", "127.0.0.1:8000");

        let supabase_url = required_trimmed(&lookup, "SUPABASE_URL")?;
        let supabase_key = required_trimmed(&lookup, "SUPABASE_KEY")?;
        if !is_http_url(&supabase_url) {
            return Err(ConfigError::Invalid(
                "SUPABASE_URL must start with http:// or https://".to_string(),
            ));
        }

        let timeout_secs = value_or_default(&lookup, "SUPABASE_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::Invalid(
                    "SUPABASE_TIMEOUT_SECS must be an integer in [1, 300]".to_string(),
                )
            })?;
        if !(1..=300).contains(&timeout_secs) {
            return Err(ConfigError::Invalid(
                "SUPABASE_TIMEOUT_SECS must be in [1, 300]".to_string(),
            ));
        }

        let sage100_db_path =
            PathBuf::from(value_or_default(&lookup, "SAGE100_DB_PATH", "./sage100.db"));

        let allow_clear = match value_or_default(&lookup, "BOMSYNC_ALLOW_CLEAR", "false")
            .to_ascii_lowercase()
            .as_str()
        {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => {
                return Err(ConfigError::Invalid(format!(
                    "BOMSYNC_ALLOW_CLEAR must be true or false, got '{other}'"
                )))
            }
        };

        Ok(Self {
            bind_addr,
            supabase_url: trim_trailing(&supabase_url).to_string(),
            supabase_key,
            supabase_timeout: Duration::from_secs(timeout_secs),
            sage100_db_path,
            allow_clear,
        })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}

fn trim_trailing(value: &str) -> &str {
    value.trim_end_matches('/')
}
