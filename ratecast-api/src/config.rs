//! Layered service configuration.
//!
//! Layers, later wins:
//!
//! 1. built-in defaults
//! 2. `{dir}/config.json`
//! 3. `{dir}/config.{APP_MODE}.json` (mode defaults to `dev`)
//! 4. `{dir}/config.local.json`
//! 5. `.env` and process environment
//!
//! File layers are deep-merged as JSON objects, so a layer only needs the
//! keys it overrides.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use ratecast_core::constants::{DEFAULT_BIND, DEFAULT_SUBSCRIBERS_PATH};
use ratecast_core::error::{RatecastError, Result};
use ratecast_mailer::SmtpConfig;
use ratecast_rates::RatesConfig;

/// Mode used when `APP_MODE` is unset.
pub const DEFAULT_MODE: &str = "dev";

/// Complete service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listen address, `host:port`
    pub bind: String,
    /// Subscriber log location
    pub subscribers_path: PathBuf,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    /// Rate source settings
    pub rates: RatesConfig,
    /// Mail gateway settings
    pub smtp: SmtpConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.into(),
            subscribers_path: PathBuf::from(DEFAULT_SUBSCRIBERS_PATH),
            json_logs: false,
            rates: RatesConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads every layer from `dir` and the process environment.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mode = std::env::var("APP_MODE").unwrap_or_else(|_| DEFAULT_MODE.into());
        let mut config = Self::from_files(dir, &mode)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Loads defaults plus the file layers for `mode`, ignoring the environment.
    pub fn from_files(dir: impl AsRef<Path>, mode: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let mut merged = serde_json::to_value(Self::default())?;

        let layers = [
            "config.json".to_string(),
            format!("config.{}.json", mode),
            "config.local.json".to_string(),
        ];
        for name in layers {
            if let Some(layer) = read_layer(&dir.join(name))? {
                merge(&mut merged, layer);
            }
        }

        serde_json::from_value(merged)
            .map_err(|e| RatecastError::ConfigError(format!("Invalid configuration: {}", e)))
    }

    /// Applies environment overrides. `lookup` returns a variable's value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("BIND") {
            self.bind = bind;
        }
        if let Some(path) = lookup("SUBSCRIBERS_PATH") {
            self.subscribers_path = PathBuf::from(path);
        }
        if let Some(json_logs) = lookup("JSON_LOGS") {
            self.json_logs = parse_flag(&json_logs);
        }
        if let Some(base_url) = lookup("RATES_BASE_URL") {
            self.rates.base_url = base_url;
        }
        if let Some(username) = lookup("EMAIL_USERNAME") {
            self.smtp.username = username;
        }
        if let Some(password) = lookup("EMAIL_PASSWORD") {
            self.smtp.password = password;
        }
        if let Some(from) = lookup("EMAIL_FROM") {
            self.smtp.from = from;
        }
        if let Some(host) = lookup("EMAIL_SMTP_HOST") {
            self.smtp.host = host;
        }
        if let Some(port) = lookup("EMAIL_SMTP_PORT") {
            self.smtp.port = port.parse().map_err(|_| {
                RatecastError::ConfigError(format!("EMAIL_SMTP_PORT is not a port number: {}", port))
            })?;
        }
        if let Some(ssl) = lookup("EMAIL_SMTP_SSL") {
            self.smtp.ssl = parse_flag(&ssl);
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    value != "false" && value != "0" && !value.is_empty()
}

/// Reads one JSON layer; a missing file is not an error.
fn read_layer(path: &Path) -> Result<Option<Value>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let layer = serde_json::from_str(&contents).map_err(|e| {
        RatecastError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    debug!(path = %path.display(), "Loaded config layer");
    Ok(Some(layer))
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}
