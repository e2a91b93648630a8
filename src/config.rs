use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::collections::HashMap;
use std::env::VarError;
use std::{fs, path::Path, time::Duration};
use url::Url;

use crate::error::Error;

const INTERVAL_VAR: &str = "AVAILCHECK_INTERVAL_SECS";
const TIMEOUT_VAR: &str = "AVAILCHECK_TIMEOUT_SECS";
const LATENCY_THRESHOLD_VAR: &str = "AVAILCHECK_LATENCY_THRESHOLD_MS";

const DEFAULT_INTERVAL_SECS: u64 = 15;
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_LATENCY_THRESHOLD_MS: u64 = 500;

#[derive(Debug)]
pub struct Config {
    pub endpoints: Vec<Endpoint>,
    pub settings: Settings,
}

/// A single probe target, validated at load time and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: Option<String>,
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// Timing knobs for the monitoring loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub interval: Duration,
    pub timeout: Duration,
    pub latency_threshold: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            latency_threshold: Duration::from_millis(DEFAULT_LATENCY_THRESHOLD_MS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    url: String,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlEndpoints {
    #[serde(default)]
    endpoints: Vec<RawEndpoint>,
}

impl Config {
    /// Loads the endpoint list from `path` and the settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if any endpoint
    /// is invalid, or if a settings variable is not an unsigned integer.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        Ok(Config {
            endpoints: load_endpoints(path)?,
            settings: Settings::from_env()?,
        })
    }
}

/// Parses the endpoint descriptors in `path`, picking the format from the
/// file extension (`.yaml`/`.yml` or `.toml`).
///
/// # Errors
///
/// Returns an error if the file is unreadable, malformed, has an unknown
/// extension, or contains an invalid descriptor.
pub fn load_endpoints<P: AsRef<Path>>(path: P) -> Result<Vec<Endpoint>, Error> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let raw: Vec<RawEndpoint> = match extension.as_deref() {
        // An empty YAML document deserializes to None
        Some("yaml" | "yml") => {
            serde_yaml::from_str::<Option<Vec<RawEndpoint>>>(&content)?.unwrap_or_default()
        }
        Some("toml") => toml::from_str::<TomlEndpoints>(&content)?.endpoints,
        _ => {
            return Err(Error::Config(format!(
                "unsupported configuration file extension: {}",
                path.display()
            )));
        }
    };

    raw.into_iter().map(Endpoint::try_from).collect()
}

impl TryFrom<RawEndpoint> for Endpoint {
    type Error = Error;

    fn try_from(raw: RawEndpoint) -> Result<Self, Self::Error> {
        let url = Url::parse(&raw.url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "unsupported scheme in {}: expected http or https",
                raw.url
            )));
        }
        if url.host_str().is_none() {
            return Err(Error::Config(format!("missing host in {}", raw.url)));
        }

        let method = match raw.method {
            Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| Error::Config(format!("invalid HTTP method {m:?} for {url}")))?,
            None => Method::GET,
        };

        let mut headers = HeaderMap::with_capacity(raw.headers.len());
        for (key, value) in raw.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| Error::Config(format!("invalid header name {key:?} for {url}")))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|_| Error::Config(format!("invalid value for header {key} for {url}")))?;
            headers.insert(name, value);
        }

        Ok(Endpoint {
            name: raw.name,
            url,
            method,
            headers,
            body: raw.body,
        })
    }
}

impl Settings {
    /// Reads overrides from the environment (and `.env`), falling back to
    /// the defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but not an unsigned integer.
    pub fn from_env() -> Result<Settings, Error> {
        let defaults = Settings::default();
        Ok(Settings {
            interval: env_setting(INTERVAL_VAR)?
                .map_or(defaults.interval, Duration::from_secs),
            timeout: env_setting(TIMEOUT_VAR)?.map_or(defaults.timeout, Duration::from_secs),
            latency_threshold: env_setting(LATENCY_THRESHOLD_VAR)?
                .map_or(defaults.latency_threshold, Duration::from_millis),
        })
    }
}

fn env_setting(key: &str) -> Result<Option<u64>, Error> {
    match dotenvy::var(key) {
        Ok(raw) => parse_setting(key, &raw).map(Some),
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_setting(key: &str, raw: &str) -> Result<u64, Error> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be an unsigned integer, got {raw:?}")))
}
