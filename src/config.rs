use crate::error::ConfigError;
use reqwest::Url;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://192.168.1.195:5000";

pub const CONFIG_PATH_ENV: &str = "TELEMETRY_CONFIG";
pub const BASE_URL_ENV: &str = "TELEMETRY_BASE_URL";
pub const TIMEOUT_ENV: &str = "TELEMETRY_TIMEOUT_SECS";

// Relative so a base URL path prefix is kept
const DEVICES_PATH: &str = "api/devices";
const PING_PATH: &str = "api/ping";

/// Where the scanning service lives and how long a request may take.
///
/// `request_timeout` of `None` leaves deadlines to the HTTP transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    base_url: Url,
    devices_url: Url,
    ping_url: Url,
    request_timeout: Option<Duration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    request_timeout_secs: Option<f64>,
}

impl TelemetryConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };

        let mut base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(invalid(format!("unsupported scheme {:?}", base.scheme())));
        }
        if base.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let devices_url = base.join(DEVICES_PATH).map_err(|e| invalid(e.to_string()))?;
        let ping_url = base.join(PING_PATH).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            base_url: base,
            devices_url,
            ping_url,
            request_timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Defaults, then the TOML file named by `TELEMETRY_CONFIG`, then
    /// `TELEMETRY_BASE_URL` / `TELEMETRY_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let file = match lookup(CONFIG_PATH_ENV) {
            Some(path) => read_file_config(Path::new(&path))?,
            None => FileConfig::default(),
        };

        let base_url = lookup(BASE_URL_ENV)
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url)?;

        let timeout = match lookup(TIMEOUT_ENV) {
            Some(raw) => Some(parse_timeout(&raw)?),
            None => file
                .request_timeout_secs
                .map(|secs| timeout_from_secs(secs, &secs.to_string()))
                .transpose()?,
        };
        if let Some(timeout) = timeout {
            config = config.with_timeout(timeout);
        }

        Ok(config)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn devices_url(&self) -> &Url {
        &self.devices_url
    }

    pub fn ping_url(&self) -> &Url {
        &self.ping_url
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidTimeout(raw.to_string()))?;
    timeout_from_secs(secs, raw)
}

fn timeout_from_secs(secs: f64, raw: &str) -> Result<Duration, ConfigError> {
    if secs.is_nan() || secs <= 0.0 {
        return Err(ConfigError::InvalidTimeout(raw.to_string()));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidTimeout(raw.to_string()))
}
