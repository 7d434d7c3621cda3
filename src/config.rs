use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::emitter::Sink;
use crate::predict::{GroundStation, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

const DEFAULT_MIN_ELEVATION_DEG: f64 = 10.0;
const DEFAULT_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("top-level YAML must be a mapping")]
    NotAMapping,
    #[error("coordinates out of range: lat {lat}, lon {lon}")]
    Coordinates { lat: f64, lon: f64 },
    #[error("satellites must be a non-empty mapping of NORAD id to tag")]
    NoSatellites,
    #[error("satellite ids must be positive integers; got {0}")]
    InvalidSatelliteId(String),
    #[error("tag for NORAD {0} must be a non-empty string")]
    InvalidTag(u32),
    #[error("outputs must be a non-empty list")]
    NoOutputs,
    #[error("invalid output {0:?}: {1}")]
    InvalidOutput(String, String),
    #[error("min_elevation_deg must be between 0 and 90 inclusive; got {0}")]
    MinElevation(f64),
    #[error("max_fetches_per_cycle must be at least 1")]
    FetchBudget,
    #[error("invalid {field}: {message}")]
    Duration {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub station: GroundStation,
    pub satellites: BTreeMap<u32, String>,
    pub outputs: Vec<Sink>,
    pub min_elevation_deg: f64,
    pub max_fetches_per_cycle: Option<usize>,
    pub period: Duration,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    lat: f64,
    lon: f64,
    satellites: serde_yaml::Mapping,
    outputs: Vec<String>,
    #[serde(default = "default_min_elevation")]
    min_elevation_deg: f64,
    #[serde(default)]
    max_fetches_per_cycle: Option<usize>,
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    api: RawApiConfig,
}

#[derive(Debug, Default, Deserialize)]
struct RawApiConfig {
    base_url: Option<String>,
    timeout: Option<String>,
}

fn default_min_elevation() -> f64 {
    DEFAULT_MIN_ELEVATION_DEG
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let root: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let root = match root {
            serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
            serde_yaml::Value::Mapping(_) => root,
            _ => return Err(ConfigError::NotAMapping),
        };
        let raw: RawConfig = serde_yaml::from_value(root)?;
        raw.validate()
    }

    pub fn satellite_ids(&self) -> Vec<u32> {
        self.satellites.keys().copied().collect()
    }
}

impl RawConfig {
    fn validate(self) -> Result<Config, ConfigError> {
        let station = GroundStation::new(self.lat, self.lon).ok_or(ConfigError::Coordinates {
            lat: self.lat,
            lon: self.lon,
        })?;

        if !(0.0..=90.0).contains(&self.min_elevation_deg) {
            return Err(ConfigError::MinElevation(self.min_elevation_deg));
        }

        if self.max_fetches_per_cycle == Some(0) {
            return Err(ConfigError::FetchBudget);
        }

        let satellites = parse_satellites(&self.satellites)?;

        if self.outputs.is_empty() {
            return Err(ConfigError::NoOutputs);
        }
        let outputs = self
            .outputs
            .iter()
            .map(|spec| {
                spec.parse::<Sink>()
                    .map_err(|e| ConfigError::InvalidOutput(spec.clone(), e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let period = match self.period {
            Some(s) => parse_duration("period", &s)?,
            None => DEFAULT_PERIOD,
        };

        let api = ApiConfig {
            base_url: self
                .api
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: match self.api.timeout {
                Some(s) => parse_duration("api.timeout", &s)?,
                None => DEFAULT_TIMEOUT,
            },
        };

        Ok(Config {
            station,
            satellites,
            outputs,
            min_elevation_deg: self.min_elevation_deg,
            max_fetches_per_cycle: self.max_fetches_per_cycle,
            period,
            api,
        })
    }
}

fn parse_satellites(mapping: &serde_yaml::Mapping) -> Result<BTreeMap<u32, String>, ConfigError> {
    if mapping.is_empty() {
        return Err(ConfigError::NoSatellites);
    }

    let mut satellites = BTreeMap::new();
    for (key, value) in mapping {
        let id = parse_satellite_id(key)?;
        let tag = value
            .as_str()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::InvalidTag(id))?;
        satellites.insert(id, tag.to_string());
    }
    Ok(satellites)
}

fn parse_satellite_id(key: &serde_yaml::Value) -> Result<u32, ConfigError> {
    let id = match key {
        serde_yaml::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_yaml::Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok()
        }
        _ => None,
    };
    id.filter(|id| *id > 0).ok_or_else(|| {
        ConfigError::InvalidSatelliteId(
            serde_yaml::to_string(key)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
        )
    })
}

fn parse_duration(field: &'static str, s: &str) -> Result<Duration, ConfigError> {
    let duration = humantime::parse_duration(s.trim()).map_err(|e| ConfigError::Duration {
        field,
        message: e.to_string(),
    })?;
    if duration.is_zero() {
        return Err(ConfigError::Duration {
            field,
            message: "must be greater than zero".into(),
        });
    }
    Ok(duration)
}
