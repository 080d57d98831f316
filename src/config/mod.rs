// src/config/mod.rs

//! Runtime configuration: defaults, an optional TOML file, then
//! `QMFIELD_*` environment overrides.

use crate::acquisition::DEFAULT_OBSERVATORY;
use crate::acquisition::http::{GEOMAG_URL, SPACE_WEATHER_URL};
use crate::core::{QmError, QmResult};
use crate::measurement::{DEFAULT_NOISE_LEVEL, DEFAULT_SENSITIVITY};
use crate::selection::{DEFAULT_NUM_QUBITS, DEFAULT_SHOTS};
use crate::simulation::engine::MAX_QUBITS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "QMFIELD_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub num_qubits: usize,
    pub shots: u64,
    pub sensitivity: f64,
    pub noise_level: f64,
    /// Seeds both the sampler and the sensor noise when set.
    pub seed: Option<u64>,
    pub observatory: String,
    pub space_weather_url: String,
    pub geomag_url: String,
    pub http_timeout_secs: u64,
    /// Skip the network and serve no readings (the fallback field is used).
    pub offline: bool,
    /// Substitute the fixed fallback field when acquisition fails.
    pub use_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_qubits: DEFAULT_NUM_QUBITS,
            shots: DEFAULT_SHOTS,
            sensitivity: DEFAULT_SENSITIVITY,
            noise_level: DEFAULT_NOISE_LEVEL,
            seed: None,
            observatory: DEFAULT_OBSERVATORY.to_string(),
            space_weather_url: SPACE_WEATHER_URL.to_string(),
            geomag_url: GEOMAG_URL.to_string(),
            http_timeout_secs: 10,
            offline: false,
            use_fallback: true,
        }
    }
}

impl Config {
    /// Parses a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> QmResult<Self> {
        toml::from_str(raw).map_err(|e| QmError::Config {
            message: format!("invalid configuration: {}", e),
        })
    }

    pub fn from_file(path: &Path) -> QmResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| QmError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> QmResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `QMFIELD_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> QmResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = get("NUM_QUBITS") {
            self.num_qubits = parse_value("NUM_QUBITS", &v)?;
        }
        if let Some(v) = get("SHOTS") {
            self.shots = parse_value("SHOTS", &v)?;
        }
        if let Some(v) = get("SENSITIVITY") {
            self.sensitivity = parse_value("SENSITIVITY", &v)?;
        }
        if let Some(v) = get("NOISE_LEVEL") {
            self.noise_level = parse_value("NOISE_LEVEL", &v)?;
        }
        if let Some(v) = get("SEED") {
            self.seed = Some(parse_value("SEED", &v)?);
        }
        if let Some(v) = get("OBSERVATORY") {
            self.observatory = v;
        }
        if let Some(v) = get("SPACE_WEATHER_URL") {
            self.space_weather_url = v;
        }
        if let Some(v) = get("GEOMAG_URL") {
            self.geomag_url = v;
        }
        if let Some(v) = get("HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = parse_value("HTTP_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("OFFLINE") {
            self.offline = parse_flag("OFFLINE", &v)?;
        }
        if let Some(v) = get("USE_FALLBACK") {
            self.use_fallback = parse_flag("USE_FALLBACK", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> QmResult<()> {
        let fail = |message: String| Err(QmError::Config { message });
        if self.num_qubits == 0 || self.num_qubits > MAX_QUBITS {
            return fail(format!("num_qubits must be in 1..={}, got {}", MAX_QUBITS, self.num_qubits));
        }
        if self.shots == 0 {
            return fail("shots must be positive".to_string());
        }
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return fail(format!("sensitivity must be finite and positive, got {}", self.sensitivity));
        }
        if !(self.noise_level.is_finite() && self.noise_level >= 0.0) {
            return fail(format!("noise_level must be finite and non-negative, got {}", self.noise_level));
        }
        if self.observatory.trim().is_empty() {
            return fail("observatory must not be empty".to_string());
        }
        if self.http_timeout_secs == 0 {
            return fail("http_timeout_secs must be positive".to_string());
        }
        Ok(())
    }
}

fn parse_value<T>(name: &str, raw: &str) -> QmResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| QmError::Config {
        message: format!("{}{}={:?}: {}", ENV_PREFIX, name, raw, e),
    })
}

fn parse_flag(name: &str, raw: &str) -> QmResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(QmError::Config {
            message: format!("{}{}={:?} is not a boolean", ENV_PREFIX, name, raw),
        }),
    }
}
