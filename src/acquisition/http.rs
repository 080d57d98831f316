// src/acquisition/http.rs

//! HTTP field source backed by the NOAA SWPC real-time solar wind feed and
//! the USGS geomagnetism web service.

use super::{DateRange, FieldReading, FieldSource};
use crate::core::{QmError, QmResult, Vec3};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error};

/// NOAA SWPC one-minute real-time solar wind magnetometer feed.
pub const SPACE_WEATHER_URL: &str = "https://services.swpc.noaa.gov/json/rtsw/rtsw_mag_1m.json";
/// USGS geomagnetism data service root.
pub const GEOMAG_URL: &str = "https://geomag.usgs.gov/ws/data/";

const SPACE_SOURCE: &str = "NOAA SWPC";

/// Field source performing one blocking GET per reading. No retries.
pub struct HttpFieldSource {
    agent: ureq::Agent,
    space_weather_url: String,
    geomag_url: String,
}

impl HttpFieldSource {
    pub fn new(space_weather_url: impl Into<String>, geomag_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            space_weather_url: space_weather_url.into(),
            geomag_url: geomag_url.into(),
        }
    }

    fn get_json(&self, request: ureq::Request, source_name: &str) -> QmResult<Value> {
        let response = request.call().map_err(|e| QmError::Fetch {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        response.into_json::<Value>().map_err(|e| QmError::Fetch {
            source_name: source_name.to_string(),
            message: format!("invalid JSON body: {}", e),
        })
    }

    fn try_space_reading(&self) -> QmResult<FieldReading> {
        let body = self.get_json(self.agent.get(&self.space_weather_url), SPACE_SOURCE)?;
        parse_space_weather(&body)
    }

    fn try_ground_reading(&self, observatory: &str, range: &DateRange) -> QmResult<FieldReading> {
        let url = format!("{}/{}/", self.geomag_url.trim_end_matches('/'), observatory);
        let request = self
            .agent
            .get(&url)
            .query("id", observatory)
            .query("starttime", &range.start)
            .query("endtime", &range.end)
            .query("elements", "X,Y,Z,F")
            .query("format", "json");
        let body = self.get_json(request, &ground_source(observatory))?;
        parse_geomagnetic(&body, observatory)
    }
}

impl Default for HttpFieldSource {
    fn default() -> Self {
        Self::new(SPACE_WEATHER_URL, GEOMAG_URL, Duration::from_secs(10))
    }
}

impl FieldSource for HttpFieldSource {
    fn fetch_space_reading(&self) -> Option<FieldReading> {
        match self.try_space_reading() {
            Ok(reading) => {
                debug!(?reading, "space weather reading");
                Some(reading)
            }
            Err(e) => {
                error!("Error fetching space weather data: {}", e);
                None
            }
        }
    }

    fn fetch_ground_reading(&self, observatory: &str, range: &DateRange) -> Option<FieldReading> {
        match self.try_ground_reading(observatory, range) {
            Ok(reading) => {
                debug!(?reading, "geomagnetic reading");
                Some(reading)
            }
            Err(e) => {
                error!("Error fetching geomagnetic data: {}", e);
                None
            }
        }
    }
}

fn ground_source(observatory: &str) -> String {
    format!("USGS {}", observatory)
}

fn parse_error(source_name: &str, message: impl Into<String>) -> QmError {
    QmError::Fetch {
        source_name: source_name.to_string(),
        message: message.into(),
    }
}

/// Reads a numeric field. A missing key reads as 0.0; null, non-numeric or
/// non-finite values are rejected. Numeric strings are accepted.
fn number_field(record: &Map<String, Value>, key: &str, source_name: &str) -> QmResult<f64> {
    let value = match record.get(key) {
        None => return Ok(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(parse_error(source_name, format!("field '{}' is not a finite number", key))),
    }
}

fn text_field(record: &Map<String, Value>, key: &str) -> String {
    record.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Parses the NOAA SWPC feed: a JSON array whose last record holds
/// `time_tag`, `bx_gsm`, `by_gsm`, `bz_gsm` and `bt`.
pub fn parse_space_weather(body: &Value) -> QmResult<FieldReading> {
    let latest = body
        .as_array()
        .and_then(|records| records.last())
        .ok_or_else(|| parse_error(SPACE_SOURCE, "No space weather data available"))?;
    let record = latest
        .as_object()
        .ok_or_else(|| parse_error(SPACE_SOURCE, "latest record is not an object"))?;

    let vector = Vec3::new(
        number_field(record, "bx_gsm", SPACE_SOURCE)?,
        number_field(record, "by_gsm", SPACE_SOURCE)?,
        number_field(record, "bz_gsm", SPACE_SOURCE)?,
    );
    let magnitude = number_field(record, "bt", SPACE_SOURCE)?;
    Ok(FieldReading::new(text_field(record, "time_tag"), vector, magnitude, SPACE_SOURCE))
}

/// Parses a USGS geomagnetism response.
///
/// Two layouts are understood, both using the latest sample:
/// * records: `{"values": [{"time", "x", "y", "z", "f"}, ...]}`
/// * time series: `{"times": [...], "values": [{"id": "X", "values": [...]}, ...]}`
pub fn parse_geomagnetic(body: &Value, observatory: &str) -> QmResult<FieldReading> {
    let source_name = ground_source(observatory);
    let values = body
        .get("values")
        .and_then(Value::as_array)
        .filter(|values| !values.is_empty())
        .ok_or_else(|| parse_error(&source_name, "No geomagnetic data available"))?;

    let is_series = values
        .first()
        .and_then(|v| v.get("values"))
        .is_some_and(Value::is_array);

    if is_series {
        parse_geomagnetic_series(body, values, source_name)
    } else {
        let record = values
            .last()
            .and_then(Value::as_object)
            .ok_or_else(|| parse_error(&source_name, "latest record is not an object"))?;
        let vector = Vec3::new(
            number_field(record, "x", &source_name)?,
            number_field(record, "y", &source_name)?,
            number_field(record, "z", &source_name)?,
        );
        let magnitude = number_field(record, "f", &source_name)?;
        Ok(FieldReading::new(text_field(record, "time"), vector, magnitude, source_name))
    }
}

fn parse_geomagnetic_series(body: &Value, series: &[Value], source_name: String) -> QmResult<FieldReading> {
    let times = body.get("times").and_then(Value::as_array);
    let latest_index = match times {
        Some(times) if !times.is_empty() => times.len() - 1,
        _ => series
            .iter()
            .filter_map(|s| s.get("values").and_then(Value::as_array).map(Vec::len))
            .max()
            .and_then(|len| len.checked_sub(1))
            .ok_or_else(|| parse_error(&source_name, "No geomagnetic data available"))?,
    };
    let timestamp = times
        .and_then(|t| t.get(latest_index))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // Element id -> latest sample, reusing the record parser's number rules.
    let mut latest = Map::new();
    for element in series {
        let id = element
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_ascii_lowercase);
        let sample = element
            .get("values")
            .and_then(Value::as_array)
            .and_then(|v| v.get(latest_index));
        if let (Some(id), Some(sample)) = (id, sample) {
            latest.insert(id, sample.clone());
        }
    }

    let vector = Vec3::new(
        number_field(&latest, "x", &source_name)?,
        number_field(&latest, "y", &source_name)?,
        number_field(&latest, "z", &source_name)?,
    );
    let magnitude = number_field(&latest, "f", &source_name)?;
    Ok(FieldReading::new(timestamp, vector, magnitude, source_name))
}
