// src/acquisition/mod.rs

//! Field Acquisition.
//!
//! Fetches a solar-wind magnetometer reading and a ground observatory
//! reading independently and merges whatever arrived into one
//! strength/direction pair.

pub mod http;
pub mod source;

pub use http::HttpFieldSource;
pub use source::{FieldSource, StaticFieldSource};

use crate::core::constants::field::{
    FALLBACK_DIRECTION, FALLBACK_STRENGTH, GROUND_WEIGHT, SPACE_WEIGHT,
};
use crate::core::{QmError, QmResult, Vec3};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Observatory queried when none is configured (Boulder).
pub const DEFAULT_OBSERVATORY: &str = "BOU";

/// A single magnetic measurement from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReading {
    /// Timestamp as reported by the source.
    pub timestamp: String,
    /// Field components in the source's frame (GSM for NOAA, XYZ for USGS).
    pub vector: Vec3,
    /// Scalar total field reported by the source (`bt` or `f`).
    pub magnitude: f64,
    /// Source tag, e.g. `NOAA SWPC` or `USGS BOU`.
    pub source: String,
}

impl FieldReading {
    pub fn new(timestamp: impl Into<String>, vector: Vec3, magnitude: f64, source: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            vector,
            magnitude,
            source: source.into(),
        }
    }
}

/// Readings that contributed to a combined field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSources {
    /// The NOAA SWPC solar-wind reading, when it was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_weather: Option<FieldReading>,
    /// The USGS observatory reading, when it was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geomagnetic: Option<FieldReading>,
}

/// Location attached to a substituted fallback field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
    /// Altitude as given in the request (default 400).
    pub altitude: f64,
}

/// The merged field of one acquisition cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedField {
    pub timestamp: String,
    /// Non-negative field strength.
    pub field_strength: f64,
    /// Unit direction vector.
    pub field_direction: Vec3,
    pub sources: FieldSources,
    /// Present only on the substituted fallback field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl CombinedField {
    /// The fixed field substituted when no source answered.
    pub fn fallback(location: Location) -> Self {
        Self {
            timestamp: now_rfc3339(),
            field_strength: FALLBACK_STRENGTH,
            field_direction: Vec3::from(FALLBACK_DIRECTION),
            sources: FieldSources::default(),
            location: Some(location),
        }
    }

    /// `direction · strength`
    pub fn field_vector(&self) -> Vec3 {
        self.field_direction * self.field_strength
    }
}

/// Inclusive date range for the ground observatory query (`%Y-%m-%d`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self { start: start.into(), end: end.into() }
    }

    /// Today's UTC date for both ends.
    pub fn today() -> Self {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        Self::new(today.clone(), today)
    }
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Merges the available readings.
///
/// * both present: `0.4·‖space‖ + 0.6·ground.magnitude`, direction is the
///   normalized weighted sum of the two normalized vectors;
/// * one present: that reading's magnitude, direction = vector / magnitude;
/// * none: `NoDataAvailable`.
///
/// # Errors
/// `DegenerateVector` when a vector needed for normalization is zero, a lone
/// reading's magnitude is not positive, or the combined strength is negative.
pub fn combine(space: Option<&FieldReading>, ground: Option<&FieldReading>) -> QmResult<CombinedField> {
    match (space, ground) {
        (Some(space), Some(ground)) => {
            let field_strength = space.vector.norm() * SPACE_WEIGHT + ground.magnitude * GROUND_WEIGHT;
            if !(field_strength.is_finite() && field_strength >= 0.0) {
                return Err(QmError::DegenerateVector {
                    message: format!("combined field strength {} is not a non-negative number", field_strength),
                });
            }
            let space_dir = space.vector.normalize()?;
            let ground_dir = ground.vector.normalize()?;
            let field_direction = (space_dir * SPACE_WEIGHT + ground_dir * GROUND_WEIGHT).normalize()?;
            Ok(CombinedField {
                timestamp: now_rfc3339(),
                field_strength,
                field_direction,
                sources: FieldSources {
                    space_weather: Some(space.clone()),
                    geomagnetic: Some(ground.clone()),
                },
                location: None,
            })
        }
        (Some(space), None) => Ok(CombinedField {
            timestamp: space.timestamp.clone(),
            field_strength: space.magnitude,
            field_direction: single_direction(space)?,
            sources: FieldSources { space_weather: Some(space.clone()), geomagnetic: None },
            location: None,
        }),
        (None, Some(ground)) => Ok(CombinedField {
            timestamp: ground.timestamp.clone(),
            field_strength: ground.magnitude,
            field_direction: single_direction(ground)?,
            sources: FieldSources { space_weather: None, geomagnetic: Some(ground.clone()) },
            location: None,
        }),
        (None, None) => Err(QmError::NoDataAvailable {
            message: "No magnetic field data available from any source".to_string(),
        }),
    }
}

/// `vector / magnitude` for a lone reading; the magnitude must be positive.
fn single_direction(reading: &FieldReading) -> QmResult<Vec3> {
    if !(reading.magnitude.is_finite() && reading.magnitude > 0.0) {
        return Err(QmError::DegenerateVector {
            message: format!("{} magnitude {} is not positive", reading.source, reading.magnitude),
        });
    }
    reading.vector.divide_by(reading.magnitude)
}

/// Fetches both readings from a [`FieldSource`] and combines them.
pub struct FieldAcquisition {
    source: Box<dyn FieldSource>,
    observatory: String,
    date_range: Option<DateRange>,
}

impl FieldAcquisition {
    pub fn new(source: Box<dyn FieldSource>, observatory: impl Into<String>) -> Self {
        Self {
            source,
            observatory: observatory.into(),
            date_range: None,
        }
    }

    /// Pins the observatory query to a fixed range instead of "today".
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Runs one acquisition cycle. A failing source is treated as absent;
    /// only the combination itself can fail.
    pub fn acquire(&self) -> QmResult<CombinedField> {
        let range = self.date_range.clone().unwrap_or_else(DateRange::today);
        let space = self.source.fetch_space_reading();
        let ground = self.source.fetch_ground_reading(&self.observatory, &range);

        match combine(space.as_ref(), ground.as_ref()) {
            Ok(field) => {
                info!(
                    strength = field.field_strength,
                    direction = %field.field_direction,
                    space = space.is_some(),
                    ground = ground.is_some(),
                    "combined magnetic field"
                );
                Ok(field)
            }
            Err(e) => {
                warn!("Error combining magnetic data: {}", e);
                Err(e)
            }
        }
    }
}
