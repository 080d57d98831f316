// src/acquisition/source.rs

use super::{DateRange, FieldReading};

/// Provider of the two independent field readings.
///
/// Implementations swallow their own transport and parse failures: an
/// unavailable reading is `None`, never an error.
pub trait FieldSource {
    /// Latest solar-wind magnetometer reading.
    fn fetch_space_reading(&self) -> Option<FieldReading>;

    /// Latest reading of a ground observatory within `range`.
    fn fetch_ground_reading(&self, observatory: &str, range: &DateRange) -> Option<FieldReading>;
}

/// Serves preset readings. Used for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticFieldSource {
    space: Option<FieldReading>,
    ground: Option<FieldReading>,
}

impl StaticFieldSource {
    pub fn new(space: Option<FieldReading>, ground: Option<FieldReading>) -> Self {
        Self { space, ground }
    }

    /// A source that never has data.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl FieldSource for StaticFieldSource {
    fn fetch_space_reading(&self) -> Option<FieldReading> {
        self.space.clone()
    }

    fn fetch_ground_reading(&self, _observatory: &str, _range: &DateRange) -> Option<FieldReading> {
        self.ground.clone()
    }
}
