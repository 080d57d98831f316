// src/pipeline/mod.rs

//! Acquisition → Selection → Measurement → Aggregation, owned by one
//! explicitly constructed [`Pipeline`].

use crate::acquisition::{
    CombinedField, FieldAcquisition, FieldSource, HttpFieldSource, Location, StaticFieldSource, now_rfc3339,
};
use crate::config::Config;
use crate::core::{QmError, QmResult};
use crate::measurement::{MeasurementSystem, ParticleProperties, SeriesStatistics};
use crate::selection::{FieldConfiguration, FieldOptimizer, StateVectorSampler, TargetParams};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

/// Parameters of one pipeline run. Missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub target_params: TargetParams,
    pub particle_properties: ParticleProperties,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 400.0,
            target_params: TargetParams::default(),
            particle_properties: ParticleProperties::proton(),
        }
    }
}

impl PipelineParams {
    pub fn location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
        }
    }
}

/// The aggregate result object of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PipelineReport {
    Success {
        timestamp: String,
        field_data: CombinedField,
        optimized_configuration: FieldConfiguration,
        /// `None` when the measurement stage failed.
        measurements: Option<SeriesStatistics>,
    },
    Error {
        timestamp: String,
        error: String,
    },
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineReport::Success { .. })
    }
}

pub struct Pipeline {
    acquisition: FieldAcquisition,
    optimizer: FieldOptimizer,
    measurement: MeasurementSystem,
    use_fallback: bool,
}

impl Pipeline {
    pub fn new(acquisition: FieldAcquisition, optimizer: FieldOptimizer, measurement: MeasurementSystem) -> Self {
        info!("Initialized magnetic field pipeline");
        Self {
            acquisition,
            optimizer,
            measurement,
            use_fallback: true,
        }
    }

    /// Controls whether a failed acquisition is replaced by the fixed fallback field.
    pub fn with_fallback(mut self, use_fallback: bool) -> Self {
        self.use_fallback = use_fallback;
        self
    }

    /// Wires the HTTP (or, offline, an empty) field source, the state-vector
    /// sampler and the measurement system from `config`.
    pub fn from_config(config: &Config) -> QmResult<Self> {
        config.validate()?;
        let source: Box<dyn FieldSource> = if config.offline {
            Box::new(StaticFieldSource::empty())
        } else {
            Box::new(HttpFieldSource::new(
                config.space_weather_url.clone(),
                config.geomag_url.clone(),
                Duration::from_secs(config.http_timeout_secs),
            ))
        };
        let acquisition = FieldAcquisition::new(source, config.observatory.clone());

        let (sampler, measurement) = match config.seed {
            Some(seed) => (
                StateVectorSampler::with_seed(seed),
                MeasurementSystem::with_seed(config.sensitivity, config.noise_level, seed.wrapping_add(1))?,
            ),
            None => (
                StateVectorSampler::new(),
                MeasurementSystem::new(config.sensitivity, config.noise_level)?,
            ),
        };
        let optimizer = FieldOptimizer::new(config.num_qubits, config.shots, Box::new(sampler));

        Ok(Self::new(acquisition, optimizer, measurement).with_fallback(config.use_fallback))
    }

    pub fn measurement_system(&self) -> &MeasurementSystem {
        &self.measurement
    }

    /// Acquires the field, substituting the fallback reading when enabled.
    pub fn fetch_field_data(&self, location: Location) -> QmResult<CombinedField> {
        match self.acquisition.acquire() {
            Ok(field) => Ok(field),
            Err(e) if self.use_fallback => {
                info!("Using simulated magnetic field data ({})", e);
                Ok(CombinedField::fallback(location))
            }
            Err(e) => Err(QmError::PipelineFailure {
                message: format!("Failed to fetch magnetic field data: {}", e),
            }),
        }
    }

    pub fn optimize_magnetic_field(&mut self, field: &CombinedField, target: &TargetParams) -> FieldConfiguration {
        self.optimizer
            .select(field.field_strength, field.field_direction, target)
    }

    /// Calibrates against the field vector, measures once and aggregates the
    /// whole series. A failed measurement degrades to `None`.
    pub fn measure_particle_interactions(
        &mut self,
        field: &CombinedField,
        particle: &ParticleProperties,
    ) -> Option<SeriesStatistics> {
        let field_vector = field.field_vector();
        let outcome = self
            .measurement
            .calibrate(field_vector)
            .and_then(|_| self.measurement.measure(field_vector, particle));
        match outcome {
            Ok(_) => {
                info!(series_len = self.measurement.series().len(), "Successfully completed particle measurements");
                self.measurement.analyze()
            }
            Err(e) => {
                warn!("Error measuring particle interactions: {}", e);
                None
            }
        }
    }

    /// Runs all stages. Never panics on stage failures: an escalated error
    /// becomes a report with status `"error"`.
    pub fn run(&mut self, params: Option<PipelineParams>) -> PipelineReport {
        let params = params.unwrap_or_default();
        match self.try_run(&params) {
            Ok(report) => report,
            Err(e) => {
                error!("Pipeline error: {}", e);
                PipelineReport::Error {
                    timestamp: now_rfc3339(),
                    error: e.to_string(),
                }
            }
        }
    }

    fn try_run(&mut self, params: &PipelineParams) -> QmResult<PipelineReport> {
        let field_data = self.fetch_field_data(params.location())?;
        let optimized_configuration = self.optimize_magnetic_field(&field_data, &params.target_params);
        let measurements = self.measure_particle_interactions(&field_data, &params.particle_properties);
        Ok(PipelineReport::Success {
            timestamp: now_rfc3339(),
            field_data,
            optimized_configuration,
            measurements,
        })
    }
}
