// src/measurement/mod.rs

//! Synthetic particle measurement and series aggregation.
//!
//! Closed-form formulas with injected Gaussian noise produce a particle
//! position, momentum, spin and interaction strength for an applied field.
//! Two of the formulas are degenerate and are kept verbatim:
//! * the momentum "quantum term" `ħ/(ħ/(m·|v|))` reduces to `m·|v|`;
//! * the interaction strength is 1.0 for every non-zero field.

mod series;

pub use series::{MeasurementSeries, SeriesStatistics, aggregate};

use crate::core::constants::physics::MAGNITUDE_FLOOR;
use crate::core::{BOHR_MAGNETON, HBAR, QmError, QmResult, Vec3};
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default detector sensitivity.
pub const DEFAULT_SENSITIVITY: f64 = 0.001;
/// Default per-axis sensor noise σ.
pub const DEFAULT_NOISE_LEVEL: f64 = 0.01;
/// σ of the momentum quantum term noise.
const MOMENTUM_NOISE: f64 = 0.1;
/// Numerator of the position uncertainty σ (`1e-34 / mass`).
const POSITION_UNCERTAINTY: f64 = 1e-34;

/// Properties of the particle being measured. Missing fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleProperties {
    /// Mass [kg], default 1.0.
    pub mass: f64,
    /// Charge [C], default 1.0.
    pub charge: f64,
    /// Gyromagnetic g-factor, default 2.0.
    pub g_factor: f64,
    /// Velocity [m/s], default (0, 0, 0).
    pub velocity: Vec3,
}

impl Default for ParticleProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            charge: 1.0,
            g_factor: 2.0,
            velocity: Vec3::ZERO,
        }
    }
}

impl ParticleProperties {
    /// A proton moving at 100 km/s along x.
    pub fn proton() -> Self {
        Self {
            mass: 1.672_621_92e-27,
            charge: 1.602_176_63e-19,
            g_factor: 5.585_694_713,
            velocity: Vec3::new(1e5, 0.0, 0.0),
        }
    }

    fn validate(&self) -> QmResult<()> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(QmError::InvalidParticle {
                message: format!("mass must be finite and positive, got {}", self.mass),
            });
        }
        if !self.charge.is_finite() || self.charge == 0.0 {
            return Err(QmError::InvalidParticle {
                message: format!("charge must be finite and non-zero, got {}", self.charge),
            });
        }
        if !self.g_factor.is_finite() || !self.velocity.is_finite() {
            return Err(QmError::InvalidParticle {
                message: "g-factor and velocity must be finite".to_string(),
            });
        }
        Ok(())
    }
}

/// One synthetic measurement. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleMeasurement {
    pub position: Vec3,
    pub momentum: Vec3,
    /// Only the z component is populated.
    pub spin: Vec3,
    /// In [0, 1].
    pub interaction_strength: f64,
    /// Seconds since the Unix epoch, non-decreasing within one system.
    pub timestamp: f64,
}

/// Detector model owning the calibration factor and the measurement series.
///
/// The series is append-only and owned by this instance; concurrent callers
/// must use one system each or serialize access.
pub struct MeasurementSystem {
    sensitivity: f64,
    noise_level: f64,
    calibration_factor: f64,
    series: MeasurementSeries,
    rng: StdRng,
}

impl MeasurementSystem {
    /// Creates a system with a randomly seeded noise generator.
    ///
    /// # Errors
    /// `Config` for a non-finite `sensitivity` or a negative/non-finite `noise_level`.
    pub fn new(sensitivity: f64, noise_level: f64) -> QmResult<Self> {
        Self::with_seed(sensitivity, noise_level, rand::random())
    }

    /// Creates a system whose noise sequence is reproducible.
    pub fn with_seed(sensitivity: f64, noise_level: f64, seed: u64) -> QmResult<Self> {
        if !sensitivity.is_finite() {
            return Err(QmError::Config {
                message: format!("sensitivity must be finite, got {}", sensitivity),
            });
        }
        if !(noise_level.is_finite() && noise_level >= 0.0) {
            return Err(QmError::Config {
                message: format!("noise level must be finite and non-negative, got {}", noise_level),
            });
        }
        Ok(Self {
            sensitivity,
            noise_level,
            calibration_factor: 1.0,
            series: MeasurementSeries::new(),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn calibration_factor(&self) -> f64 {
        self.calibration_factor
    }

    pub fn series(&self) -> &MeasurementSeries {
        &self.series
    }

    /// Statistics over every measurement taken so far.
    pub fn analyze(&self) -> Option<SeriesStatistics> {
        aggregate(&self.series)
    }

    /// Calibrates against a known reference field:
    /// `‖reference‖ / max(‖simulate_response(reference)‖, 1e-10)`.
    ///
    /// The response already carries the current factor, so calibrating
    /// repeatedly against the same reference alternates between two values
    /// (1000, then 1, then 1000 for the default sensitivity without noise).
    pub fn calibrate(&mut self, reference: Vec3) -> QmResult<f64> {
        if !reference.is_finite() {
            return Err(QmError::DegenerateVector {
                message: format!("reference field {} is not finite", reference),
            });
        }
        let response = self.simulate_response(reference)?;
        self.calibration_factor = reference.norm() / response.norm().max(MAGNITUDE_FLOOR);
        debug!(factor = self.calibration_factor, "sensors calibrated");
        Ok(self.calibration_factor)
    }

    /// `(field·sensitivity + N(0, noise) per axis) · calibration`
    pub fn simulate_response(&mut self, field: Vec3) -> QmResult<Vec3> {
        let noise = self.gaussian(0.0, self.noise_level)?;
        Ok((field * self.sensitivity + noise) * self.calibration_factor)
    }

    /// Takes one measurement and appends it to the series.
    ///
    /// # Errors
    /// `DegenerateVector` for a non-finite field, `InvalidParticle` for a
    /// non-positive mass or a zero charge. Nothing is appended on error.
    pub fn measure(&mut self, field: Vec3, particle: &ParticleProperties) -> QmResult<ParticleMeasurement> {
        if !field.is_finite() {
            return Err(QmError::DegenerateVector {
                message: format!("applied field {} is not finite", field),
            });
        }
        particle.validate()?;

        let response = self.simulate_response(field)?;
        let position = self.position(response, particle)?;
        let momentum = self.momentum(particle)?;
        let spin = spin(field, particle);
        let interaction_strength = interaction_strength(field, particle);

        let now = Utc::now();
        let mut timestamp = now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) * 1e-6;
        if let Some(last) = self.series.last() {
            timestamp = timestamp.max(last.timestamp);
        }

        let measurement = ParticleMeasurement {
            position,
            momentum,
            spin,
            interaction_strength,
            timestamp,
        };
        self.series.push(measurement.clone());
        Ok(measurement)
    }

    /// `response·(mass/charge) + N(0, 1e-34/mass)` per axis.
    fn position(&mut self, response: Vec3, particle: &ParticleProperties) -> QmResult<Vec3> {
        let uncertainty = self.gaussian(0.0, POSITION_UNCERTAINTY / particle.mass)?;
        Ok(response * (particle.mass / particle.charge) + uncertainty)
    }

    /// `mass·velocity + (ħ/λ)·N(0, 0.1)` with `λ = ħ/(mass·max(|v|, 1e-10))`.
    fn momentum(&mut self, particle: &ParticleProperties) -> QmResult<Vec3> {
        let classical = particle.velocity * particle.mass;
        let wavelength = HBAR / (particle.mass * particle.velocity.norm().max(MAGNITUDE_FLOOR));
        let quantum = HBAR / wavelength;
        let noise = self.gaussian(0.0, MOMENTUM_NOISE)?;
        Ok(classical + noise * quantum)
    }

    /// Three independent draws from `N(mean, std_dev)`.
    fn gaussian(&mut self, mean: f64, std_dev: f64) -> QmResult<Vec3> {
        let normal = Normal::new(mean, std_dev).map_err(|e| QmError::InvalidParticle {
            message: format!("invalid noise distribution N({}, {}): {}", mean, std_dev, e),
        })?;
        Ok(Vec3::new(
            normal.sample(&mut self.rng),
            normal.sample(&mut self.rng),
            normal.sample(&mut self.rng),
        ))
    }
}

/// `(0, 0, 0.5·g·μ_B·‖B‖)`
pub fn spin(field: Vec3, particle: &ParticleProperties) -> Vec3 {
    Vec3::new(0.0, 0.0, 0.5 * particle.g_factor * BOHR_MAGNETON * field.norm())
}

/// `|−g·μ_B·‖B‖| / (g·μ_B·max(‖B‖, 1e-10))`, clamped to [0, 1].
///
/// Evaluates to exactly 1.0 for any non-zero field and to 0.0 for a zero
/// field or a zero magnetic moment.
pub fn interaction_strength(field: Vec3, particle: &ParticleProperties) -> f64 {
    let magnetic_moment = particle.g_factor * BOHR_MAGNETON;
    let magnitude = field.norm();
    let max_energy = magnetic_moment * magnitude.max(MAGNITUDE_FLOOR);
    if max_energy == 0.0 || !max_energy.is_finite() {
        return 0.0;
    }
    let interaction_energy = -magnetic_moment * magnitude;
    (interaction_energy / max_energy).abs().clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_noise_free_calibration_factor() {
        let mut system = MeasurementSystem::with_seed(0.001, 0.0, 1).unwrap();
        let factor = system.calibrate(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(factor, 1000.0);
        assert_eq!(system.calibration_factor(), 1000.0);
    }

    #[test]
    fn test_recalibration_alternates_without_noise() {
        let mut system = MeasurementSystem::with_seed(0.001, 0.0, 1).unwrap();
        let reference = Vec3::new(1.0, 0.0, 0.0);
        let first = system.calibrate(reference).unwrap();
        let second = system.calibrate(reference).unwrap();
        let third = system.calibrate(reference).unwrap();
        assert_eq!(first, 1000.0);
        assert_relative_eq!(second, 1.0, max_relative = 1e-12);
        assert_relative_eq!(third, 1000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_calibrated_response_recovers_field_without_noise() {
        let mut system = MeasurementSystem::with_seed(0.001, 0.0, 1).unwrap();
        let field = Vec3::new(2.0, -1.0, 0.5);
        system.calibrate(field).unwrap();
        let response = system.simulate_response(field).unwrap();
        assert_relative_eq!(response.x, field.x, max_relative = 1e-12);
        assert_relative_eq!(response.y, field.y, max_relative = 1e-12);
        assert_relative_eq!(response.z, field.z, max_relative = 1e-12);
    }

    #[test]
    fn test_interaction_strength_is_one_for_nonzero_field() {
        let particle = ParticleProperties::proton();
        for field in [Vec3::new(1e-9, 0.0, 0.0), Vec3::new(45.7, 3.0, -2.0), Vec3::new(0.0, 0.0, 5e4)] {
            assert_eq!(interaction_strength(field, &particle), 1.0);
        }
    }

    #[test]
    fn test_interaction_strength_is_guarded_for_zero_field() {
        assert_eq!(interaction_strength(Vec3::ZERO, &ParticleProperties::default()), 0.0);
        let no_moment = ParticleProperties { g_factor: 0.0, ..ParticleProperties::default() };
        assert_eq!(interaction_strength(Vec3::UNIT_X, &no_moment), 0.0);
    }

    #[test]
    fn test_spin_has_only_z_component() {
        let s = spin(Vec3::new(3.0, 4.0, 0.0), &ParticleProperties::default());
        assert_eq!(s.x, 0.0);
        assert_eq!(s.y, 0.0);
        assert_relative_eq!(s.z, 0.5 * 2.0 * BOHR_MAGNETON * 5.0, max_relative = 1e-12);
    }

    #[test]
    fn test_measure_appends_and_timestamps_do_not_decrease() {
        let mut system = MeasurementSystem::with_seed(0.001, 0.01, 9).unwrap();
        let particle = ParticleProperties::proton();
        let field = Vec3::new(32.3, 0.0, 32.3);
        system.calibrate(field).unwrap();
        let first = system.measure(field, &particle).unwrap();
        let second = system.measure(field, &particle).unwrap();
        assert_eq!(system.series().len(), 2);
        assert!(second.timestamp >= first.timestamp);
        assert_eq!(first.interaction_strength, 1.0);
    }

    #[test]
    fn test_position_and_momentum_follow_the_seeded_draws() {
        let seed = 21;
        let (sensitivity, noise_level) = (0.002, 0.05);
        let particle = ParticleProperties {
            mass: 3.0,
            charge: 0.5,
            g_factor: 2.0,
            velocity: Vec3::new(1.0, -2.0, 2.0),
        };
        let field = Vec3::new(10.0, -4.0, 7.5);
        let mut system = MeasurementSystem::with_seed(sensitivity, noise_level, seed).unwrap();
        let measured = system.measure(field, &particle).unwrap();

        // Same generator, same draw order: response, position, momentum.
        let mut rng = StdRng::seed_from_u64(seed);
        let mut draw = |std_dev: f64| {
            let normal = Normal::new(0.0, std_dev).unwrap();
            Vec3::new(normal.sample(&mut rng), normal.sample(&mut rng), normal.sample(&mut rng))
        };
        let response = (field * sensitivity + draw(noise_level)) * 1.0;
        let position = response * (particle.mass / particle.charge) + draw(1e-34 / particle.mass);
        let quantum = HBAR / (HBAR / (particle.mass * particle.velocity.norm()));
        let momentum = particle.velocity * particle.mass + draw(0.1) * quantum;

        assert_eq!(measured.position, position);
        assert_eq!(measured.momentum, momentum);
    }

    #[test]
    fn test_noise_free_position_scales_by_mass_over_charge() {
        let mut system = MeasurementSystem::with_seed(0.001, 0.0, 4).unwrap();
        let particle = ParticleProperties { mass: 4.0, charge: 2.0, ..Default::default() };
        let m = system.measure(Vec3::new(1.0, 2.0, 3.0), &particle).unwrap();
        // 1e-34/mass position noise is far below the tolerance.
        assert_relative_eq!(m.position.x, 0.002, max_relative = 1e-12);
        assert_relative_eq!(m.position.y, 0.004, max_relative = 1e-12);
        assert_relative_eq!(m.position.z, 0.006, max_relative = 1e-12);
    }

    #[test]
    fn test_invalid_particles_are_rejected_without_appending() {
        let mut system = MeasurementSystem::with_seed(0.001, 0.01, 2).unwrap();
        let zero_charge = ParticleProperties { charge: 0.0, ..Default::default() };
        let negative_mass = ParticleProperties { mass: -1.0, ..Default::default() };
        assert!(matches!(system.measure(Vec3::UNIT_X, &zero_charge), Err(QmError::InvalidParticle { .. })));
        assert!(matches!(system.measure(Vec3::UNIT_X, &negative_mass), Err(QmError::InvalidParticle { .. })));
        assert!(matches!(
            system.measure(Vec3::new(f64::INFINITY, 0.0, 0.0), &ParticleProperties::default()),
            Err(QmError::DegenerateVector { .. })
        ));
        assert!(system.series().is_empty());
    }

    #[test]
    fn test_negative_noise_is_rejected() {
        assert!(MeasurementSystem::with_seed(0.001, -0.5, 0).is_err());
    }

    #[test]
    fn test_particle_properties_defaults_fill_missing_fields() {
        let particle: ParticleProperties = serde_json::from_str(r#"{"mass": 4.0}"#).unwrap();
        assert_eq!(particle.mass, 4.0);
        assert_eq!(particle.charge, 1.0);
        assert_eq!(particle.g_factor, 2.0);
        assert_eq!(particle.velocity, Vec3::ZERO);
    }
}
