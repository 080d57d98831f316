// src/selection/mod.rs

//! Configuration Selection.
//!
//! Maps a field strength/direction pair onto the two rotation angles of a
//! small fixed circuit, samples that circuit and turns the most frequent
//! label into a pair of field parameters.

pub mod sampler;

pub use sampler::{CircuitSampler, FixedCountsSampler, StateVectorSampler};

use crate::circuits::{Circuit, CircuitBuilder};
use crate::core::{PI, QmError, QmResult, QubitId, Vec3};
use crate::operations::Operation;
use crate::simulation::Counts;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Default register width.
pub const DEFAULT_NUM_QUBITS: usize = 4;
/// Default number of sampler trials.
pub const DEFAULT_SHOTS: u64 = 1000;

/// Target values submitted with an optimization request. They are recorded
/// with the run but do not influence which configuration is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetParams {
    pub target_strength: f64,
    pub target_direction: Vec3,
    pub precision_threshold: f64,
}

impl Default for TargetParams {
    fn default() -> Self {
        Self {
            target_strength: 0.5,
            target_direction: Vec3::UNIT_X,
            precision_threshold: 0.01,
        }
    }
}

/// Field parameters decoded from a configuration label.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldParameters {
    /// `100·s/(2^n − 1)`
    pub field_strength: f64,
    /// `s/(2^n − 1)`
    pub normalized_parameters: f64,
}

/// The selected configuration of one optimization call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfiguration {
    /// Winning label, `num_qubits` characters of `0`/`1`.
    pub optimal_state: String,
    /// Empirical frequency of the winning label, in [0, 1].
    pub probability: f64,
    pub field_parameters: FieldParameters,
}

impl FieldConfiguration {
    /// The all-zero configuration returned when sampling fails.
    pub fn fallback(num_qubits: usize) -> Self {
        Self {
            optimal_state: "0".repeat(num_qubits),
            probability: 0.0,
            field_parameters: FieldParameters::default(),
        }
    }
}

/// Maps a field onto the circuit angles.
///
/// `angle1 = strength·π`, `angle2 = atan2(d.y, d.x)` of the re-normalized
/// direction, with (1, 0, 0) standing in for a zero direction. Non-finite
/// inputs fall back to `(π/4, π/4)`.
pub fn field_angles(field_strength: f64, field_direction: Vec3) -> (f64, f64) {
    let direction = field_direction.normalize().unwrap_or(Vec3::UNIT_X);
    let angle1 = field_strength * PI;
    let angle2 = direction.y.atan2(direction.x);
    if angle1.is_finite() && angle2.is_finite() {
        (angle1, angle2)
    } else {
        warn!(field_strength, %field_direction, "non-finite field angles, using π/4 defaults");
        (PI / 4.0, PI / 4.0)
    }
}

/// Builds the depth-3 field configuration circuit: a Hadamard layer, per-qubit
/// `Rz(angle1)`/`Rx(angle2)` rotations, a CNOT chain `q[i] → q[i+1]`, then
/// measurement of every qubit.
pub fn magnetic_circuit(num_qubits: usize, angle1: f64, angle2: f64) -> QmResult<Circuit> {
    if num_qubits == 0 {
        return Err(QmError::InvalidOperation {
            message: "Field configuration circuit needs at least one qubit".to_string(),
        });
    }
    let qubits: Vec<QubitId> = (0..num_qubits as u64).map(QubitId).collect();

    let superposition = qubits.iter().map(|&target| Operation::Hadamard { target });
    let rotations = qubits.iter().flat_map(|&target| {
        [
            Operation::RotateZ { target, theta: angle1 },
            Operation::RotateX { target, theta: angle2 },
        ]
    });
    let entanglement = qubits
        .windows(2)
        .map(|pair| Operation::ControlledFlip { control: pair[0], target: pair[1] });

    Ok(CircuitBuilder::new()
        .add_ops(superposition)
        .add_ops(rotations)
        .add_ops(entanglement)
        .add_op(Operation::Measure { targets: qubits.clone() })
        .build())
}

/// Decodes a label as an unsigned integer `s` and scales it by `2^n − 1`.
///
/// # Errors
/// `SamplerFailure` if the label is not exactly `num_qubits` binary digits.
pub fn label_to_parameters(label: &str, num_qubits: usize) -> QmResult<FieldParameters> {
    let well_formed = num_qubits > 0
        && num_qubits < 64
        && label.len() == num_qubits
        && label.chars().all(|c| c == '0' || c == '1');
    if !well_formed {
        return Err(QmError::SamplerFailure {
            message: format!("label '{}' is not a {}-bit binary string", label, num_qubits),
        });
    }
    let state = u64::from_str_radix(label, 2).map_err(|e| QmError::SamplerFailure {
        message: format!("label '{}' could not be parsed: {}", label, e),
    })?;
    let max_state = ((1u64 << num_qubits) - 1) as f64;
    let normalized = state as f64 / max_state;
    Ok(FieldParameters {
        field_strength: normalized * 100.0,
        normalized_parameters: normalized,
    })
}

/// Picks the most frequent label.
///
/// Ties go to the label with the smallest integer value: labels are visited
/// in ascending enumeration order and only a strictly larger count replaces
/// the current winner.
pub fn select_configuration(counts: &Counts, num_qubits: usize) -> QmResult<FieldConfiguration> {
    let total: u64 = counts.values().sum();
    if total == 0 {
        return Err(QmError::SamplerFailure {
            message: "sampler returned no counts".to_string(),
        });
    }

    // Equal-width binary labels order lexicographically as integers do.
    let mut winner: Option<(&String, u64)> = None;
    for (label, &count) in counts {
        label_to_parameters(label, num_qubits)?;
        match winner {
            Some((_, best)) if count <= best => {}
            _ => winner = Some((label, count)),
        }
    }
    let (label, count) = winner.ok_or_else(|| QmError::SamplerFailure {
        message: "sampler returned no labels".to_string(),
    })?;

    Ok(FieldConfiguration {
        optimal_state: label.clone(),
        probability: count as f64 / total as f64,
        field_parameters: label_to_parameters(label, num_qubits)?,
    })
}

/// Runs configuration selection against an injected sampler.
pub struct FieldOptimizer {
    num_qubits: usize,
    shots: u64,
    sampler: Box<dyn CircuitSampler>,
}

impl FieldOptimizer {
    pub fn new(num_qubits: usize, shots: u64, sampler: Box<dyn CircuitSampler>) -> Self {
        Self { num_qubits, shots, sampler }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Selects the configuration for a field. Never fails: any sampler or
    /// decoding error yields [`FieldConfiguration::fallback`].
    pub fn select(&mut self, field_strength: f64, field_direction: Vec3, target: &TargetParams) -> FieldConfiguration {
        let (angle1, angle2) = field_angles(field_strength, field_direction);
        debug!(angle1, angle2, ?target, "mapped field onto circuit angles");

        let outcome = self
            .sampler
            .sample(angle1, angle2, self.num_qubits, self.shots)
            .and_then(|counts| {
                debug!(?counts, "sampler counts");
                select_configuration(&counts, self.num_qubits)
            });

        match outcome {
            Ok(configuration) => {
                info!(
                    state = %configuration.optimal_state,
                    probability = configuration.probability,
                    "selected field configuration"
                );
                configuration
            }
            Err(e) => {
                warn!("configuration selection failed, using zero configuration: {}", e);
                FieldConfiguration::fallback(self.num_qubits)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn counts(pairs: &[(&str, u64)]) -> Counts {
        pairs.iter().map(|(l, c)| (l.to_string(), *c)).collect()
    }

    #[test]
    fn test_half_strength_along_x_maps_to_half_pi_and_zero() {
        let (angle1, angle2) = field_angles(0.5, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(angle1, PI / 2.0);
        assert_eq!(angle2, 0.0);
    }

    #[test]
    fn test_zero_direction_defaults_to_x_axis() {
        let (_, angle2) = field_angles(1.0, Vec3::ZERO);
        assert_eq!(angle2, 0.0);
    }

    #[test]
    fn test_direction_is_renormalized() {
        let (_, angle2) = field_angles(1.0, Vec3::new(0.0, 5.0, 0.0));
        assert_abs_diff_eq!(angle2, PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_strength_uses_quarter_pi() {
        assert_eq!(field_angles(f64::NAN, Vec3::UNIT_X), (PI / 4.0, PI / 4.0));
    }

    #[test]
    fn test_label_extremes() {
        assert_eq!(
            label_to_parameters("0000", 4).unwrap(),
            FieldParameters { field_strength: 0.0, normalized_parameters: 0.0 }
        );
        assert_eq!(
            label_to_parameters("1111", 4).unwrap(),
            FieldParameters { field_strength: 100.0, normalized_parameters: 1.0 }
        );
    }

    #[test]
    fn test_label_midpoint() {
        let params = label_to_parameters("0101", 4).unwrap();
        assert_abs_diff_eq!(params.normalized_parameters, 5.0 / 15.0, epsilon = 1e-12);
        assert_abs_diff_eq!(params.field_strength, 500.0 / 15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_malformed_labels_are_rejected() {
        assert!(label_to_parameters("012", 3).is_err());
        assert!(label_to_parameters("01", 4).is_err());
    }

    #[test]
    fn test_most_frequent_label_wins() {
        let c = counts(&[("0001", 100), ("1010", 700), ("1111", 200)]);
        let configuration = select_configuration(&c, 4).unwrap();
        assert_eq!(configuration.optimal_state, "1010");
        assert_abs_diff_eq!(configuration.probability, 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(configuration.field_parameters.normalized_parameters, 10.0 / 15.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tie_goes_to_smallest_label() {
        let c = counts(&[("1100", 500), ("0011", 500)]);
        assert_eq!(select_configuration(&c, 4).unwrap().optimal_state, "0011");
    }

    #[test]
    fn test_empty_counts_fail() {
        assert!(select_configuration(&Counts::new(), 4).is_err());
    }

    #[test]
    fn test_circuit_layout() {
        let circuit = magnetic_circuit(4, 0.1, 0.2).unwrap();
        // 4 H + 8 rotations + 3 CNOT + 1 measure
        assert_eq!(circuit.len(), 16);
        assert_eq!(circuit.qubits().len(), 4);
        assert_eq!(circuit.measured_qubits().len(), 4);
    }

    #[test]
    fn test_optimizer_uses_stub_counts() {
        let sampler = FixedCountsSampler::from_pairs([("0110", 600), ("1001", 400)]);
        let mut optimizer = FieldOptimizer::new(4, 1000, Box::new(sampler));
        let configuration = optimizer.select(0.5, Vec3::UNIT_X, &TargetParams::default());
        assert_eq!(configuration.optimal_state, "0110");
        assert_abs_diff_eq!(configuration.probability, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_optimizer_falls_back_on_sampler_failure() {
        let mut optimizer = FieldOptimizer::new(4, 1000, Box::new(FixedCountsSampler::failing("boom")));
        let configuration = optimizer.select(0.5, Vec3::UNIT_X, &TargetParams::default());
        assert_eq!(configuration, FieldConfiguration::fallback(4));
        assert_eq!(configuration.optimal_state, "0000");
    }

    #[test]
    fn test_optimizer_falls_back_on_wrong_width_labels() {
        let sampler = FixedCountsSampler::from_pairs([("01", 10)]);
        let mut optimizer = FieldOptimizer::new(4, 10, Box::new(sampler));
        let configuration = optimizer.select(0.5, Vec3::UNIT_X, &TargetParams::default());
        assert_eq!(configuration, FieldConfiguration::fallback(4));
    }
}
