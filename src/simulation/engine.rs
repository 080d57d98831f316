// src/simulation/engine.rs
use crate::core::{QmError, QmResult, QubitId, StateVector};
use crate::operations::Operation;
use num_complex::Complex;
use num_traits::Zero; // For Complex::zero()
use std::collections::{BTreeSet, HashMap};

/// Largest register the engine will allocate (2^24 amplitudes).
pub(crate) const MAX_QUBITS: usize = 24;

/// Tolerance for the normalization check performed after a run.
const NORM_TOLERANCE: f64 = 1e-9;

/// Dense state-vector engine evolving an `n`-qubit register.
/// (Internal visibility)
pub(crate) struct SimulationEngine {
    /// Maps qubit IDs to their register index (0..n-1). Index `i` is stored
    /// in bit `i` of the basis state index.
    qubit_indices: HashMap<QubitId, usize>,
    /// The 2^n amplitude vector.
    state: StateVector,
    num_qubits: usize,
}

impl SimulationEngine {
    /// Initializes the engine in |0...0> for the given sorted qubit set.
    pub(crate) fn init(qubits: &BTreeSet<QubitId>) -> QmResult<Self> {
        if qubits.is_empty() {
            return Err(QmError::InvalidOperation {
                message: "Cannot initialize simulation engine with zero qubits".to_string(),
            });
        }
        let num_qubits = qubits.len();
        if num_qubits > MAX_QUBITS {
            return Err(QmError::SimulationError {
                message: format!(
                    "{} qubits requested, the engine supports at most {}",
                    num_qubits, MAX_QUBITS
                ),
            });
        }
        let dim = 1usize << num_qubits;

        let qubit_indices = qubits
            .iter()
            .enumerate()
            .map(|(index, qubit)| (*qubit, index))
            .collect();

        let mut initial = vec![Complex::zero(); dim];
        initial[0] = Complex::new(1.0, 0.0);

        Ok(Self {
            qubit_indices,
            state: StateVector::new(initial),
            num_qubits,
        })
    }

    #[cfg(test)]
    pub(crate) fn set_state(&mut self, state: StateVector) -> QmResult<()> {
        if state.dim() != self.state.dim() {
            return Err(QmError::SimulationError {
                message: format!(
                    "Cannot set state: provided dimension {} does not match engine dimension {}",
                    state.dim(),
                    self.state.dim()
                ),
            });
        }
        self.state = state;
        Ok(())
    }

    pub(crate) fn state(&self) -> &StateVector {
        &self.state
    }

    pub(crate) fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Applies a single gate to the register. `Measure` is handled by the
    /// simulator and is rejected here.
    pub(crate) fn apply_operation(&mut self, op: &Operation) -> QmResult<()> {
        match op {
            Operation::Hadamard { target } => {
                let idx = self.index_of(target)?;
                self.apply_single_qubit_gate(idx, &hadamard_matrix());
            }
            Operation::RotateZ { target, theta } => {
                let idx = self.index_of(target)?;
                self.apply_single_qubit_gate(idx, &rz_matrix(*theta));
            }
            Operation::RotateX { target, theta } => {
                let idx = self.index_of(target)?;
                self.apply_single_qubit_gate(idx, &rx_matrix(*theta));
            }
            Operation::ControlledFlip { control, target } => {
                let control_idx = self.index_of(control)?;
                let target_idx = self.index_of(target)?;
                if control_idx == target_idx {
                    return Err(QmError::InvalidOperation {
                        message: "Control and target qubits cannot be the same for controlled operation"
                            .to_string(),
                    });
                }
                // Basis order: |control, target> -> |00>, |01>, |10>, |11>
                let one = Complex::new(1.0, 0.0);
                let zero = Complex::zero();
                let cnot: [[Complex<f64>; 4]; 4] = [
                    [one, zero, zero, zero],
                    [zero, one, zero, zero],
                    [zero, zero, zero, one],
                    [zero, zero, one, zero],
                ];
                self.apply_two_qubit_gate(control_idx, target_idx, &cnot);
            }
            Operation::Measure { .. } => {
                return Err(QmError::InvalidOperation {
                    message: "Measure operation should not be passed directly to apply_operation"
                        .to_string(),
                });
            }
        }
        Ok(())
    }

    /// Resolves a qubit to its register index.
    pub(crate) fn index_of(&self, qubit: &QubitId) -> QmResult<usize> {
        self.qubit_indices
            .get(qubit)
            .copied()
            .ok_or_else(|| QmError::InvalidOperation {
                message: format!("{} not found in simulation context", qubit),
            })
    }

    /// Fails with `Incoherence` if the squared norm drifted away from 1.
    pub(crate) fn validate_state(&self) -> QmResult<()> {
        let norm_sq = self.state.norm_sqr();
        if (norm_sq - 1.0).abs() > NORM_TOLERANCE {
            return Err(QmError::Incoherence {
                message: format!("State vector norm deviated significantly from 1: {}", norm_sq),
            });
        }
        Ok(())
    }

    /// Applies a 2x2 matrix to the qubit stored at bit `target_idx`.
    fn apply_single_qubit_gate(&mut self, target_idx: usize, matrix: &[[Complex<f64>; 2]; 2]) {
        let mask = 1usize << target_idx;
        let amplitudes = self.state.vector();
        let mut new_vec = amplitudes.to_vec();

        // Visit each pair |..0..>, |..1..> differing only at the target bit once.
        for i0 in (0..amplitudes.len()).filter(|i| i & mask == 0) {
            let i1 = i0 | mask;
            let psi_0 = amplitudes[i0];
            let psi_1 = amplitudes[i1];
            new_vec[i0] = matrix[0][0] * psi_0 + matrix[0][1] * psi_1;
            new_vec[i1] = matrix[1][0] * psi_0 + matrix[1][1] * psi_1;
        }

        self.state = StateVector::new(new_vec);
    }

    /// Applies a 4x4 matrix in the |first, second> basis to two distinct qubits.
    fn apply_two_qubit_gate(&mut self, first_idx: usize, second_idx: usize, matrix: &[[Complex<f64>; 4]; 4]) {
        let first_mask = 1usize << first_idx;
        let second_mask = 1usize << second_idx;
        let amplitudes = self.state.vector();
        let mut new_vec = amplitudes.to_vec();

        for base in (0..amplitudes.len()).filter(|i| i & (first_mask | second_mask) == 0) {
            let indices = [
                base,
                base | second_mask,
                base | first_mask,
                base | first_mask | second_mask,
            ];
            let psi = indices.map(|k| amplitudes[k]);
            for (row, &k) in indices.iter().enumerate() {
                let mut acc = Complex::zero();
                for (col, amp) in psi.iter().enumerate() {
                    acc += matrix[row][col] * amp;
                }
                new_vec[k] = acc;
            }
        }

        self.state = StateVector::new(new_vec);
    }
}

fn hadamard_matrix() -> [[Complex<f64>; 2]; 2] {
    let h = std::f64::consts::FRAC_1_SQRT_2;
    [
        [Complex::new(h, 0.0), Complex::new(h, 0.0)],
        [Complex::new(h, 0.0), Complex::new(-h, 0.0)],
    ]
}

/// `Rz(θ) = diag(e^{-iθ/2}, e^{iθ/2})`
fn rz_matrix(theta: f64) -> [[Complex<f64>; 2]; 2] {
    let half = theta / 2.0;
    [
        [Complex::new(half.cos(), -half.sin()), Complex::zero()],
        [Complex::zero(), Complex::new(half.cos(), half.sin())],
    ]
}

/// `Rx(θ) = [[cos(θ/2), -i·sin(θ/2)], [-i·sin(θ/2), cos(θ/2)]]`
fn rx_matrix(theta: f64) -> [[Complex<f64>; 2]; 2] {
    let half = theta / 2.0;
    let cos_a = Complex::new(half.cos(), 0.0);
    let neg_i_sin = Complex::new(0.0, -half.sin());
    [[cos_a, neg_i_sin], [neg_i_sin, cos_a]]
}
