// src/simulation/results.rs
use crate::core::{QmError, QmResult, StateVector};
use rand::distr::{Distribution, StandardUniform};
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::fmt;

/// Frequency of each measured binary label.
pub type Counts = BTreeMap<String, u64>;

/// Final state of a circuit run together with the register bits that were
/// marked for measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    state: StateVector,
    /// Register indices of the measured qubits; entry `j` becomes classical bit `j`.
    measured: Vec<usize>,
}

impl SimulationResult {
    pub(crate) fn new(state: StateVector, measured: Vec<usize>) -> Self {
        Self { state, measured }
    }

    /// The state before measurement.
    pub fn state(&self) -> &StateVector {
        &self.state
    }

    /// Number of classical bits in every label.
    pub fn label_width(&self) -> usize {
        self.measured.len()
    }

    /// Projects a basis index onto the measured bits and renders it with
    /// classical bit 0 as the rightmost character.
    fn label_for(&self, basis_index: usize) -> String {
        self.measured
            .iter()
            .rev()
            .map(|&bit| if (basis_index >> bit) & 1 == 1 { '1' } else { '0' })
            .collect()
    }

    /// Exact label probabilities (marginalised over unmeasured qubits).
    pub fn label_probabilities(&self) -> BTreeMap<String, f64> {
        let mut probabilities = BTreeMap::new();
        for (k, p) in self.state.probabilities().into_iter().enumerate() {
            if p > 0.0 {
                *probabilities.entry(self.label_for(k)).or_insert(0.0) += p;
            }
        }
        probabilities
    }

    /// Draws `shots` independent samples from the Born distribution.
    pub fn sample_counts(&self, shots: u64, rng: &mut StdRng) -> QmResult<Counts> {
        if self.measured.is_empty() {
            return Err(QmError::InvalidOperation {
                message: "Circuit has no measured qubits".to_string(),
            });
        }

        let mut cumulative = Vec::with_capacity(self.state.dim());
        let mut total = 0.0;
        for p in self.state.probabilities() {
            total += p;
            cumulative.push(total);
        }
        if !(total.is_finite() && total > 0.0) {
            return Err(QmError::Incoherence {
                message: format!("Cannot sample from a state with total probability {}", total),
            });
        }

        let mut counts = Counts::new();
        for _ in 0..shots {
            let u: f64 = StandardUniform.sample(rng);
            let target = u * total;
            let k = cumulative
                .partition_point(|&c| c <= target)
                .min(cumulative.len() - 1);
            *counts.entry(self.label_for(k)).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation Results:")?;
        writeln!(f, "  Final {}", self.state)?;
        writeln!(f, "  Label Probabilities:")?;
        for (label, p) in self.label_probabilities() {
            writeln!(f, "    {}: {:.4}", label, p)?;
        }
        Ok(())
    }
}
