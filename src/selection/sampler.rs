// src/selection/sampler.rs

//! Backends that turn the two field angles into label frequency counts.

use super::magnetic_circuit;
use crate::core::{QmError, QmResult};
use crate::simulation::{Counts, Simulator};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

/// Black-box sampler for the field configuration circuit.
pub trait CircuitSampler {
    /// Evaluates the circuit parameterized by `angle1`/`angle2` over
    /// `num_qubits` qubits and returns the frequency of each binary label
    /// across `shots` independent trials.
    fn sample(&mut self, angle1: f64, angle2: f64, num_qubits: usize, shots: u64) -> QmResult<Counts>;
}

/// Runs the circuit on the crate's state-vector [`Simulator`].
pub struct StateVectorSampler {
    simulator: Simulator,
    rng: StdRng,
}

impl StateVectorSampler {
    /// Sampler drawing from a randomly seeded generator.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Sampler whose counts are reproducible for a given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            simulator: Simulator::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for StateVectorSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitSampler for StateVectorSampler {
    fn sample(&mut self, angle1: f64, angle2: f64, num_qubits: usize, shots: u64) -> QmResult<Counts> {
        let circuit = magnetic_circuit(num_qubits, angle1, angle2)?;
        debug!("sampling circuit\n{}", circuit);
        let result = self.simulator.run(&circuit)?;
        result.sample_counts(shots, &mut self.rng)
    }
}

/// Deterministic stand-in returning preset counts, or a preset failure.
#[derive(Debug, Clone)]
pub struct FixedCountsSampler {
    outcome: Result<Counts, String>,
    calls: usize,
}

impl FixedCountsSampler {
    pub fn new(counts: Counts) -> Self {
        Self { outcome: Ok(counts), calls: 0 }
    }

    /// A sampler that fails on every call with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { outcome: Err(message.into()), calls: 0 }
    }

    /// Builds the counts from `(label, count)` pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        Self::new(pairs.into_iter().map(|(l, c)| (l.to_string(), c)).collect())
    }

    /// Number of times `sample` was invoked.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl CircuitSampler for FixedCountsSampler {
    fn sample(&mut self, _angle1: f64, _angle2: f64, _num_qubits: usize, _shots: u64) -> QmResult<Counts> {
        self.calls += 1;
        self.outcome
            .clone()
            .map_err(|message| QmError::SamplerFailure { message })
    }
}
