// src/core/state.rs

use num_complex::Complex;
use std::fmt;

/// The amplitude vector of an `n`-qubit register before measurement.
///
/// Basis index `k` encodes qubit `i` in bit `i` of `k`, so the binary
/// rendering of `k` (most significant bit first) is the measured label with
/// qubit 0 as the rightmost character.
#[derive(Debug, Clone, PartialEq)] // Avoid Eq for floating-point complex numbers
pub struct StateVector {
    amplitudes: Vec<Complex<f64>>,
}

impl StateVector {
    pub(crate) fn new(amplitudes: Vec<Complex<f64>>) -> Self {
        Self { amplitudes }
    }

    /// Provides read-only access to the amplitudes.
    pub fn vector(&self) -> &[Complex<f64>] {
        &self.amplitudes
    }

    /// Gets the number of basis states represented (2^n).
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    /// Born-rule probabilities `|c_k|^2` in basis order.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|c| c.norm_sqr()).collect()
    }

    /// Sum of squared amplitudes; 1.0 for a physical state.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|c| c.norm_sqr()).sum()
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State[")?;
        for (i, c) in self.amplitudes.iter().enumerate() {
            write!(f, "{}{:.4}", if i > 0 { ", " } else { "" }, c)?;
        }
        write!(f, "]")
    }
}
