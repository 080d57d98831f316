// src/simulation/mod.rs

//! Simulates the execution of `qmfield::circuits::Circuit` on a dense state vector.
//! This module contains the `Simulator` entry point and the internal `SimulationEngine`
//! responsible for evolving the amplitudes.

mod results;
pub(crate) mod engine;

pub use results::{Counts, SimulationResult};

use crate::circuits::Circuit;
use crate::core::{QmError, QmResult};
use crate::operations::Operation;
use engine::SimulationEngine;
use tracing::trace;

/// The main simulator orchestrating the execution of circuits.
#[derive(Debug, Default, Clone, Copy)]
pub struct Simulator {}

impl Simulator {
    /// Creates a new Simulator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `circuit` from |0...0> and returns the final state.
    ///
    /// Gates are applied in order. `Measure` operations only record which
    /// qubits form the classical label; any gate placed after a `Measure` is
    /// rejected because sampling happens on the final state.
    ///
    /// # Returns
    /// * `Ok(SimulationResult)` holding the final, normalized state.
    /// * `Err(QmError)` for empty circuits, unknown or self-controlled
    ///   qubits, oversize registers or a state that lost normalization.
    pub fn run(&self, circuit: &Circuit) -> QmResult<SimulationResult> {
        if circuit.is_empty() {
            return Err(QmError::InvalidOperation {
                message: "Cannot run an empty circuit".to_string(),
            });
        }

        let mut engine = SimulationEngine::init(circuit.qubits())?;
        let mut measured = Vec::new();

        for op in circuit.operations() {
            match op {
                Operation::Measure { targets } => {
                    for target in targets {
                        let idx = engine.index_of(target)?;
                        if !measured.contains(&idx) {
                            measured.push(idx);
                        }
                    }
                }
                _ if !measured.is_empty() => {
                    return Err(QmError::InvalidOperation {
                        message: format!("Gate {:?} follows a measurement", op),
                    });
                }
                _ => engine.apply_operation(op)?,
            }
        }

        engine.validate_state()?;
        trace!(num_qubits = engine.num_qubits(), state = %engine.state(), "circuit evaluated");
        Ok(SimulationResult::new(engine.state().clone(), measured))
    }
}
