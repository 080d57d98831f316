// src/operations/mod.rs

//! Gate and measurement operations understood by the state-vector simulator.
//!
//! The set covers exactly what the field
//! configuration circuit needs (superposition, two rotation axes, a
//! nearest-neighbour entangling chain and measurement).

use crate::core::QubitId;

/// A single step of a circuit.
#[derive(Debug, Clone, PartialEq)] // f64 parameters, so no Eq
pub enum Operation {
    /// Equal superposition of |0> and |1> (H gate).
    Hadamard {
        /// The qubit the gate acts on.
        target: QubitId,
    },

    /// Rotation about the Z axis, `Rz(θ) = diag(e^{-iθ/2}, e^{iθ/2})`.
    RotateZ {
        /// The qubit the gate acts on.
        target: QubitId,
        /// Rotation angle in radians.
        theta: f64,
    },

    /// Rotation about the X axis,
    /// `Rx(θ) = [[cos θ/2, -i sin θ/2], [-i sin θ/2, cos θ/2]]`.
    RotateX {
        /// The qubit the gate acts on.
        target: QubitId,
        /// Rotation angle in radians.
        theta: f64,
    },

    /// Flips `target` when `control` is |1> (CNOT).
    ControlledFlip {
        /// The qubit whose value conditions the flip.
        control: QubitId,
        /// The qubit that is flipped.
        target: QubitId,
    },

    /// Marks the listed qubits for sampling. The simulator samples the final
    /// state, so a `Measure` is expected as the last operation.
    Measure {
        /// Qubits whose outcomes form the classical label.
        targets: Vec<QubitId>,
    },
}

impl Operation {
    /// Returns every qubit referenced by the operation's parameters.
    pub fn involved_qubits(&self) -> Vec<QubitId> {
        match self {
            Operation::Hadamard { target } => vec![*target],
            Operation::RotateZ { target, .. } => vec![*target],
            Operation::RotateX { target, .. } => vec![*target],
            Operation::ControlledFlip { control, target } => vec![*control, *target],
            Operation::Measure { targets } => targets.clone(),
        }
    }

    /// Short diagram symbol used by the circuit `Display` implementation.
    pub(crate) fn symbol(&self) -> &'static str {
        match self {
            Operation::Hadamard { .. } => "H",
            Operation::RotateZ { .. } => "Rz",
            Operation::RotateX { .. } => "Rx",
            Operation::ControlledFlip { .. } => "X",
            Operation::Measure { .. } => "M",
        }
    }
}
