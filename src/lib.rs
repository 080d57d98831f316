// src/lib.rs

//! `qmfield` - Magnetic field acquisition, circuit-driven configuration
//! selection and synthetic particle measurement.
//!
//! A [`Pipeline`] fetches a combined field reading (NOAA space weather and
//! USGS ground observatory), encodes it as rotation angles of a small
//! entangling circuit, picks the most frequently sampled bit string as the
//! field configuration, and finally runs a noisy particle measurement whose
//! series is summarized into [`SeriesStatistics`].

pub mod core;
pub mod operations;
pub mod circuits;
pub mod simulation;
pub mod selection;
pub mod acquisition;
pub mod measurement;
pub mod config;
pub mod pipeline;
pub mod service;
pub mod telemetry;

// Re-export the most common types for easier top-level use
pub use core::{QmError, QmResult, QubitId, StateVector, Vec3};
pub use operations::Operation;
pub use circuits::{Circuit, CircuitBuilder};
pub use simulation::{Counts, SimulationResult, Simulator};
pub use selection::{CircuitSampler, FieldConfiguration, FieldOptimizer, StateVectorSampler, TargetParams};
pub use acquisition::{CombinedField, FieldAcquisition, FieldReading, FieldSource, HttpFieldSource};
pub use measurement::{MeasurementSystem, ParticleMeasurement, ParticleProperties, SeriesStatistics};
pub use config::Config;
pub use pipeline::{Pipeline, PipelineParams, PipelineReport};

// Example 1: Bell pair
// Entangles two qubits and reads the label distribution. Labels put
// qubit 0 in the rightmost position.
/// ```
/// use qmfield::{CircuitBuilder, Operation, QubitId, Simulator, QmError};
///
/// let (q0, q1) = (QubitId(0), QubitId(1));
/// let circuit = CircuitBuilder::new()
///     .add_op(Operation::Hadamard { target: q0 })
///     .add_op(Operation::ControlledFlip { control: q0, target: q1 })
///     .add_op(Operation::Measure { targets: vec![q0, q1] })
///     .build();
///
/// let result = Simulator::new().run(&circuit)?;
/// println!("Circuit:\n{}", circuit);
/// let probabilities = result.label_probabilities();
/// assert!((probabilities["00"] - 0.5).abs() < 1e-9);
/// assert!((probabilities["11"] - 0.5).abs() < 1e-9);
/// # Ok::<(), QmError>(())
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 2: Offline configuration selection
// A fixed field bypasses the network; a seeded sampler keeps the chosen
// label reproducible.
/// ```
/// use qmfield::selection::magnetic_circuit;
/// use qmfield::{FieldOptimizer, StateVectorSampler, TargetParams, Vec3};
///
/// let mut optimizer = FieldOptimizer::new(4, 500, Box::new(StateVectorSampler::with_seed(7)));
/// let configuration = optimizer.select(45.7, Vec3::new(0.707, 0.0, 0.707), &TargetParams::default());
///
/// assert_eq!(configuration.optimal_state.len(), 4);
/// assert!(configuration.probability > 0.0 && configuration.probability <= 1.0);
/// assert!(magnetic_circuit(4, 0.1, 0.2).is_ok());
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item
