//! Error handling logic

use std::fmt;
use thiserror::Error;

/// Identifier of a single qubit within a circuit.
/// Qubit `n` maps to classical bit `n` of a measured label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QubitId(pub u64);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q({})", self.0)
    }
}

/// Failures raised by the acquisition, selection and measurement stages.
///
/// Every stage recovers from its own errors where a documented default
/// exists; only the variants that reach the pipeline without a fallback are
/// surfaced to callers as an error report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QmError {
    /// No magnetic field reading could be obtained from any source.
    #[error("No Data Available: {message}")]
    NoDataAvailable {
        /// NoDataAvailable failure message
        message: String,
    },

    /// A zero-norm (or non-finite) vector was passed where a direction is required.
    #[error("Degenerate Vector: {message}")]
    DegenerateVector {
        /// DegenerateVector failure message
        message: String,
    },

    /// The circuit sampler failed or returned unusable counts.
    #[error("Sampler Failure: {message}")]
    SamplerFailure {
        /// SamplerFailure failure message
        message: String,
    },

    /// A pipeline run failed with no defined fallback.
    #[error("Pipeline Failure: {message}")]
    PipelineFailure {
        /// PipelineFailure failure message
        message: String,
    },

    /// Particle properties that make the measurement formulas meaningless.
    #[error("Invalid Particle: {message}")]
    InvalidParticle {
        /// InvalidParticle failure message
        message: String,
    },

    /// A fetch or parse failure on a single field source.
    #[error("Fetch Error ({source_name}): {message}")]
    Fetch {
        /// Source tag, e.g. `NOAA SWPC`
        source_name: String,
        /// Fetch failure message
        message: String,
    },

    /// A circuit operation is inconsistent with the circuit it is applied to.
    #[error("Invalid Operation: {message}")]
    InvalidOperation {
        /// InvalidOperation failure message
        message: String,
    },

    /// The simulated state lost normalization.
    #[error("Incoherence Violation: {message}")]
    Incoherence {
        /// Incoherence failure message
        message: String,
    },

    /// General error encountered during the simulation process itself.
    #[error("Simulation Process Error: {message}")]
    SimulationError {
        /// SimulationError failure message
        message: String,
    },

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration Error: {message}")]
    Config {
        /// Config failure message
        message: String,
    },
}

/// Convenience alias used across the crate.
pub type QmResult<T> = Result<T, QmError>;
