// src/core/mod.rs

//! Core data structures and types

pub mod error;
pub mod state;
pub mod vector;

// Re-export public types for convenient access via `qmfield::core::TypeName`
pub use error::{QmError, QmResult, QubitId};
pub use state::StateVector;
pub use vector::Vec3;

pub mod constants;
pub use constants::physics::{BOHR_MAGNETON, HBAR, PI}; // Re-export
