//! Physical and pipeline constants.

/// Physical constants used by the measurement formulas.
pub mod physics {
    /// Reduced Planck constant ħ [J·s].
    pub const HBAR: f64 = 1.054_571_817e-34;
    /// Bohr magneton μ_B [J/T].
    pub const BOHR_MAGNETON: f64 = 9.274_009_994e-24;
    /// Used for angle mapping (`θ = strength·π`)
    pub const PI: f64 = std::f64::consts::PI;
    /// Floor applied to magnitudes that appear in a denominator.
    pub const MAGNITUDE_FLOOR: f64 = 1e-10;
}

/// Weights and defaults for combining field readings.
pub mod field {
    /// Confidence weight of the solar-wind magnetometer reading.
    pub const SPACE_WEIGHT: f64 = 0.4;
    /// Confidence weight of the ground observatory reading.
    pub const GROUND_WEIGHT: f64 = 0.6;
    /// Field strength substituted when no source answers.
    pub const FALLBACK_STRENGTH: f64 = 45.7;
    /// Field direction substituted when no source answers.
    pub const FALLBACK_DIRECTION: [f64; 3] = [0.707, 0.0, 0.707];
}
