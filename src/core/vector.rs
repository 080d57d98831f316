// src/core/vector.rs

use super::error::{QmError, QmResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul};

/// A Cartesian 3-vector of `f64`, used for magnetic fields, directions and
/// the synthetic particle observables.
///
/// Serializes as a plain JSON array `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    /// Unit vector along x, the default direction.
    pub const UNIT_X: Vec3 = Vec3 { x: 1.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// `true` when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Returns the unit vector pointing along `self`.
    ///
    /// # Errors
    /// `QmError::DegenerateVector` if the norm is zero or the vector is not finite.
    pub fn normalize(&self) -> QmResult<Vec3> {
        let norm = self.norm();
        if !self.is_finite() || norm == 0.0 {
            return Err(QmError::DegenerateVector {
                message: format!("cannot normalize {}", self),
            });
        }
        Ok(*self * (1.0 / norm))
    }

    /// Divides every component by `divisor`, rejecting a zero or non-finite divisor.
    pub fn divide_by(&self, divisor: f64) -> QmResult<Vec3> {
        if divisor == 0.0 || !divisor.is_finite() {
            return Err(QmError::DegenerateVector {
                message: format!("cannot divide {} by magnitude {}", self, divisor),
            });
        }
        Ok(Vec3::new(self.x / divisor, self.y / divisor, self.z / divisor))
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        v.to_array()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6e}, {:.6e}, {:.6e})", self.x, self.y, self.z)
    }
}
