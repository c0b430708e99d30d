//! World-space value types.
//!
//! Positions, displacements and Euler rotations are distinct types so a
//! rotation can never be handed to something expecting a position. All three
//! deserialize from either a map (`{x, y, z}` / `{pitch, yaw, roll}`) or a
//! plain `[a, b, c]` sequence, which keeps scenario YAML short.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

#[derive(Deserialize)]
#[serde(untagged)]
enum XyzRepr {
    Seq([f64; 3]),
    Map { x: f64, y: f64, z: f64 },
}

impl XyzRepr {
    fn into_parts(self) -> (f64, f64, f64) {
        match self {
            Self::Seq([x, y, z]) | Self::Map { x, y, z } => (x, y, z),
        }
    }
}

/// A point in world space (engine units, +z up)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position3 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate (up)
    pub z: f64,
}

impl Position3 {
    /// World origin
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a new position
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Whether every component is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Straight-line distance to another position
    #[must_use]
    pub fn distance_to(&self, other: Self) -> f64 {
        (other - *self).length()
    }
}

impl<'de> Deserialize<'de> for Position3 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (x, y, z) = XyzRepr::deserialize(deserializer)?.into_parts();
        Ok(Self::new(x, y, z))
    }
}

impl fmt::Display for Position3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// A displacement between two positions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vector3 {
    /// Zero displacement
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a new vector
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length. Scaled by `hypot`, so it neither underflows nor
    /// overflows while the true length is representable.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y).hypot(self.z)
    }

    /// Unit vector in the same direction, or `None` when the length is zero
    /// or not finite.
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        let length = self.length();
        if length == 0.0 || !length.is_finite() {
            return None;
        }
        Some(Self::new(self.x / length, self.y / length, self.z / length))
    }

    /// Scale every component
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

impl<'de> Deserialize<'de> for Vector3 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (x, y, z) = XyzRepr::deserialize(deserializer)?.into_parts();
        Ok(Self::new(x, y, z))
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{:.3}, {:.3}, {:.3}>", self.x, self.y, self.z)
    }
}

impl Sub for Position3 {
    type Output = Vector3;

    fn sub(self, rhs: Self) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Add<Vector3> for Position3 {
    type Output = Self;

    fn add(self, rhs: Vector3) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RotationRepr {
    Seq([f64; 3]),
    Map {
        pitch: f64,
        yaw: f64,
        #[serde(default)]
        roll: f64,
    },
}

/// Orientation as independent pitch/yaw/roll angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EulerRotation3 {
    /// Pitch in degrees (rotation about the lateral axis)
    pub pitch: f64,
    /// Yaw in degrees (rotation in the horizontal plane)
    pub yaw: f64,
    /// Roll in degrees
    pub roll: f64,
}

impl EulerRotation3 {
    /// Create a new rotation
    #[must_use]
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Smallest absolute yaw difference in degrees, in `[0, 180]`
    #[must_use]
    pub fn yaw_delta(&self, other: &Self) -> f64 {
        let diff = (other.yaw - self.yaw).rem_euclid(360.0);
        if diff > 180.0 {
            360.0 - diff
        } else {
            diff
        }
    }
}

impl<'de> Deserialize<'de> for EulerRotation3 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RotationRepr::deserialize(deserializer)? {
            RotationRepr::Seq([pitch, yaw, roll]) | RotationRepr::Map { pitch, yaw, roll } => {
                Ok(Self::new(pitch, yaw, roll))
            }
        }
    }
}

impl fmt::Display for EulerRotation3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pitch={:.3} yaw={:.3} roll={:.3}",
            self.pitch, self.yaw, self.roll
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod vector_tests {
        use super::*;

        #[test]
        fn test_position_difference_is_vector() {
            let a = Position3::new(1.0, 2.0, 3.0);
            let b = Position3::new(4.0, 6.0, 3.0);
            assert_eq!(b - a, Vector3::new(3.0, 4.0, 0.0));
            assert_eq!(a.distance_to(b), 5.0);
        }

        #[test]
        fn test_position_plus_vector() {
            let p = Position3::new(10.0, 0.0, 0.0) + Vector3::new(500.0, 500.0, -200.0);
            assert_eq!(p, Position3::new(510.0, 500.0, -200.0));
        }

        #[test]
        fn test_normalized_unit_length() {
            let v = Vector3::new(3.0, 0.0, 4.0).normalized().unwrap();
            assert!((v.length() - 1.0).abs() < 1e-12);
            assert!((v.x - 0.6).abs() < 1e-12);
        }

        #[test]
        fn test_length_extreme_magnitudes() {
            assert_eq!(Vector3::new(1e-200, 0.0, 0.0).length(), 1e-200);
            let huge = Vector3::new(3e200, 0.0, 4e200).length();
            assert!((huge / 5e200 - 1.0).abs() < 1e-12);
        }

        #[test]
        fn test_normalized_tiny_vector() {
            let v = Vector3::new(0.0, 1e-200, 0.0).normalized().unwrap();
            assert!((v.y - 1.0).abs() < 1e-12);
        }

        #[test]
        fn test_normalized_zero_is_none() {
            assert!(Vector3::ZERO.normalized().is_none());
        }

        #[test]
        fn test_normalized_infinite_is_none() {
            assert!(Vector3::new(f64::INFINITY, 0.0, 0.0).normalized().is_none());
        }

        #[test]
        fn test_is_finite() {
            assert!(Position3::ORIGIN.is_finite());
            assert!(!Position3::new(f64::NAN, 0.0, 0.0).is_finite());
        }
    }

    mod rotation_tests {
        use super::*;

        #[test]
        fn test_yaw_delta_wraps() {
            let a = EulerRotation3::new(0.0, 170.0, 0.0);
            let b = EulerRotation3::new(0.0, -170.0, 0.0);
            assert!((a.yaw_delta(&b) - 20.0).abs() < 1e-9);
        }

        #[test]
        fn test_yaw_delta_zero() {
            let a = EulerRotation3::new(10.0, 45.0, 0.0);
            assert_eq!(a.yaw_delta(&a), 0.0);
        }

        #[test]
        fn test_display() {
            let r = EulerRotation3::new(15.5, 45.0, 0.0);
            assert_eq!(r.to_string(), "pitch=15.500 yaw=45.000 roll=0.000");
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn test_position_from_sequence() {
            let p: Position3 = serde_yaml_ng::from_str("[500, 500, -200]").unwrap();
            assert_eq!(p, Position3::new(500.0, 500.0, -200.0));
        }

        #[test]
        fn test_position_from_map() {
            let p: Position3 = serde_yaml_ng::from_str("{x: 1.5, y: 2, z: 3}").unwrap();
            assert_eq!(p, Position3::new(1.5, 2.0, 3.0));
        }

        #[test]
        fn test_rotation_roll_defaults_to_zero() {
            let r: EulerRotation3 = serde_yaml_ng::from_str("{pitch: 10, yaw: 20}").unwrap();
            assert_eq!(r, EulerRotation3::new(10.0, 20.0, 0.0));
        }

        #[test]
        fn test_position_serializes_as_map() {
            let json = serde_json::to_string(&Position3::new(1.0, 2.0, 3.0)).unwrap();
            assert_eq!(json, r#"{"x":1.0,"y":2.0,"z":3.0}"#);
        }
    }
}
