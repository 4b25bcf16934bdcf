//! Pose and angle primitives shared by actor code.

use serde::{Deserialize, Serialize};

/// Binary-angle units per degree (a full turn is 0x10000 units).
pub const DEG_TO_BINANG: f32 = 65536.0 / 360.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3f {
    pub const ZERO: Vec3f = Vec3f {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Vec3f {
        Vec3f { x, y, z }
    }

    pub fn distance(self, other: Vec3f) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn scaled(self, factor: f32) -> Vec3f {
        Vec3f::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vec3s {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Vec3s {
    pub const ZERO: Vec3s = Vec3s { x: 0, y: 0, z: 0 };

    pub fn new(x: i16, y: i16, z: i16) -> Vec3s {
        Vec3s { x, y, z }
    }
}

/// World-space placement of an actor: position, binary-angle rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3f,
    pub rotation: Vec3s,
    pub scale: Vec3f,
}

impl Pose {
    pub fn at(position: Vec3f) -> Pose {
        Pose {
            position,
            rotation: Vec3s::ZERO,
            scale: Vec3f::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3s) -> Pose {
        self.rotation = rotation;
        self
    }
}

impl Default for Pose {
    fn default() -> Pose {
        Pose::at(Vec3f::ZERO)
    }
}

/// Sine of a binary angle. Not the console lookup table; close enough for a
/// runtime that does not chase bit-identical output.
pub fn bin_sin(angle: i16) -> f32 {
    (f32::from(angle) / 32768.0 * std::f32::consts::PI).sin()
}

/// Cosine of a binary angle.
pub fn bin_cos(angle: i16) -> f32 {
    (f32::from(angle) / 32768.0 * std::f32::consts::PI).cos()
}
