// renderer/lights.rs
use glam::{Vec3, Vec4};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Directional { direction: Vec3 },
    Point { position: Vec3, range: f32 },
    Spot {
        position: Vec3,
        direction: Vec3,
        range: f32,
        /// Half-angle of the cone, in radians.
        cutoff: f32,
    },
}

/// A light enabled for the duration of one queue submission.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec4,
    pub intensity: f32,
}

impl Light {
    pub fn directional(direction: Vec3, color: Vec4) -> Self {
        Self {
            kind: LightKind::Directional {
                direction: direction.normalize_or_zero(),
            },
            color,
            intensity: 1.0,
        }
    }

    pub fn point(position: Vec3, range: f32, color: Vec4) -> Self {
        Self {
            kind: LightKind::Point { position, range },
            color,
            intensity: 1.0,
        }
    }

    pub fn spot(position: Vec3, direction: Vec3, range: f32, cutoff: f32, color: Vec4) -> Self {
        Self {
            kind: LightKind::Spot {
                position,
                direction: direction.normalize_or_zero(),
                range,
                cutoff,
            },
            color,
            intensity: 1.0,
        }
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Color scaled by intensity, alpha untouched.
    pub fn radiance(&self) -> Vec4 {
        (self.color.truncate() * self.intensity).extend(self.color.w)
    }
}
