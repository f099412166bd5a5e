//! Fog Density Volumes
//!
//! A [`FogVolume`] is one spherical region that locally boosts fog density and
//! optionally overrides the fog color. Volumes are plain data: the scene node
//! that owns one refreshes its fields every frame, and the render side packs
//! them into [`GpuFogVolume`] records for the structured buffer.
//!
//! # Wire Layout
//!
//! ```text
//! offset  0  position.xyz   3 × f32
//! offset 12  radius         f32
//! offset 16  density        f32
//! offset 20  color.rgb      3 × f32
//! offset 32  fade           f32
//!            ─────────────────────── stride 36
//! ```
//!
//! The record is scalar-only so the WGSL side can declare it without vec3
//! alignment padding.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Byte stride of one [`GpuFogVolume`] record.
pub const FOG_VOLUME_STRIDE: usize = 36;

const _: () = assert!(std::mem::size_of::<GpuFogVolume>() == FOG_VOLUME_STRIDE);

/// One spherical local-fog modifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogVolume {
    /// World-space center.
    pub position: Vec3,
    /// Sphere radius (≥ 0).
    pub radius: f32,
    /// Density multiplier applied inside the sphere (≥ 0).
    pub density_multiplier: f32,
    /// Linear RGB color replacing the global fog color, if any.
    pub color_override: Option<Vec3>,
    /// Edge softness in `[0, 1]`.
    pub fade: f32,
}

impl Default for FogVolume {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            radius: 1.0,
            density_multiplier: 1.0,
            color_override: None,
            fade: 0.5,
        }
    }
}

impl FogVolume {
    #[must_use]
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            radius,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_density(mut self, density_multiplier: f32) -> Self {
        self.density_multiplier = density_multiplier;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color_override = Some(color);
        self
    }

    #[must_use]
    pub fn with_fade(mut self, fade: f32) -> Self {
        self.fade = fade;
        self
    }
}

/// Authoring values of a fog volume node.
///
/// These are what a user edits; position and radius come from the node's
/// transform when the volume is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogVolumeSettings {
    pub density_multiplier: f32,
    pub override_color: bool,
    pub color: Vec3,
    pub fade: f32,
}

impl Default for FogVolumeSettings {
    fn default() -> Self {
        Self {
            density_multiplier: 1.0,
            override_color: false,
            color: Vec3::ONE,
            fade: 0.5,
        }
    }
}

impl FogVolumeSettings {
    /// Returns a copy with every field inside its authoring range.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            density_multiplier: self.density_multiplier.max(0.0),
            override_color: self.override_color,
            color: self.color,
            fade: self.fade.clamp(0.0, 1.0),
        }
    }

    /// Color override as stored on the refreshed [`FogVolume`].
    #[must_use]
    pub fn color_override(&self) -> Option<Vec3> {
        self.override_color.then_some(self.color)
    }
}

/// GPU record of one fog volume (36 bytes, see the module docs).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuFogVolume {
    pub position: [f32; 3],
    pub radius: f32,
    pub density: f32,
    pub color: [f32; 3],
    pub fade: f32,
}

impl GpuFogVolume {
    /// Packs a volume, substituting `fog_color` when it has no override.
    #[must_use]
    pub fn from_volume(volume: &FogVolume, fog_color: Vec3) -> Self {
        Self {
            position: volume.position.to_array(),
            radius: volume.radius.max(0.0),
            density: volume.density_multiplier.max(0.0),
            color: volume.color_override.unwrap_or(fog_color).to_array(),
            fade: volume.fade.clamp(0.0, 1.0),
        }
    }
}
