//! Global Fog State
//!
//! [`GlobalFogState`] is the single authoritative fog description of a scene.
//! It splits into serializable scalar [`FogSettings`] and host-provided
//! [`FogTextures`].
//!
//! # Publishing
//!
//! [`GlobalFogState::publish`] writes every field into a [`FogParameters`]:
//!
//! ```text
//! FogSettings ──► FogGlobalUniforms   (binding 0)
//! height_fog  ──► FogKeywords::HEIGHT_FOG
//! FogTextures ──► FogParameters.textures
//! ```
//!
//! Publishing is idempotent: unchanged values leave the parameter versions
//! untouched, so calling it every frame costs no GPU uploads.

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::params::{FogKeywords, FogParameters};
use crate::uniforms::FogGlobalUniforms;

/// Scalar fog parameters of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogSettings {
    /// Whether the fog effect renders at all.
    pub enabled: bool,

    pub density: f32,
    /// Linear RGB fog color.
    pub color: Vec3,
    pub sky_distance: f32,
    pub scattering: f32,
    pub extinction: f32,
    pub anisotropy: f32,

    // === Height Fog ===
    pub height_fog: bool,
    pub height_fog_density: f32,
    pub height_base: f32,
    pub height_transition_size: f32,

    // === Noise ===
    pub noise_weights: Vec4,
    pub noise_size: f32,
    pub noise_scroll_speed: Vec3,
    /// Remap range of the sampled noise, `x = min`, `y = max`.
    pub noise_min_max: Vec2,

    // === Curl Noise ===
    pub curl_size: f32,
    pub curl_strength: f32,
    pub curl_scroll_speed: Vec3,

    // === Shadowing ===
    pub directional_shadow_extinction: f32,
    pub directional_shadow_density: f32,
    pub directional_shadow_distance: f32,
    pub additional_shadow_extinction: f32,
    pub additional_shadow_density: f32,
    pub additional_shadow_distance: f32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            density: 1.0,
            color: Vec3::ONE,
            sky_distance: 500.0,
            scattering: 1.0,
            extinction: 1.0,
            anisotropy: 0.85,
            height_fog: false,
            height_fog_density: 3.0,
            height_base: -10.0,
            height_transition_size: 50.0,
            noise_weights: Vec4::ONE,
            noise_size: 50.0,
            noise_scroll_speed: Vec3::NEG_Y * 0.025,
            noise_min_max: Vec2::new(0.6, 1.0),
            curl_size: 50.0,
            curl_strength: 0.01,
            curl_scroll_speed: Vec3::Y * 0.015,
            directional_shadow_extinction: 0.0,
            directional_shadow_density: 1.0,
            directional_shadow_distance: 0.0,
            additional_shadow_extinction: 0.0,
            additional_shadow_density: 1.0,
            additional_shadow_distance: 0.0,
        }
    }
}

impl FogSettings {
    /// Returns a copy with every field inside its authoring range.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let min = self.noise_min_max.x.clamp(0.0, 1.0);
        let max = self.noise_min_max.y.clamp(min, 1.0);
        Self {
            density: self.density.max(0.0),
            sky_distance: self.sky_distance.max(50.0),
            scattering: self.scattering.clamp(0.0, 1.0),
            extinction: self.extinction.clamp(0.0, 1.0),
            anisotropy: self.anisotropy.clamp(0.0, 0.95),
            height_fog_density: self.height_fog_density.max(0.0),
            height_transition_size: self.height_transition_size.max(0.1),
            noise_min_max: Vec2::new(min, max),
            directional_shadow_extinction: self.directional_shadow_extinction.clamp(0.0, 1.0),
            directional_shadow_density: self.directional_shadow_density.max(1.0),
            directional_shadow_distance: self.directional_shadow_distance.clamp(0.0, 5.0),
            additional_shadow_extinction: self.additional_shadow_extinction.clamp(0.0, 1.0),
            additional_shadow_density: self.additional_shadow_density.max(1.0),
            additional_shadow_distance: self.additional_shadow_distance.clamp(0.0, 5.0),
            ..*self
        }
    }

    /// Builds the global uniform block.
    #[must_use]
    pub fn to_uniforms(&self) -> FogGlobalUniforms {
        FogGlobalUniforms {
            color: self.color,
            density: self.density,
            scattering: self.scattering,
            extinction: self.extinction,
            anisotropy: self.anisotropy,
            sky_distance: self.sky_distance,
            height_fog_density: self.height_fog_density,
            height_base: self.height_base,
            height_transition_size: self.height_transition_size,
            enabled: u32::from(self.enabled),
            noise_weights: self.noise_weights,
            noise_scroll_speed: self.noise_scroll_speed,
            noise_size: self.noise_size,
            noise_min_max: self.noise_min_max,
            curl_size: self.curl_size,
            curl_strength: self.curl_strength,
            curl_scroll_speed: self.curl_scroll_speed,
            directional_shadow_extinction: self.directional_shadow_extinction,
            directional_shadow_density: self.directional_shadow_density,
            directional_shadow_distance: self.directional_shadow_distance,
            additional_shadow_extinction: self.additional_shadow_extinction,
            additional_shadow_density: self.additional_shadow_density,
            additional_shadow_distance: self.additional_shadow_distance,
            ..Default::default()
        }
    }
}

/// Host-provided fog textures.
#[derive(Debug, Clone, Default)]
pub struct FogTextures {
    /// 2D blue noise used to jitter raymarch start offsets.
    pub blue_noise: Option<wgpu::TextureView>,
    /// 3D density noise.
    pub noise: Option<wgpu::TextureView>,
    /// 3D curl noise used to distort the density noise lookup.
    pub curl_noise: Option<wgpu::TextureView>,
}

/// Scene-wide fog description.
#[derive(Debug, Clone, Default)]
pub struct GlobalFogState {
    pub settings: FogSettings,
    pub textures: FogTextures,
}

impl GlobalFogState {
    #[must_use]
    pub fn new(settings: FogSettings) -> Self {
        Self {
            settings,
            textures: FogTextures::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Pushes every field into `params`, clamped to the authoring ranges.
    pub fn publish(&self, params: &mut FogParameters) {
        params.set_globals(self.settings.clamped().to_uniforms());
        params.set_keyword(FogKeywords::HEIGHT_FOG, self.settings.height_fog);
        params.textures.clone_from(&self.textures);
    }
}
