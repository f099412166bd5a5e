//! GPU Uniform Blocks
//!
//! Uniform data bound at group 0 of every fog draw. Each struct is laid out in
//! 16-byte rows so the Rust `#[repr(C)]` layout matches WGSL uniform layout
//! rules without hidden padding:
//!
//! | Binding | Struct                  | Source                          |
//! |---------|-------------------------|---------------------------------|
//! | 0       | [`FogGlobalUniforms`]   | `GlobalFogState::publish`       |
//! | 1       | [`FogSettingsUniforms`] | `PipelineConfig` at setup       |
//! | 2       | [`FogCameraUniforms`]   | per-frame camera reconstruction |

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Maximum number of eyes the camera block can describe (mono or stereo).
pub const MAX_EYES: usize = 2;

/// Scene-wide fog parameters.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FogGlobalUniforms {
    pub color: Vec3,
    pub density: f32,

    pub scattering: f32,
    pub extinction: f32,
    pub anisotropy: f32,
    pub sky_distance: f32,

    pub height_fog_density: f32,
    pub height_base: f32,
    pub height_transition_size: f32,
    /// 1 while the fog effect is enabled, 0 otherwise.
    pub enabled: u32,

    pub noise_weights: Vec4,

    pub noise_scroll_speed: Vec3,
    pub noise_size: f32,

    pub noise_min_max: Vec2,
    pub curl_size: f32,
    pub curl_strength: f32,

    pub curl_scroll_speed: Vec3,
    pub(crate) __pad0: f32,

    pub directional_shadow_extinction: f32,
    pub directional_shadow_density: f32,
    pub directional_shadow_distance: f32,
    pub(crate) __pad1: f32,

    pub additional_shadow_extinction: f32,
    pub additional_shadow_density: f32,
    pub additional_shadow_distance: f32,
    pub(crate) __pad2: f32,
}

impl Default for FogGlobalUniforms {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Render-feature parameters, pushed once per `setup`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FogSettingsUniforms {
    pub raymarch_steps: u32,
    pub max_distance: f32,
    pub lowest_mip_distance: f32,
    pub lowest_mip: f32,

    pub blur_depth_falloff: f32,
    pub self_shadowing: u32,
    pub directional_shadow_steps: u32,
    pub additional_shadow_steps: u32,

    /// `1 / full resolution` in pixels.
    pub full_texel_size: Vec2,
    /// `1 / half resolution` in pixels.
    pub half_texel_size: Vec2,
}

impl Default for FogSettingsUniforms {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Per-eye view reconstruction data.
///
/// `top_left`, `x_extent` and `y_extent` span the near plane of the
/// translation-free view frustum; the program derives a per-pixel view ray as
/// `top_left + uv.x * x_extent + uv.y * y_extent` and offsets it by the eye's
/// world position.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FogCameraUniforms {
    /// `x = 1 / near`, other components unused.
    pub projection_params: Vec4,
    pub view_projections: [Mat4; MAX_EYES],
    pub top_left: [Vec4; MAX_EYES],
    pub x_extent: [Vec4; MAX_EYES],
    pub y_extent: [Vec4; MAX_EYES],
    /// World-space eye positions (`w` unused).
    pub positions: [Vec4; MAX_EYES],
    pub eye_count: u32,
    /// Seconds, drives noise scrolling.
    pub time: f32,
    pub(crate) __pad: [u32; 2],
}

impl Default for FogCameraUniforms {
    fn default() -> Self {
        Self {
            projection_params: Vec4::ZERO,
            view_projections: [Mat4::IDENTITY; MAX_EYES],
            top_left: [Vec4::ZERO; MAX_EYES],
            x_extent: [Vec4::ZERO; MAX_EYES],
            y_extent: [Vec4::ZERO; MAX_EYES],
            positions: [Vec4::ZERO; MAX_EYES],
            eye_count: 1,
            time: 0.0,
            __pad: [0; 2],
        }
    }
}
