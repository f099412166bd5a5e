//! Render-Feature Configuration
//!
//! [`PipelineConfig`] carries the quality knobs of the fog render feature.
//! It is immutable for the duration of a frame and pushed into
//! [`FogSettingsUniforms`] by the pipeline's `setup`.
//!
//! Two levels of checking apply:
//!
//! - [`PipelineConfig::clamped`] snaps values into their authoring ranges
//!   (what an inspector slider would allow).
//! - [`PipelineConfig::validate`] rejects values that break hard invariants
//!   (zero step counts, non-positive distances). Setup refuses such configs.
//!
//! ```rust,ignore
//! use vfog_resources::PipelineConfig;
//!
//! let config = PipelineConfig {
//!     raymarch_steps: 32,
//!     max_distance: 400.0,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use vfog_core::{FogError, Result};

use crate::uniforms::FogSettingsUniforms;

/// Raymarch step authoring range.
pub const RAYMARCH_STEPS_RANGE: (u32, u32) = (8, 128);
/// Shadow step authoring range (directional and additional lights).
pub const SHADOW_STEPS_RANGE: (u32, u32) = (1, 8);
/// Lower bound of `max_distance` in the authoring UI.
pub const MIN_MAX_DISTANCE: f32 = 50.0;
/// Lower bound of `lowest_mip_distance` in the authoring UI.
pub const MIN_LOWEST_MIP_DISTANCE: f32 = 25.0;
/// Lower bound of `blur_depth_falloff` in the authoring UI.
pub const MIN_BLUR_DEPTH_FALLOFF: f32 = 0.001;

/// Fog render-feature parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raymarch samples per fog pixel.
    pub raymarch_steps: u32,
    /// Distance at which raymarching stops.
    pub max_distance: f32,
    /// Distance at which fog-buffer sampling reaches `lowest_mip`.
    pub lowest_mip_distance: f32,
    /// Mip bias used at and beyond `lowest_mip_distance`.
    ///
    /// Forwarded to the program as-is. The pipeline allocates its fog
    /// targets with one mip level, so the bundled program's sampling is
    /// unaffected by this bias.
    pub lowest_mip: f32,
    /// Depth-aware blur falloff coefficient.
    pub blur_depth_falloff: f32,
    /// Raymarch shadowing inside the fog itself. Very expensive.
    pub self_shadowing: bool,
    pub directional_shadow_steps: u32,
    pub additional_shadow_steps: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raymarch_steps: 16,
            max_distance: 250.0,
            lowest_mip_distance: 100.0,
            lowest_mip: 1.0,
            blur_depth_falloff: 1.0,
            self_shadowing: false,
            directional_shadow_steps: 2,
            additional_shadow_steps: 2,
        }
    }
}

impl PipelineConfig {
    /// Returns a copy with every field inside its authoring range.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            raymarch_steps: self
                .raymarch_steps
                .clamp(RAYMARCH_STEPS_RANGE.0, RAYMARCH_STEPS_RANGE.1),
            max_distance: self.max_distance.max(MIN_MAX_DISTANCE),
            lowest_mip_distance: self.lowest_mip_distance.max(MIN_LOWEST_MIP_DISTANCE),
            lowest_mip: self.lowest_mip.max(0.0),
            blur_depth_falloff: self.blur_depth_falloff.max(MIN_BLUR_DEPTH_FALLOFF),
            self_shadowing: self.self_shadowing,
            directional_shadow_steps: self
                .directional_shadow_steps
                .clamp(SHADOW_STEPS_RANGE.0, SHADOW_STEPS_RANGE.1),
            additional_shadow_steps: self
                .additional_shadow_steps
                .clamp(SHADOW_STEPS_RANGE.0, SHADOW_STEPS_RANGE.1),
        }
    }

    /// Checks the hard invariants: step counts ≥ 1, distances > 0.
    pub fn validate(&self) -> Result<()> {
        let steps = [
            ("raymarch_steps", self.raymarch_steps),
            ("directional_shadow_steps", self.directional_shadow_steps),
            ("additional_shadow_steps", self.additional_shadow_steps),
        ];
        for (name, value) in steps {
            if value == 0 {
                return Err(FogError::InvalidConfig(format!("{name} must be at least 1")));
            }
        }

        let distances = [
            ("max_distance", self.max_distance),
            ("lowest_mip_distance", self.lowest_mip_distance),
        ];
        for (name, value) in distances {
            if value.is_nan() || value <= 0.0 {
                return Err(FogError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if self.lowest_mip.is_nan() || self.lowest_mip < 0.0 {
            return Err(FogError::InvalidConfig(format!(
                "lowest_mip must not be negative, got {}",
                self.lowest_mip
            )));
        }
        if self.blur_depth_falloff.is_nan() || self.blur_depth_falloff <= 0.0 {
            return Err(FogError::InvalidConfig(format!(
                "blur_depth_falloff must be positive, got {}",
                self.blur_depth_falloff
            )));
        }
        Ok(())
    }

    /// Builds the settings uniform block for the given full and half
    /// resolution extents.
    #[must_use]
    pub fn to_uniforms(&self, full: (u32, u32), half: (u32, u32)) -> FogSettingsUniforms {
        let texel = |(w, h): (u32, u32)| Vec2::new(1.0 / w.max(1) as f32, 1.0 / h.max(1) as f32);
        FogSettingsUniforms {
            raymarch_steps: self.raymarch_steps,
            max_distance: self.max_distance,
            lowest_mip_distance: self.lowest_mip_distance,
            lowest_mip: self.lowest_mip,
            blur_depth_falloff: self.blur_depth_falloff,
            self_shadowing: u32::from(self.self_shadowing),
            directional_shadow_steps: self.directional_shadow_steps,
            additional_shadow_steps: self.additional_shadow_steps,
            full_texel_size: texel(full),
            half_texel_size: texel(half),
        }
    }
}
