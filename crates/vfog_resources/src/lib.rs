//! vfog resources.
//!
//! Pure data shared between the scene side and the render side:
//!
//! - [`volume`]: [`FogVolume`] and its 36-byte GPU record [`GpuFogVolume`]
//! - [`fog`]: scene-wide [`GlobalFogState`] and its `publish` step
//! - [`config`]: render-feature [`PipelineConfig`]
//! - [`uniforms`]: std140-compatible uniform blocks consumed by the fog program
//! - [`params`]: [`FogParameters`], the explicit parameter-binding struct handed
//!   to every fog draw, and the [`FogKeywords`] feature switches

pub mod config;
pub mod fog;
pub mod params;
pub mod uniforms;
pub mod volume;

pub use config::PipelineConfig;
pub use fog::{FogSettings, FogTextures, GlobalFogState};
pub use params::{FogKeywords, FogParameters};
pub use uniforms::{FogCameraUniforms, FogGlobalUniforms, FogSettingsUniforms, MAX_EYES};
pub use volume::{FOG_VOLUME_STRIDE, FogVolume, FogVolumeSettings, GpuFogVolume};
