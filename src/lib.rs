//! # vfog
//!
//! Screen-space volumetric fog for wgpu renderers, with optional local
//! spherical fog volumes.
//!
//! ```text
//! FogScene ──────────────┐
//!   ├─ FogVolumeNode ×N  │ update() → snapshot()
//!   ├─ VolumeRegistry    │
//!   └─ GlobalFogState    │ publish()
//!                        ▼
//! FogRenderFeature ─► FogRenderPipeline
//!                        ├─ setup(target, PipelineConfig)
//!                        ├─ setup_camera / upload_volumes
//!                        └─ execute: copy → depth → fog → blur ×2 → apply
//! ```
//!
//! The crates behind this facade:
//!
//! - [`core`]: errors and allocation tracking
//! - [`resources`]: settings, uniforms, volumes, parameter binding
//! - [`scene`]: volume nodes, registry and the per-scene context
//! - [`render`]: targets, program contract, pass plan and the pipeline

pub use vfog_core as core;
pub use vfog_render as render;
pub use vfog_resources as resources;
pub use vfog_scene as scene;

pub use vfog_core::{FogError, Result, Tracked};
pub use vfog_render::{
    CameraKind, CameraTargetDesc, EyeView, FogFormats, FogFrame, FogPass, FogPassPlan,
    FogProgramDescriptor, FogRenderContext, FogRenderFeature, FogRenderPipeline, FrameOutcome,
    SkipReason, VolumeUpload,
};
pub use vfog_resources::{
    FogKeywords, FogParameters, FogSettings, FogTextures, FogVolume, FogVolumeSettings,
    GlobalFogState, GpuFogVolume, PipelineConfig,
};
pub use vfog_scene::{FogScene, FogVolumeKey, FogVolumeNode, VolumeRegistry, VolumeSnapshot};

pub mod prelude {
    pub use crate::{
        CameraKind, CameraTargetDesc, EyeView, FogFormats, FogFrame, FogRenderContext,
        FogRenderFeature, FogScene, FogSettings, FogVolumeSettings, GlobalFogState,
        PipelineConfig,
    };
}
