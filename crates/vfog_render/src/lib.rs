//! Render side of vfog.
//!
//! - [`camera`]: camera kinds, target descriptors and near-plane reconstruction
//! - [`program`]: the fog program contract and its five named passes
//! - [`passes`]: the pure per-frame pass plan
//! - [`targets`]: full- and half-resolution fog targets
//! - [`volume_buffer`]: per-frame storage buffer of fog volumes
//! - [`bindings`]: bind group layouts and fallback resources
//! - [`pipeline`]: [`FogRenderPipeline`], which owns all of the above
//! - [`feature`]: [`FogRenderFeature`], the host-facing shim

pub mod bindings;
pub mod camera;
pub mod feature;
pub mod passes;
pub mod pipeline;
pub mod program;
pub mod targets;
pub mod volume_buffer;

pub use camera::{CameraKind, CameraTargetDesc, EyeView, FogFrame, build_camera_uniforms};
pub use feature::{FogRenderContext, FogRenderFeature};
pub use passes::{BLUR_ITERATIONS, FogDraw, FogPassPlan, FogResource, FogStage, FogStep};
pub use pipeline::{
    FogRenderPipeline, FogStatus, FrameCheck, FrameOutcome, PipelineVariantKey, SkipReason,
};
pub use program::{BUILTIN_FOG_WGSL, FogPass, FogProgramDescriptor, ResolvedPasses};
pub use targets::{
    FOG_TARGET_FORMAT, FogFormats, FogTargetSlot, FogTargets, HALF_DEPTH_FALLBACK_FORMAT,
    HALF_DEPTH_FORMAT,
};
pub use volume_buffer::{VolumeBuffer, VolumeUpload};
