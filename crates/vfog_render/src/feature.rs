//! Fog Render Feature
//!
//! Host-facing shim around [`FogRenderPipeline`]. A renderer calls
//! [`FogRenderFeature::record`] once per camera per frame; the feature
//! creates the pipeline on first use, keeps it configured for the camera
//! target and runs the per-frame steps.
//!
//! ```text
//! record(ctx, frame, scene, encoder)
//!   ├─ preview / reflection camera → Skipped (no GPU state touched)
//!   ├─ feature disabled            → Skipped (no GPU state touched)
//!   ├─ lazily create FogRenderPipeline with the context's formats
//!   ├─ setup(target desc, clamped config)
//!   ├─ prepare_frame(frame, scene)
//!   └─ execute(frame, encoder)
//! ```

use vfog_core::Result;
use vfog_resources::PipelineConfig;
use vfog_scene::FogScene;

use crate::camera::{CameraTargetDesc, FogFrame};
use crate::pipeline::{FogRenderPipeline, FrameOutcome, SkipReason};
use crate::program::FogProgramDescriptor;
use crate::targets::FogFormats;

/// GPU handles borrowed from the host renderer for one `record` call.
#[derive(Clone, Copy)]
pub struct FogRenderContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    /// Half-resolution target formats; WebGPU defaults unless set.
    pub formats: FogFormats,
}

impl<'a> FogRenderContext<'a> {
    #[must_use]
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            formats: FogFormats::default(),
        }
    }

    /// Uses `formats`, typically from [`FogFormats::for_adapter`].
    #[must_use]
    pub fn with_formats(mut self, formats: FogFormats) -> Self {
        self.formats = formats;
        self
    }
}

pub struct FogRenderFeature {
    /// Editable render parameters; clamped before every setup.
    pub config: PipelineConfig,
    enabled: bool,
    program: FogProgramDescriptor,
    pipeline: Option<FogRenderPipeline>,
}

impl Default for FogRenderFeature {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl FogRenderFeature {
    /// Feature running the bundled program.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_program(config, FogProgramDescriptor::builtin())
    }

    #[must_use]
    pub fn with_program(config: PipelineConfig, program: FogProgramDescriptor) -> Self {
        Self {
            config,
            enabled: true,
            program,
            pipeline: None,
        }
    }

    /// Records the fog passes for one camera.
    ///
    /// Setup failures are returned; every other reason not to draw is a
    /// [`FrameOutcome::Skipped`].
    pub fn record(
        &mut self,
        ctx: FogRenderContext<'_>,
        frame: &FogFrame<'_>,
        scene: &FogScene,
        encoder: &mut wgpu::CommandEncoder,
    ) -> Result<FrameOutcome> {
        let skip = SkipReason::for_camera(frame.kind)
            .or((!self.enabled).then_some(SkipReason::Disabled));
        if let Some(reason) = skip {
            log::trace!("Fog skipped: {reason:?}");
            return Ok(FrameOutcome::Skipped(reason));
        }

        let config = self.config.clamped();
        let pipeline = match self.pipeline.take() {
            Some(pipeline) => pipeline,
            None => FogRenderPipeline::new(ctx.device, ctx.queue, self.program.clone())?,
        };
        let pipeline = self.pipeline.insert(pipeline);
        pipeline.set_formats(ctx.formats);

        let desc = CameraTargetDesc::from_texture(frame.color_target)
            .with_eye_count(frame.eyes.len() as u32);
        pipeline.setup(desc, &config)?;
        pipeline.prepare_frame(frame, scene)?;

        Ok(pipeline.execute(frame, encoder))
    }

    /// Replaces the program; the pipeline picks it up on the next `record`.
    ///
    /// A program that does not compile is rejected and the current one kept.
    pub fn set_program(&mut self, program: FogProgramDescriptor) -> Result<()> {
        if let Some(pipeline) = &mut self.pipeline {
            pipeline.set_program(program.clone())?;
        }
        self.program = program;
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if let Some(pipeline) = &mut self.pipeline {
            pipeline.set_enabled(enabled);
        }
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    #[must_use]
    pub fn pipeline(&self) -> Option<&FogRenderPipeline> {
        self.pipeline.as_ref()
    }

    /// Drops the pipeline and every GPU resource it owns.
    pub fn dispose(&mut self) {
        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.dispose();
        }
    }
}
