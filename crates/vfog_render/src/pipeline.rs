//! Fog Render Pipeline
//!
//! [`FogRenderPipeline`] owns every GPU resource of the fog effect and
//! encodes the per-frame pass sequence described by [`FogPassPlan`].
//!
//! # Frame Lifecycle
//!
//! ```text
//! setup(desc, config)           once per camera target descriptor
//!   └─ pass resolution, base variants, targets, settings uniforms
//! prepare_frame(frame, scene)   every frame
//!   ├─ publish_fog              GlobalFogState → FogParameters
//!   ├─ setup_camera             eyes → FogCameraUniforms
//!   └─ upload_volumes           snapshot → volume buffer, VOLUMES keyword
//! execute(frame, encoder)       every frame
//!   ├─ gate
//!   ├─ resolve every variant, target and bind group
//!   └─ copy → depth → fog → blur ×2 → apply
//! ```
//!
//! Shader modules and render pipelines are created inside wgpu error
//! scopes, so a broken program surfaces as [`FogError::InvalidProgram`]
//! instead of a device panic. A frame is either encoded completely or not
//! at all.
//!
//! # Performance
//!
//! - Targets are recreated only when the camera descriptor drifts
//! - Render pipelines are cached per (pass, keywords, target format)
//! - Uniform buffers are rewritten only when their parameter version moved
//! - The group 0 bind group is built once; group 2 only when the volume
//!   buffer is reallocated

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use vfog_core::{FogError, Result};
use vfog_resources::{FogKeywords, FogParameters, FogVolume, GlobalFogState, PipelineConfig};
use vfog_scene::FogScene;
use wgpu::util::DeviceExt;

use crate::bindings::{FogBindingLayouts, FogFallbacks};
use crate::camera::{CameraKind, CameraTargetDesc, EyeView, FogFrame, build_camera_uniforms};
use crate::passes::{FogDraw, FogPassPlan, FogResource, FogStep};
use crate::program::{FogPass, FogProgramDescriptor, ResolvedPasses};
use crate::targets::{FogFormats, FogTargetSlot, FogTargets};
use crate::volume_buffer::{VolumeBuffer, VolumeUpload};

/// Usage the camera color target must carry.
pub const REQUIRED_TARGET_USAGE: wgpu::TextureUsages =
    wgpu::TextureUsages::COPY_SRC.union(wgpu::TextureUsages::RENDER_ATTACHMENT);

// ============================================================================
// Frame Outcome
// ============================================================================

/// Why a frame was passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    PreviewCamera,
    ReflectionCamera,
    /// The render feature is turned off.
    Disabled,
    NoFogState,
    FogDisabled,
    /// `setup` has not succeeded since creation, failure or dispose.
    NotSetUp,
    /// The color target no longer matches the configured descriptor.
    TargetMismatch,
    /// The color target lacks `COPY_SRC | RENDER_ATTACHMENT`.
    UnsupportedTarget,
    /// A pipeline variant, target or input could not be resolved. Nothing
    /// was encoded.
    MissingResources,
}

impl SkipReason {
    /// Skip reason for camera kinds that never receive fog.
    #[must_use]
    pub fn for_camera(kind: CameraKind) -> Option<Self> {
        match kind {
            CameraKind::Preview => Some(Self::PreviewCamera),
            CameraKind::Reflection => Some(Self::ReflectionCamera),
            CameraKind::Game | CameraKind::SceneView => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Skipped(SkipReason),
    /// Fog was composited; `draws` program passes were encoded.
    Rendered { draws: usize },
}

impl FrameOutcome {
    #[inline]
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }
}

/// State of the scene's global fog as last published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FogStatus {
    #[default]
    Missing,
    Disabled,
    Enabled,
}

impl FogStatus {
    #[must_use]
    pub fn of(fog: Option<&GlobalFogState>) -> Self {
        match fog {
            None => Self::Missing,
            Some(fog) if fog.is_enabled() => Self::Enabled,
            Some(_) => Self::Disabled,
        }
    }
}

/// Inputs of the execute gate.
#[derive(Debug, Clone, Copy)]
pub struct FrameCheck {
    pub kind: CameraKind,
    pub enabled: bool,
    pub fog: FogStatus,
    pub ready: bool,
    pub configured: Option<CameraTargetDesc>,
    pub target: CameraTargetDesc,
    pub target_usage: wgpu::TextureUsages,
}

impl FrameCheck {
    /// First reason to skip the frame, in gate order.
    #[must_use]
    pub fn skip_reason(&self) -> Option<SkipReason> {
        if let Some(reason) = SkipReason::for_camera(self.kind) {
            return Some(reason);
        }
        if !self.enabled {
            return Some(SkipReason::Disabled);
        }
        match self.fog {
            FogStatus::Missing => return Some(SkipReason::NoFogState),
            FogStatus::Disabled => return Some(SkipReason::FogDisabled),
            FogStatus::Enabled => {}
        }

        let Some(configured) = self.configured.filter(|_| self.ready) else {
            return Some(SkipReason::NotSetUp);
        };
        let same_target = configured.width == self.target.width
            && configured.height == self.target.height
            && configured.format == self.target.format;
        if !same_target {
            return Some(SkipReason::TargetMismatch);
        }
        if !self.target_usage.contains(REQUIRED_TARGET_USAGE) {
            return Some(SkipReason::UnsupportedTarget);
        }
        None
    }
}

// ============================================================================
// Pipeline Variants
// ============================================================================

/// Cache key of one compiled render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineVariantKey {
    pub pass: FogPass,
    pub keywords: FogKeywords,
    pub format: wgpu::TextureFormat,
}

impl PipelineVariantKey {
    /// Keywords only distinguish `Render Fog` variants; the camera format
    /// only matters for `Apply Fog`.
    #[must_use]
    pub fn new(
        pass: FogPass,
        keywords: FogKeywords,
        camera_format: wgpu::TextureFormat,
        formats: &FogFormats,
    ) -> Self {
        let keywords = if pass == FogPass::RenderFog {
            keywords
        } else {
            FogKeywords::empty()
        };
        let format = match pass {
            FogPass::CopyDepth => formats.half_depth,
            FogPass::RenderFog | FogPass::BlurHorizontal | FogPass::BlurVertical => formats.fog,
            FogPass::ApplyFog => camera_format,
        };
        Self {
            pass,
            keywords,
            format,
        }
    }
}

// ============================================================================
// Uniform Buffers
// ============================================================================

struct UniformBuffers {
    globals: wgpu::Buffer,
    settings: wgpu::Buffer,
    camera: wgpu::Buffer,
    /// Parameter versions last written to globals, settings, camera.
    uploaded: [u64; 3],
}

impl UniformBuffers {
    fn new(device: &wgpu::Device, params: &FogParameters) -> Self {
        let init = |label: &'static str, contents: &[u8]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };

        Self {
            globals: init("VFog Globals", bytemuck::bytes_of(params.globals())),
            settings: init("VFog Settings", bytemuck::bytes_of(params.settings())),
            camera: init("VFog Camera", bytemuck::bytes_of(params.camera())),
            uploaded: [
                params.globals_version(),
                params.settings_version(),
                params.camera_version(),
            ],
        }
    }

    /// Rewrites the blocks whose version moved. Returns how many were written.
    fn flush(&mut self, queue: &wgpu::Queue, params: &FogParameters) -> usize {
        let mut written = 0;

        if self.uploaded[0] != params.globals_version() {
            queue.write_buffer(&self.globals, 0, bytemuck::bytes_of(params.globals()));
            self.uploaded[0] = params.globals_version();
            written += 1;
        }
        if self.uploaded[1] != params.settings_version() {
            queue.write_buffer(&self.settings, 0, bytemuck::bytes_of(params.settings()));
            self.uploaded[1] = params.settings_version();
            written += 1;
        }
        if self.uploaded[2] != params.camera_version() {
            queue.write_buffer(&self.camera, 0, bytemuck::bytes_of(params.camera()));
            self.uploaded[2] = params.camera_version();
            written += 1;
        }

        written
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Screen-space volumetric fog pipeline.
///
/// Owns the fog targets, the volume buffer, the uniform buffers and the
/// compiled program variants. Reads scene data only through
/// [`prepare_frame`](Self::prepare_frame) or the individual per-frame steps.
pub struct FogRenderPipeline {
    device: wgpu::Device,
    queue: wgpu::Queue,
    enabled: bool,

    // === Program ===
    program: FogProgramDescriptor,
    module: wgpu::ShaderModule,
    passes: Option<ResolvedPasses>,
    layouts: FogBindingLayouts,
    pipeline_layouts: [wgpu::PipelineLayout; 5],
    variants: FxHashMap<PipelineVariantKey, wgpu::RenderPipeline>,

    // === Parameters ===
    params: FogParameters,
    fog_status: FogStatus,
    uniforms: UniformBuffers,
    globals_bind_group: wgpu::BindGroup,

    // === Resources ===
    formats: FogFormats,
    ready: bool,
    config: Option<PipelineConfig>,
    target_desc: Option<CameraTargetDesc>,
    targets: FogTargets,
    volumes: VolumeBuffer,
    fallbacks: FogFallbacks,
    placeholder_volumes_bind_group: wgpu::BindGroup,
    /// Group 2 bind group keyed by the volume buffer allocation id.
    volumes_bind_group: Option<(u64, wgpu::BindGroup)>,
}

impl FogRenderPipeline {
    /// Creates the pipeline with `program`.
    ///
    /// Only the shader module, layouts, samplers, uniform buffers and
    /// fallbacks are created here. Targets and the base render pipelines
    /// are created by [`setup`](Self::setup). Fails with
    /// [`FogError::InvalidProgram`] when the module does not compile.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        program: FogProgramDescriptor,
    ) -> Result<Self> {
        let module = compile_module(device, &program)?;
        let layouts = FogBindingLayouts::new(device);
        let pipeline_layouts = FogPass::ALL.map(|pass| layouts.pipeline_layout(device, pass));

        let params = FogParameters::new();
        let uniforms = UniformBuffers::new(device, &params);

        let linear_clamp = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("VFog Linear Clamp Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let linear_repeat = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("VFog Linear Repeat Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("VFog Globals BindGroup"),
            layout: &layouts.globals,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniforms.settings.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniforms.camera.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&linear_clamp),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&linear_repeat),
                },
            ],
        });

        let fallbacks = FogFallbacks::new(device, queue);
        let placeholder_volumes_bind_group =
            volumes_bind_group(device, &layouts.volumes, &fallbacks.volumes, "VFog Placeholder Volumes");

        log::info!("Created fog pipeline with program '{}'", program.label);

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            enabled: true,

            program,
            module,
            passes: None,
            layouts,
            pipeline_layouts,
            variants: FxHashMap::default(),

            params,
            fog_status: FogStatus::Missing,
            uniforms,
            globals_bind_group,

            formats: FogFormats::default(),
            ready: false,
            config: None,
            target_desc: None,
            targets: FogTargets::new(),
            volumes: VolumeBuffer::new(),
            fallbacks,
            placeholder_volumes_bind_group,
            volumes_bind_group: None,
        })
    }

    /// Creates the pipeline with the bundled program.
    pub fn with_builtin_program(device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Self> {
        Self::new(device, queue, FogProgramDescriptor::builtin())
    }

    /// Replaces the program. Passes are resolved again by the next `setup`.
    ///
    /// When the new module does not compile the current program stays in
    /// place and the error is returned.
    pub fn set_program(&mut self, program: FogProgramDescriptor) -> Result<()> {
        self.module = compile_module(&self.device, &program)?;
        self.program = program;
        self.passes = None;
        self.variants.clear();
        self.ready = false;
        Ok(())
    }

    /// Sets the half-resolution target formats, usually from
    /// [`FogFormats::for_adapter`]. Takes effect on the next `setup`.
    pub fn set_formats(&mut self, formats: FogFormats) {
        if self.formats == formats {
            return;
        }
        self.formats = formats;
        self.variants.clear();
        self.ready = false;
    }

    #[inline]
    #[must_use]
    pub fn formats(&self) -> &FogFormats {
        &self.formats
    }

    // ========================================================================
    // Setup
    // ========================================================================

    /// Prepares passes, targets and settings for `desc`.
    ///
    /// Every pass is compiled once with all keywords off, so a pass table
    /// naming an entry point the module lacks fails here. On failure the
    /// pipeline stays unusable until a later call succeeds.
    pub fn setup(&mut self, desc: CameraTargetDesc, config: &PipelineConfig) -> Result<()> {
        self.ready = false;

        desc.validate()?;
        config.validate()?;

        let resolved = match self.program.resolve() {
            Ok(resolved) => resolved,
            Err(err) => {
                self.passes = None;
                return Err(err);
            }
        };
        if self.passes.as_ref() != Some(&resolved) {
            self.variants.clear();
            self.passes = Some(resolved);
        }

        for pass in FogPass::ALL {
            let key =
                PipelineVariantKey::new(pass, FogKeywords::empty(), desc.format, &self.formats);
            self.ensure_variant(key)?;
        }

        self.targets.ensure(&self.device, &desc, &self.formats);

        self.params
            .set_settings(config.to_uniforms(desc.full_size(), desc.half_size()));
        self.config = Some(*config);
        self.target_desc = Some(desc);
        self.ready = true;
        Ok(())
    }

    // ========================================================================
    // Per-Frame Steps
    // ========================================================================

    /// Publishes the scene's global fog state, or records its absence.
    pub fn publish_fog(&mut self, fog: Option<&GlobalFogState>) {
        self.fog_status = FogStatus::of(fog);
        if let Some(fog) = fog {
            fog.publish(&mut self.params);
        }
    }

    /// Rebuilds the camera uniforms for up to two eyes.
    pub fn setup_camera(&mut self, eyes: &[EyeView], near: f32, time: f32) -> Result<()> {
        let camera = build_camera_uniforms(eyes, near, time)?;
        self.params.set_camera(camera);
        Ok(())
    }

    /// Uploads the frame's volumes and updates the `VOLUMES` keyword.
    ///
    /// Volumes without a color override take the currently published fog
    /// color, so publish first.
    pub fn upload_volumes(&mut self, volumes: &[FogVolume]) -> VolumeUpload {
        let fog_color = self.params.globals().color;
        let action = self
            .volumes
            .upload(&self.device, &self.queue, volumes, fog_color);
        self.params
            .set_keyword(FogKeywords::VOLUMES, action != VolumeUpload::Empty);

        if action == VolumeUpload::Empty {
            self.volumes_bind_group = None;
        }
        action
    }

    /// Runs publish, camera setup and volume upload for `frame`.
    pub fn prepare_frame(&mut self, frame: &FogFrame<'_>, scene: &FogScene) -> Result<()> {
        self.publish_fog(scene.fog());
        self.setup_camera(&frame.eyes, frame.near, frame.time)?;
        self.upload_volumes(&scene.snapshot());
        Ok(())
    }

    // ========================================================================
    // Execute
    // ========================================================================

    /// Gate result for `frame` against the current pipeline state.
    #[must_use]
    pub fn check_frame(&self, frame: &FogFrame<'_>) -> FrameCheck {
        FrameCheck {
            kind: frame.kind,
            enabled: self.enabled,
            fog: self.fog_status,
            ready: self.ready,
            configured: self.target_desc,
            target: CameraTargetDesc::from_texture(frame.color_target),
            target_usage: frame.color_target.usage(),
        }
    }

    /// Encodes the fog passes for `frame`, or skips it untouched.
    ///
    /// Every variant, target and bind group is resolved before the first
    /// command is recorded; if any is missing the frame is skipped with
    /// [`SkipReason::MissingResources`] and `encoder` is left as it was.
    pub fn execute(
        &mut self,
        frame: &FogFrame<'_>,
        encoder: &mut wgpu::CommandEncoder,
    ) -> FrameOutcome {
        if let Some(reason) = self.check_frame(frame).skip_reason() {
            log::trace!("Fog skipped: {reason:?}");
            return FrameOutcome::Skipped(reason);
        }

        let keywords = self.params.keywords();
        let camera_format = frame.color_target.format();
        let plan = FogPassPlan::new(keywords);

        for draw in plan.draws() {
            let key = PipelineVariantKey::new(draw.pass, keywords, camera_format, &self.formats);
            if let Err(err) = self.ensure_variant(key) {
                log::warn!("Fog skipped: {err}");
                return FrameOutcome::Skipped(SkipReason::MissingResources);
            }
        }
        self.ensure_volumes_bind_group();
        self.uniforms.flush(&self.queue, &self.params);

        let camera_view = frame
            .color_target
            .create_view(&wgpu::TextureViewDescriptor::default());
        let inputs = FrameInputs {
            frame,
            camera_view: &camera_view,
        };

        let (steps, error) = capture_errors(&self.device, || {
            self.resolve_steps(&plan, keywords, camera_format, &inputs)
        });
        if let Some(err) = error {
            log::warn!("Fog skipped: {err}");
            return FrameOutcome::Skipped(SkipReason::MissingResources);
        }
        let Some(steps) = steps else {
            return FrameOutcome::Skipped(SkipReason::MissingResources);
        };

        let mut draws = 0;
        for step in &steps {
            match step {
                ResolvedStep::Copy { color_copy } => encode_copy(frame, color_copy, encoder),
                ResolvedStep::Draw(draw) => {
                    encode_draw(draw, &self.globals_bind_group, encoder);
                    draws += 1;
                }
            }
        }

        FrameOutcome::Rendered { draws }
    }

    /// Looks up everything `plan` touches, or `None` if anything is missing.
    fn resolve_steps<'a>(
        &'a self,
        plan: &FogPassPlan,
        keywords: FogKeywords,
        camera_format: wgpu::TextureFormat,
        inputs: &FrameInputs<'a, '_>,
    ) -> Option<SmallVec<[ResolvedStep<'a>; 8]>> {
        let mut resolved = SmallVec::new();

        for step in plan.steps() {
            match step {
                FogStep::Copy { .. } => {
                    let Some(color_copy) = self.targets.get(FogTargetSlot::ColorCopy) else {
                        log::warn!("Fog skipped: color copy target is not allocated");
                        return None;
                    };
                    resolved.push(ResolvedStep::Copy {
                        color_copy: color_copy.texture(),
                    });
                }
                FogStep::Draw(draw) => {
                    let key =
                        PipelineVariantKey::new(draw.pass, keywords, camera_format, &self.formats);
                    resolved.push(ResolvedStep::Draw(self.resolve_draw(draw, &key, inputs)?));
                }
            }
        }

        Some(resolved)
    }

    fn resolve_draw<'a>(
        &'a self,
        draw: &FogDraw,
        key: &PipelineVariantKey,
        inputs: &FrameInputs<'a, '_>,
    ) -> Option<ResolvedDraw<'a>> {
        let Some(pipeline) = self.variants.get(key) else {
            log::warn!("No pipeline for {} ({:?})", draw.pass.name(), key.keywords);
            return None;
        };
        let Some(target) = self.resource_view(draw.target, inputs) else {
            log::warn!("Missing target for {}", draw.pass.name());
            return None;
        };

        let entries: Option<SmallVec<[wgpu::BindGroupEntry<'_>; 4]>> = draw
            .inputs
            .iter()
            .enumerate()
            .map(|(binding, &resource)| {
                self.resource_view(resource, inputs)
                    .map(|view| wgpu::BindGroupEntry {
                        binding: binding as u32,
                        resource: wgpu::BindingResource::TextureView(view),
                    })
            })
            .collect();
        let Some(entries) = entries else {
            log::warn!("Missing input for {}", draw.pass.name());
            return None;
        };

        let pass_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(draw.pass.name()),
            layout: self.layouts.pass(draw.pass),
            entries: &entries,
        });

        let volumes = (draw.pass == FogPass::RenderFog).then(|| {
            match (&self.volumes_bind_group, draw.reads_volumes) {
                (Some((_, bind_group)), true) => bind_group,
                _ => &self.placeholder_volumes_bind_group,
            }
        });

        let load = if draw.target == FogResource::CameraColor {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
        };

        Some(ResolvedDraw {
            pass: draw.pass,
            pipeline,
            target,
            load,
            pass_bind_group,
            volumes,
        })
    }

    fn resource_view<'a>(
        &'a self,
        resource: FogResource,
        inputs: &FrameInputs<'a, '_>,
    ) -> Option<&'a wgpu::TextureView> {
        let textures = &self.params.textures;
        match resource {
            FogResource::CameraColor => Some(inputs.camera_view),
            FogResource::SceneDepth => Some(inputs.frame.depth_view),
            FogResource::BlueNoise => {
                Some(textures.blue_noise.as_ref().unwrap_or(&*self.fallbacks.blue_noise))
            }
            FogResource::Noise => Some(textures.noise.as_ref().unwrap_or(&*self.fallbacks.noise)),
            FogResource::CurlNoise => {
                Some(textures.curl_noise.as_ref().unwrap_or(&*self.fallbacks.curl_noise))
            }
            other => other
                .target_slot()
                .and_then(|slot| self.targets.get(slot))
                .map(|target| target.view()),
        }
    }

    /// Compiles the render pipeline for `key` unless it is cached.
    fn ensure_variant(&mut self, key: PipelineVariantKey) -> Result<()> {
        if self.variants.contains_key(&key) {
            return Ok(());
        }
        let Some(passes) = &self.passes else {
            return Err(FogError::InvalidProgram(format!(
                "passes of '{}' are not resolved",
                self.program.label
            )));
        };

        log::debug!(
            "Compiling fog pipeline '{}' keywords {:?} format {:?}",
            key.pass.name(),
            key.keywords,
            key.format
        );

        let overrides = key.keywords.override_constants();
        let constants: &[(&str, f64)] = if key.pass == FogPass::RenderFog {
            &overrides
        } else {
            &[]
        };

        let (pipeline, error) = capture_errors(&self.device, || {
            self.device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(key.pass.name()),
                    layout: Some(&self.pipeline_layouts[key.pass.index()]),
                    vertex: wgpu::VertexState {
                        module: &self.module,
                        entry_point: Some(self.program.vertex_entry.as_str()),
                        buffers: &[],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &self.module,
                        entry_point: Some(passes.entry(key.pass)),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: key.format,
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: wgpu::PipelineCompilationOptions {
                            constants,
                            ..Default::default()
                        },
                    }),
                    primitive: wgpu::PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview_mask: None,
                    cache: None,
                })
        });

        if let Some(err) = error {
            return Err(FogError::InvalidProgram(format!(
                "pass '{}' ({:?}) does not compile: {err}",
                key.pass.name(),
                key.keywords
            )));
        }

        self.variants.insert(key, pipeline);
        Ok(())
    }

    fn ensure_volumes_bind_group(&mut self) {
        let Some(buffer) = self.volumes.buffer() else {
            self.volumes_bind_group = None;
            return;
        };
        if matches!(&self.volumes_bind_group, Some((id, _)) if *id == buffer.id()) {
            return;
        }

        let bind_group =
            volumes_bind_group(&self.device, &self.layouts.volumes, buffer, "VFog Volumes");
        self.volumes_bind_group = Some((buffer.id(), bind_group));
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Releases all targets and the volume buffer. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        let released_targets = self.targets.release();
        let released_volumes = self.volumes.release();
        self.volumes_bind_group = None;
        self.params.set_keyword(FogKeywords::VOLUMES, false);
        self.target_desc = None;
        self.ready = false;

        if released_targets || released_volumes {
            log::info!("Disposed fog pipeline resources");
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the last `setup` succeeded and nothing was disposed since.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    #[inline]
    #[must_use]
    pub fn params(&self) -> &FogParameters {
        &self.params
    }

    #[inline]
    #[must_use]
    pub fn keywords(&self) -> FogKeywords {
        self.params.keywords()
    }

    #[inline]
    #[must_use]
    pub fn targets(&self) -> &FogTargets {
        &self.targets
    }

    #[inline]
    #[must_use]
    pub fn volume_buffer(&self) -> &VolumeBuffer {
        &self.volumes
    }

    #[inline]
    #[must_use]
    pub fn target_desc(&self) -> Option<&CameraTargetDesc> {
        self.target_desc.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> Option<&PipelineConfig> {
        self.config.as_ref()
    }

    /// Number of compiled render pipeline variants.
    #[inline]
    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }
}

impl Drop for FogRenderPipeline {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Host views that only live for one `execute` call.
struct FrameInputs<'a, 'f> {
    frame: &'a FogFrame<'f>,
    camera_view: &'a wgpu::TextureView,
}

enum ResolvedStep<'a> {
    Copy { color_copy: &'a wgpu::Texture },
    Draw(ResolvedDraw<'a>),
}

/// One draw with everything it binds already looked up.
struct ResolvedDraw<'a> {
    pass: FogPass,
    pipeline: &'a wgpu::RenderPipeline,
    target: &'a wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
    pass_bind_group: wgpu::BindGroup,
    /// Group 2, `Render Fog` only.
    volumes: Option<&'a wgpu::BindGroup>,
}

fn encode_copy(
    frame: &FogFrame<'_>,
    color_copy: &wgpu::Texture,
    encoder: &mut wgpu::CommandEncoder,
) {
    let (width, height) = frame.target_size();

    encoder.copy_texture_to_texture(
        wgpu::TexelCopyTextureInfo {
            texture: frame.color_target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyTextureInfo {
            texture: color_copy,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

fn encode_draw(
    draw: &ResolvedDraw<'_>,
    globals: &wgpu::BindGroup,
    encoder: &mut wgpu::CommandEncoder,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(draw.pass.name()),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: draw.target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: draw.load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        ..Default::default()
    });

    pass.set_pipeline(draw.pipeline);
    pass.set_bind_group(0, globals, &[]);
    pass.set_bind_group(1, &draw.pass_bind_group, &[]);
    if let Some(volumes) = draw.volumes {
        pass.set_bind_group(2, volumes, &[]);
    }
    pass.draw(0..3, 0..1);
}

/// Runs `f` inside validation and internal error scopes and returns the
/// first error raised, if any.
fn capture_errors<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
    let internal = device.push_error_scope(wgpu::ErrorFilter::Internal);
    let validation = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let value = f();

    let validation_error = pollster::block_on(validation.pop());
    let internal_error = pollster::block_on(internal.pop());
    (value, validation_error.or(internal_error))
}

fn compile_module(
    device: &wgpu::Device,
    program: &FogProgramDescriptor,
) -> Result<wgpu::ShaderModule> {
    let (module, error) = capture_errors(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(program.label.as_str()),
            source: wgpu::ShaderSource::Wgsl(program.source.clone()),
        })
    });

    match error {
        Some(err) => Err(FogError::InvalidProgram(format!(
            "program '{}' does not compile: {err}",
            program.label
        ))),
        None => Ok(module),
    }
}

fn volumes_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    label: &'static str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}
