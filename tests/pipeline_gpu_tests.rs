//! Fog Pipeline GPU Tests
//!
//! Tests for:
//! - Setup idempotence, target sizing and pass compilation
//! - Program errors surfacing as `FogError::InvalidProgram`
//! - Volume buffer allocation, reuse, release and readback
//! - Keyword state for zero volumes and height fog
//! - Execute gating, the full pass sequence and all-or-nothing encoding
//! - Color readback for skipped and fog-free frames
//! - Dispose
//!
//! Every test returns early when no WebGPU-compliant adapter is available.

use glam::{Mat4, Vec3};

use vfog::render::{BUILTIN_FOG_WGSL, FogTargetSlot, VolumeBuffer, VolumeUpload};
use vfog::{
    CameraKind, CameraTargetDesc, EyeView, FogError, FogFormats, FogFrame, FogKeywords, FogPass,
    FogProgramDescriptor, FogRenderContext, FogRenderFeature, FogRenderPipeline, FogScene,
    FogSettings, FogVolume, FogVolumeSettings, FrameOutcome, GlobalFogState, PipelineConfig,
    SkipReason,
};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct Gpu {
    device: wgpu::Device,
    queue: wgpu::Queue,
    formats: FogFormats,
}

impl Gpu {
    fn ctx(&self) -> FogRenderContext<'_> {
        FogRenderContext::new(&self.device, &self.queue).with_formats(self.formats)
    }

    fn pipeline(&self) -> anyhow::Result<FogRenderPipeline> {
        let mut pipeline = FogRenderPipeline::with_builtin_program(&self.device, &self.queue)?;
        pipeline.set_formats(self.formats);
        Ok(pipeline)
    }

    fn pipeline_with(&self, program: FogProgramDescriptor) -> anyhow::Result<FogRenderPipeline> {
        let mut pipeline = FogRenderPipeline::new(&self.device, &self.queue, program)?;
        pipeline.set_formats(self.formats);
        Ok(pipeline)
    }

    fn encoder(&self) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor::default())
    }
}

fn gpu() -> Option<Gpu> {
    let _ = env_logger::builder().is_test(true).try_init();

    let instance = wgpu::Instance::default();
    let adapter =
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
            .ok()?;
    if !adapter.get_downlevel_capabilities().is_webgpu_compliant() {
        eprintln!("skipping: adapter {:?} is downlevel", adapter.get_info().name);
        return None;
    }

    let (device, queue) =
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()?;
    let formats = FogFormats::for_adapter(&adapter, device.features()).ok()?;
    Some(Gpu {
        device,
        queue,
        formats,
    })
}

struct HostTargets {
    color: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

fn host_targets(device: &wgpu::Device, width: u32, height: u32) -> HostTargets {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let color = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Test Color"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Test Depth"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

    HostTargets { color, depth_view }
}

fn eye() -> EyeView {
    EyeView::new(
        Mat4::look_at_rh(Vec3::new(0.0, 2.0, 10.0), Vec3::ZERO, Vec3::Y),
        Mat4::perspective_infinite_reverse_rh(60f32.to_radians(), 16.0 / 9.0, 0.1),
    )
}

fn config() -> PipelineConfig {
    PipelineConfig {
        raymarch_steps: 16,
        max_distance: 250.0,
        ..Default::default()
    }
}

// ============================================================================
// Readback Helpers
// ============================================================================

/// Writes a fixed RGBA8 pattern into `texture` and returns it.
fn fill_color(gpu: &Gpu, texture: &wgpu::Texture) -> Vec<u8> {
    let size = texture.size();
    let pixels: Vec<u8> = (0..size.width * size.height)
        .flat_map(|i| [(i * 7 % 251) as u8, (i * 13 % 241) as u8, (i * 29 % 239) as u8, 255])
        .collect();

    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(size.width * 4),
            rows_per_image: Some(size.height),
        },
        size,
    );
    pixels
}

fn map_read(gpu: &Gpu, buffer: &wgpu::Buffer) -> anyhow::Result<Vec<u8>> {
    let slice = buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    gpu.device.poll(wgpu::PollType::wait_indefinitely())?;
    receiver.recv()??;

    let bytes = slice.get_mapped_range().to_vec();
    buffer.unmap();
    Ok(bytes)
}

fn read_color(gpu: &Gpu, texture: &wgpu::Texture) -> anyhow::Result<Vec<u8>> {
    let size = texture.size();
    let row = size.width * 4;
    let padded = row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Test Color Readback"),
        size: u64::from(padded * size.height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu.encoder();
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(size.height),
            },
        },
        size,
    );
    gpu.queue.submit(Some(encoder.finish()));

    let bytes = map_read(gpu, &buffer)?;
    Ok(bytes
        .chunks(padded as usize)
        .flat_map(|line| line[..row as usize].iter().copied())
        .collect())
}

fn read_storage(gpu: &Gpu, buffer: &wgpu::Buffer) -> anyhow::Result<Vec<u8>> {
    let staging = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Test Volume Readback"),
        size: buffer.size(),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu.encoder();
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, buffer.size());
    gpu.queue.submit(Some(encoder.finish()));

    map_read(gpu, &staging)
}

// ============================================================================
// Setup Tests
// ============================================================================

#[test]
fn setup_twice_reallocates_nothing() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let mut pipeline = gpu.pipeline()?;
    let desc = CameraTargetDesc::new(1280, 720, COLOR_FORMAT);

    pipeline.setup(desc, &config())?;
    let ids: Vec<_> = FogTargetSlot::ALL
        .iter()
        .map(|&slot| pipeline.targets().id(slot))
        .collect();
    assert!(ids.iter().all(Option::is_some));
    assert_eq!(pipeline.variant_count(), 5);

    pipeline.setup(desc, &config())?;
    let again: Vec<_> = FogTargetSlot::ALL
        .iter()
        .map(|&slot| pipeline.targets().id(slot))
        .collect();
    assert_eq!(ids, again);
    assert_eq!(pipeline.variant_count(), 5);
    assert!(pipeline.is_ready());
    Ok(())
}

#[test]
fn resize_allocates_half_resolution_targets() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let mut pipeline = gpu.pipeline()?;

    pipeline.setup(CameraTargetDesc::new(1280, 720, COLOR_FORMAT), &config())?;
    let copy_id = pipeline.targets().id(FogTargetSlot::ColorCopy);

    pipeline.setup(CameraTargetDesc::new(641, 359, COLOR_FORMAT), &config())?;
    assert_ne!(pipeline.targets().id(FogTargetSlot::ColorCopy), copy_id);

    let size_of = |slot| {
        pipeline
            .targets()
            .get(slot)
            .map(|target| (target.spec().width, target.spec().height))
    };
    assert_eq!(size_of(FogTargetSlot::ColorCopy), Some((641, 359)));
    for slot in [
        FogTargetSlot::Fog,
        FogTargetSlot::Blur0,
        FogTargetSlot::Blur1,
        FogTargetSlot::HalfDepth,
    ] {
        assert_eq!(size_of(slot), Some((320, 179)), "{slot:?}");
    }
    Ok(())
}

#[test]
fn targets_use_device_formats_and_one_mip() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let mut pipeline = gpu.pipeline()?;
    pipeline.setup(CameraTargetDesc::new(128, 128, COLOR_FORMAT), &config())?;

    let Some(half_depth) = pipeline.targets().get(FogTargetSlot::HalfDepth) else {
        anyhow::bail!("half depth is allocated by setup");
    };
    assert_eq!(half_depth.spec().format, gpu.formats.half_depth);

    for slot in FogTargetSlot::ALL {
        let Some(target) = pipeline.targets().get(slot) else {
            anyhow::bail!("{slot:?} is allocated by setup");
        };
        assert_eq!(target.texture().mip_level_count(), 1, "{slot:?}");
    }
    Ok(())
}

#[test]
fn zero_sized_target_fails_setup() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let mut pipeline = gpu.pipeline()?;

    let result = pipeline.setup(CameraTargetDesc::new(0, 720, COLOR_FORMAT), &config());
    assert_eq!(
        result,
        Err(FogError::InvalidTarget {
            width: 0,
            height: 720
        })
    );
    assert!(!pipeline.is_ready());
    assert!(!pipeline.targets().is_allocated());
    Ok(())
}

// ============================================================================
// Program Tests
// ============================================================================

#[test]
fn unknown_entry_point_fails_setup_instead_of_execute() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let program = FogProgramDescriptor::builtin().with_pass("Copy Depth", "fs_copy_depht");
    let mut pipeline = gpu.pipeline_with(program)?;

    let result = pipeline.setup(CameraTargetDesc::new(64, 64, COLOR_FORMAT), &config());
    assert!(matches!(result, Err(FogError::InvalidProgram(_))), "{result:?}");
    assert!(!pipeline.is_ready());

    let host = host_targets(&gpu.device, 64, 64);
    pipeline.publish_fog(Some(&GlobalFogState::default()));
    let frame = FogFrame::new(CameraKind::Game, &host.color, &host.depth_view, eye(), 0.1);
    let mut encoder = gpu.encoder();
    assert_eq!(
        pipeline.execute(&frame, &mut encoder),
        FrameOutcome::Skipped(SkipReason::NotSetUp)
    );
    gpu.queue.submit(Some(encoder.finish()));
    Ok(())
}

#[test]
fn invalid_wgsl_is_rejected_and_previous_program_kept() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let broken = FogProgramDescriptor::new("Broken", "fn broken( {", "vs_main")?;

    assert!(matches!(
        FogRenderPipeline::new(&gpu.device, &gpu.queue, broken.clone()),
        Err(FogError::InvalidProgram(_))
    ));

    let mut pipeline = gpu.pipeline()?;
    assert!(matches!(
        pipeline.set_program(broken),
        Err(FogError::InvalidProgram(_))
    ));
    pipeline.setup(CameraTargetDesc::new(64, 64, COLOR_FORMAT), &config())?;
    assert!(pipeline.is_ready());
    Ok(())
}

// ============================================================================
// Volume Upload Tests
// ============================================================================

#[test]
fn zero_volumes_leave_keywords_off_and_no_buffer() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let mut pipeline = gpu.pipeline()?;
    pipeline.setup(CameraTargetDesc::new(800, 600, COLOR_FORMAT), &config())?;

    pipeline.publish_fog(Some(&GlobalFogState::default()));
    assert_eq!(pipeline.upload_volumes(&[]), VolumeUpload::Empty);

    assert!(!pipeline.keywords().contains(FogKeywords::VOLUMES));
    assert!(!pipeline.keywords().contains(FogKeywords::HEIGHT_FOG));
    assert!(pipeline.volume_buffer().buffer().is_none());
    Ok(())
}

#[test]
fn volume_buffer_is_reused_for_same_count() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let mut pipeline = gpu.pipeline()?;

    let volumes = [
        FogVolume::new(Vec3::ZERO, 5.0),
        FogVolume::new(Vec3::new(10.0, 0.0, 0.0), 2.0),
    ];
    assert_eq!(
        pipeline.upload_volumes(&volumes),
        VolumeUpload::Allocate { size: 72 }
    );
    assert!(pipeline.keywords().contains(FogKeywords::VOLUMES));
    let id = pipeline.volume_buffer().buffer().map(|b| b.id());

    assert_eq!(pipeline.upload_volumes(&volumes), VolumeUpload::Rewrite);
    assert_eq!(pipeline.volume_buffer().buffer().map(|b| b.id()), id);

    assert_eq!(pipeline.upload_volumes(&volumes[..1]), VolumeUpload::Allocate { size: 36 });
    assert_ne!(pipeline.volume_buffer().buffer().map(|b| b.id()), id);

    assert_eq!(pipeline.upload_volumes(&[]), VolumeUpload::Empty);
    assert!(pipeline.volume_buffer().buffer().is_none());
    assert!(!pipeline.keywords().contains(FogKeywords::VOLUMES));
    Ok(())
}

#[test]
fn storage_buffer_holds_packed_records() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let mut pipeline = gpu.pipeline()?;
    let fog = GlobalFogState::new(FogSettings {
        color: Vec3::new(0.2, 0.3, 0.4),
        ..Default::default()
    });
    pipeline.publish_fog(Some(&fog));

    let volumes = [
        FogVolume::new(Vec3::new(1.0, 2.0, 3.0), 4.0)
            .with_density(0.5)
            .with_fade(0.25),
        FogVolume::new(Vec3::new(-5.0, 0.0, 5.0), 2.0).with_color(Vec3::new(1.0, 0.0, 0.0)),
    ];
    // Rewrite goes through queue.write_buffer rather than buffer init.
    pipeline.upload_volumes(&volumes);
    assert_eq!(pipeline.upload_volumes(&volumes), VolumeUpload::Rewrite);

    let Some(buffer) = pipeline.volume_buffer().buffer() else {
        anyhow::bail!("two volumes allocate a buffer");
    };
    let bytes = read_storage(&gpu, buffer)?;
    assert_eq!(bytes.len(), 72);

    let expected = VolumeBuffer::pack(&volumes, Vec3::new(0.2, 0.3, 0.4));
    assert_eq!(bytes.as_slice(), bytemuck::cast_slice::<_, u8>(&expected));

    let floats: Vec<f32> = bytemuck::pod_collect_to_vec(&bytes);
    assert_eq!(&floats[..9], &[1.0, 2.0, 3.0, 4.0, 0.5, 0.2, 0.3, 0.4, 0.25]);
    assert_eq!(&floats[9..18], &[-5.0, 0.0, 5.0, 2.0, 1.0, 1.0, 0.0, 0.0, 0.5]);
    Ok(())
}

// ============================================================================
// Execute Tests
// ============================================================================

#[test]
fn preview_camera_touches_no_gpu_state() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let host = host_targets(&gpu.device, 320, 240);
    let scene = FogScene::with_fog(GlobalFogState::default());
    let mut feature = FogRenderFeature::default();

    let frame = FogFrame::new(CameraKind::Preview, &host.color, &host.depth_view, eye(), 0.1);
    let mut encoder = gpu.encoder();
    let outcome = feature.record(gpu.ctx(), &frame, &scene, &mut encoder)?;

    assert_eq!(outcome, FrameOutcome::Skipped(SkipReason::PreviewCamera));
    assert!(feature.pipeline().is_none());
    gpu.queue.submit(Some(encoder.finish()));
    Ok(())
}

#[test]
fn preview_execute_leaves_color_target_unmodified() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let host = host_targets(&gpu.device, 64, 32);
    let before = fill_color(&gpu, &host.color);

    let mut pipeline = gpu.pipeline()?;
    pipeline.setup(CameraTargetDesc::from_texture(&host.color), &config())?;
    pipeline.publish_fog(Some(&GlobalFogState::default()));
    pipeline.upload_volumes(&[FogVolume::new(Vec3::ZERO, 3.0)]);

    let frame = FogFrame::new(CameraKind::Preview, &host.color, &host.depth_view, eye(), 0.1);
    let mut encoder = gpu.encoder();
    assert_eq!(
        pipeline.execute(&frame, &mut encoder),
        FrameOutcome::Skipped(SkipReason::PreviewCamera)
    );
    gpu.queue.submit(Some(encoder.finish()));

    assert_eq!(read_color(&gpu, &host.color)?, before);
    Ok(())
}

#[test]
fn disabled_feature_allocates_nothing() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let host = host_targets(&gpu.device, 64, 64);
    let scene = FogScene::with_fog(GlobalFogState::default());
    let mut feature = FogRenderFeature::new(config());
    feature.set_enabled(false);

    let frame = FogFrame::new(CameraKind::Game, &host.color, &host.depth_view, eye(), 0.1);
    let mut encoder = gpu.encoder();
    let outcome = feature.record(gpu.ctx(), &frame, &scene, &mut encoder)?;
    gpu.queue.submit(Some(encoder.finish()));

    assert_eq!(outcome, FrameOutcome::Skipped(SkipReason::Disabled));
    assert!(feature.pipeline().is_none());
    Ok(())
}

#[test]
fn missing_fog_state_skips_execute() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let host = host_targets(&gpu.device, 320, 240);
    let scene = FogScene::new();
    let mut feature = FogRenderFeature::new(config());

    let frame = FogFrame::new(CameraKind::Game, &host.color, &host.depth_view, eye(), 0.1);
    let mut encoder = gpu.encoder();
    let outcome = feature.record(gpu.ctx(), &frame, &scene, &mut encoder)?;

    assert_eq!(outcome, FrameOutcome::Skipped(SkipReason::NoFogState));
    gpu.queue.submit(Some(encoder.finish()));
    Ok(())
}

#[test]
fn execute_before_setup_is_skipped() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let host = host_targets(&gpu.device, 64, 64);
    let mut pipeline = gpu.pipeline()?;
    pipeline.publish_fog(Some(&GlobalFogState::default()));

    let frame = FogFrame::new(CameraKind::Game, &host.color, &host.depth_view, eye(), 0.1);
    let mut encoder = gpu.encoder();
    assert_eq!(
        pipeline.execute(&frame, &mut encoder),
        FrameOutcome::Skipped(SkipReason::NotSetUp)
    );
    Ok(())
}

#[test]
fn full_frame_encodes_seven_passes() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let host = host_targets(&gpu.device, 320, 180);
    let mut scene = FogScene::with_fog(GlobalFogState::default());
    scene.spawn_volume(FogVolumeSettings::default(), glam::Affine3A::IDENTITY);

    let mut feature = FogRenderFeature::new(config());
    let frame = FogFrame::new(CameraKind::Game, &host.color, &host.depth_view, eye(), 0.1)
        .with_time(1.5);

    let mut encoder = gpu.encoder();
    let outcome = feature.record(gpu.ctx(), &frame, &scene, &mut encoder)?;
    gpu.queue.submit(Some(encoder.finish()));

    assert_eq!(outcome, FrameOutcome::Rendered { draws: 7 });
    let Some(pipeline) = feature.pipeline() else {
        anyhow::bail!("pipeline is created on the first rendered frame");
    };
    assert!(pipeline.keywords().contains(FogKeywords::VOLUMES));
    // Five base variants from setup plus Render Fog with VOLUMES.
    assert_eq!(pipeline.variant_count(), 6);

    // Dropping the volume switches back to the base Render Fog variant.
    scene.clear();
    let mut encoder = gpu.encoder();
    let outcome = feature.record(gpu.ctx(), &frame, &scene, &mut encoder)?;
    gpu.queue.submit(Some(encoder.finish()));

    assert!(outcome.is_rendered());
    let Some(pipeline) = feature.pipeline() else {
        anyhow::bail!("pipeline survives between frames");
    };
    assert!(!pipeline.keywords().contains(FogKeywords::VOLUMES));
    assert_eq!(pipeline.variant_count(), 6);
    Ok(())
}

#[test]
fn zero_density_frame_preserves_color() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let host = host_targets(&gpu.device, 64, 32);
    let before = fill_color(&gpu, &host.color);

    let scene = FogScene::with_fog(GlobalFogState::new(FogSettings {
        density: 0.0,
        ..Default::default()
    }));
    let mut feature = FogRenderFeature::new(config());
    let frame = FogFrame::new(CameraKind::Game, &host.color, &host.depth_view, eye(), 0.1);

    let mut encoder = gpu.encoder();
    let outcome = feature.record(gpu.ctx(), &frame, &scene, &mut encoder)?;
    gpu.queue.submit(Some(encoder.finish()));
    assert_eq!(outcome, FrameOutcome::Rendered { draws: 7 });

    let after = read_color(&gpu, &host.color)?;
    assert_eq!(after.len(), before.len());
    for (index, (&a, &b)) in after.iter().zip(&before).enumerate() {
        assert!(a.abs_diff(b) <= 1, "byte {index}: {a} != {b}");
    }
    Ok(())
}

#[test]
fn failing_variant_skips_the_whole_frame() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    // Compiles with VOLUMES off; the VOLUMES variant divides by zero.
    let source = BUILTIN_FOG_WGSL.replace(
        "return vec4<f32>(scattered, transmittance);",
        "return vec4<f32>(scattered, transmittance * f32(VFOG_VOLUME_GUARD));",
    ) + "\noverride VFOG_VOLUME_GUARD: i32 = 1 / i32(!VFOG_VOLUMES);\n";
    let program = FogPass::ALL.into_iter().fold(
        FogProgramDescriptor::new("Guarded", source, "vs_main")?,
        |program, pass| {
            let entry = FogProgramDescriptor::builtin()
                .find_pass(pass.name())
                .map(str::to_owned)
                .unwrap_or_default();
            program.with_pass(pass.name(), entry)
        },
    );

    let host = host_targets(&gpu.device, 64, 32);
    let before = fill_color(&gpu, &host.color);

    let mut pipeline = gpu.pipeline_with(program)?;
    pipeline.setup(CameraTargetDesc::from_texture(&host.color), &config())?;
    pipeline.publish_fog(Some(&GlobalFogState::default()));
    pipeline.upload_volumes(&[FogVolume::new(Vec3::ZERO, 3.0)]);

    let frame = FogFrame::new(CameraKind::Game, &host.color, &host.depth_view, eye(), 0.1);
    let mut encoder = gpu.encoder();
    assert_eq!(
        pipeline.execute(&frame, &mut encoder),
        FrameOutcome::Skipped(SkipReason::MissingResources)
    );
    gpu.queue.submit(Some(encoder.finish()));

    assert_eq!(read_color(&gpu, &host.color)?, before);
    Ok(())
}

#[test]
fn resized_target_is_set_up_again_by_the_feature() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let scene = FogScene::with_fog(GlobalFogState::default());
    let mut feature = FogRenderFeature::new(config());

    for (width, height) in [(200, 100), (300, 150)] {
        let host = host_targets(&gpu.device, width, height);
        let frame = FogFrame::new(CameraKind::SceneView, &host.color, &host.depth_view, eye(), 0.1);
        let mut encoder = gpu.encoder();
        let outcome = feature.record(gpu.ctx(), &frame, &scene, &mut encoder)?;
        gpu.queue.submit(Some(encoder.finish()));
        assert!(outcome.is_rendered());
    }

    let desc = feature.pipeline().and_then(|p| p.target_desc().copied());
    assert_eq!(desc.map(|d| (d.width, d.height)), Some((300, 150)));
    Ok(())
}

// ============================================================================
// Dispose Tests
// ============================================================================

#[test]
fn dispose_is_idempotent() -> anyhow::Result<()> {
    let Some(gpu) = gpu() else {
        return Ok(());
    };
    let mut pipeline = gpu.pipeline()?;

    // Nothing allocated yet.
    pipeline.dispose();

    pipeline.setup(CameraTargetDesc::new(256, 256, COLOR_FORMAT), &config())?;
    pipeline.upload_volumes(&[FogVolume::new(Vec3::ZERO, 1.0)]);
    pipeline.dispose();

    assert!(!pipeline.targets().is_allocated());
    assert!(pipeline.volume_buffer().buffer().is_none());
    assert!(!pipeline.is_ready());
    assert!(!pipeline.keywords().contains(FogKeywords::VOLUMES));

    pipeline.dispose();
    Ok(())
}
