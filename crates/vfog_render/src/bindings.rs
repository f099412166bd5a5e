//! Bind Group Layouts and Fallback Resources
//!
//! | Group | Scope             | Contents                                        |
//! |-------|-------------------|-------------------------------------------------|
//! | 0     | every pass        | globals, settings, camera, two samplers         |
//! | 1     | per program pass  | the pass inputs, one texture per binding        |
//! | 2     | `Render Fog` only | read-only `array<FogVolume>`                    |
//!
//! Missing host noise textures are replaced by 1-texel fallbacks so the
//! `Render Fog` bind group can always be built.

use vfog_core::Tracked;
use vfog_resources::GpuFogVolume;
use wgpu::util::DeviceExt;

use crate::program::FogPass;

// ============================================================================
// Layouts
// ============================================================================

/// All bind group layouts used by the fog program.
pub struct FogBindingLayouts {
    pub globals: Tracked<wgpu::BindGroupLayout>,
    passes: [Tracked<wgpu::BindGroupLayout>; 5],
    pub volumes: Tracked<wgpu::BindGroupLayout>,
}

impl FogBindingLayouts {
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let globals = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("VFog Globals Layout"),
            entries: &[
                uniform_entry(0),
                uniform_entry(1),
                uniform_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let passes = FogPass::ALL.map(|pass| {
            Tracked::new(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(pass.name()),
                entries: &pass_layout_entries(pass),
            }))
        });

        let volumes = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("VFog Volumes Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        Self {
            globals: Tracked::new(globals),
            passes,
            volumes: Tracked::new(volumes),
        }
    }

    /// Group 1 layout of `pass`.
    #[inline]
    #[must_use]
    pub fn pass(&self, pass: FogPass) -> &Tracked<wgpu::BindGroupLayout> {
        &self.passes[pass.index()]
    }

    /// Pipeline layout for `pass`: groups 0 and 1, plus group 2 for `Render Fog`.
    #[must_use]
    pub fn pipeline_layout(&self, device: &wgpu::Device, pass: FogPass) -> wgpu::PipelineLayout {
        let pass_layout: &wgpu::BindGroupLayout = self.pass(pass);
        let globals: &wgpu::BindGroupLayout = &self.globals;
        let volumes: &wgpu::BindGroupLayout = &self.volumes;

        let with_volumes = [Some(globals), Some(pass_layout), Some(volumes)];
        let bind_group_layouts = if pass == FogPass::RenderFog {
            &with_volumes[..]
        } else {
            &with_volumes[..2]
        };

        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(pass.name()),
            bind_group_layouts,
            immediate_size: 0,
        })
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(
    binding: u32,
    sample_type: wgpu::TextureSampleType,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

/// Group 1 entries of `pass`, in binding order.
///
/// Scene depth is bound as unfilterable float rather than depth, so the
/// program reads it with a plain `textureLoad` on every backend.
#[must_use]
pub fn pass_layout_entries(pass: FogPass) -> Vec<wgpu::BindGroupLayoutEntry> {
    use wgpu::TextureSampleType as Sample;
    use wgpu::TextureViewDimension as Dim;

    let filterable = Sample::Float { filterable: true };
    let unfilterable = Sample::Float { filterable: false };

    match pass {
        FogPass::CopyDepth => vec![texture_entry(0, unfilterable, Dim::D2)],
        FogPass::RenderFog => vec![
            texture_entry(0, unfilterable, Dim::D2),
            texture_entry(1, filterable, Dim::D2),
            texture_entry(2, filterable, Dim::D3),
            texture_entry(3, filterable, Dim::D3),
        ],
        FogPass::BlurHorizontal | FogPass::BlurVertical => vec![
            texture_entry(0, filterable, Dim::D2),
            texture_entry(1, unfilterable, Dim::D2),
        ],
        FogPass::ApplyFog => vec![
            texture_entry(0, unfilterable, Dim::D2),
            texture_entry(1, filterable, Dim::D2),
            texture_entry(2, unfilterable, Dim::D2),
            texture_entry(3, unfilterable, Dim::D2),
        ],
    }
}

// ============================================================================
// Fallbacks
// ============================================================================

/// 1-texel stand-ins for host textures, plus a one-record volume array.
pub struct FogFallbacks {
    pub blue_noise: Tracked<wgpu::TextureView>,
    pub noise: Tracked<wgpu::TextureView>,
    pub curl_noise: Tracked<wgpu::TextureView>,
    /// Bound at group 2 while no volume buffer exists.
    pub volumes: Tracked<wgpu::Buffer>,
}

impl FogFallbacks {
    #[must_use]
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        // Mid-grey blue noise (no jitter), full-density noise, zero curl.
        let blue_noise = texel(
            device,
            queue,
            "VFog Fallback Blue Noise",
            wgpu::TextureDimension::D2,
            [128, 128, 128, 255],
        );
        let noise = texel(
            device,
            queue,
            "VFog Fallback Noise",
            wgpu::TextureDimension::D3,
            [255; 4],
        );
        let curl_noise = texel(
            device,
            queue,
            "VFog Fallback Curl Noise",
            wgpu::TextureDimension::D3,
            [128, 128, 128, 255],
        );

        let volumes = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("VFog Placeholder Volume"),
            contents: bytemuck::bytes_of(&GpuFogVolume::default()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        Self {
            blue_noise,
            noise,
            curl_noise,
            volumes: Tracked::new(volumes),
        }
    }
}

fn texel(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &'static str,
    dimension: wgpu::TextureDimension,
    rgba: [u8; 4],
) -> Tracked<wgpu::TextureView> {
    let size = wgpu::Extent3d {
        width: 1,
        height: 1,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: Some(1),
        },
        size,
    );

    Tracked::new(texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(label),
        ..Default::default()
    }))
}
