//! Fog Render Targets
//!
//! The pipeline owns five textures, all sized from the camera's
//! [`CameraTargetDesc`]:
//!
//! | Slot        | Size | Format                   | Usage                      |
//! |-------------|------|--------------------------|----------------------------|
//! | `ColorCopy` | full | camera format            | copy destination, sampled  |
//! | `Fog`       | half | `Rgba16Float`            | render attachment, sampled |
//! | `Blur0`     | half | `Rgba16Float`            | render attachment, sampled |
//! | `Blur1`     | half | `Rgba16Float`            | render attachment, sampled |
//! | `HalfDepth` | half | `R32Float` or `R16Float` | render attachment, sampled |
//!
//! Half size is `floor(size / 2)`, clamped to one texel. Every target has a
//! single mip level.
//!
//! # Formats
//!
//! [`FogFormats`] picks the half-resolution formats a device can render to.
//! Downlevel adapters (GL, WebGL2) often refuse `R32Float` as a render
//! attachment; the half depth then falls back to `R16Float`.
//!
//! # Reallocation
//!
//! [`FogTargets::ensure`] compares each slot's [`TargetSpec`] against the
//! wanted one and only recreates mismatching slots. Each allocation is
//! wrapped in [`Tracked`], so an unchanged id means the texture survived.

use vfog_core::{FogError, Result, Tracked};

use crate::camera::CameraTargetDesc;

/// Format of the fog accumulation and blur targets.
pub const FOG_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Preferred format of the half-resolution depth target.
pub const HALF_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
/// Half depth format used when [`HALF_DEPTH_FORMAT`] is not renderable.
pub const HALF_DEPTH_FALLBACK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R16Float;

const HALF_TARGET_USAGE: wgpu::TextureUsages =
    wgpu::TextureUsages::RENDER_ATTACHMENT.union(wgpu::TextureUsages::TEXTURE_BINDING);

// ============================================================================
// Formats
// ============================================================================

/// Formats of the half-resolution targets on one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FogFormats {
    pub fog: wgpu::TextureFormat,
    pub half_depth: wgpu::TextureFormat,
}

impl Default for FogFormats {
    /// Formats every WebGPU-compliant device supports.
    fn default() -> Self {
        Self {
            fog: FOG_TARGET_FORMAT,
            half_depth: HALF_DEPTH_FORMAT,
        }
    }
}

impl FogFormats {
    /// Picks formats from the features `features_of` reports per format.
    pub fn select(
        features_of: impl Fn(wgpu::TextureFormat) -> wgpu::TextureFormatFeatures,
    ) -> Result<Self> {
        let renderable = |format: wgpu::TextureFormat| {
            features_of(format).allowed_usages.contains(HALF_TARGET_USAGE)
        };

        let fog_features = features_of(FOG_TARGET_FORMAT);
        if !renderable(FOG_TARGET_FORMAT)
            || !fog_features
                .flags
                .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
        {
            return Err(FogError::UnsupportedDevice(format!(
                "{FOG_TARGET_FORMAT:?} is not a filterable render target"
            )));
        }

        let half_depth = [HALF_DEPTH_FORMAT, HALF_DEPTH_FALLBACK_FORMAT]
            .into_iter()
            .find(|&format| renderable(format))
            .ok_or_else(|| {
                FogError::UnsupportedDevice("no renderable half depth format".to_owned())
            })?;

        Ok(Self {
            fog: FOG_TARGET_FORMAT,
            half_depth,
        })
    }

    /// Formats usable on a device created from `adapter` with `device_features`.
    pub fn for_adapter(adapter: &wgpu::Adapter, device_features: wgpu::Features) -> Result<Self> {
        let downlevel = !adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::WEBGPU_TEXTURE_FORMAT_SUPPORT);
        let adapter_specific =
            device_features.contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);

        let formats = Self::select(|format| {
            if downlevel || adapter_specific {
                adapter.get_texture_format_features(format)
            } else {
                format.guaranteed_format_features(device_features)
            }
        })?;

        if formats.half_depth != HALF_DEPTH_FORMAT {
            log::info!(
                "{HALF_DEPTH_FORMAT:?} is not renderable here, half depth uses {:?}",
                formats.half_depth
            );
        }
        Ok(formats)
    }
}

// ============================================================================
// Targets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FogTargetSlot {
    ColorCopy,
    Fog,
    Blur0,
    Blur1,
    HalfDepth,
}

impl FogTargetSlot {
    pub const ALL: [FogTargetSlot; 5] = [
        FogTargetSlot::ColorCopy,
        FogTargetSlot::Fog,
        FogTargetSlot::Blur0,
        FogTargetSlot::Blur1,
        FogTargetSlot::HalfDepth,
    ];

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ColorCopy => "VFog Color Copy",
            Self::Fog => "VFog Fog Target",
            Self::Blur0 => "VFog Blur Target 0",
            Self::Blur1 => "VFog Blur Target 1",
            Self::HalfDepth => "VFog Half Depth",
        }
    }

    /// Wanted texture spec for this slot under `desc`.
    #[must_use]
    pub fn spec(self, desc: &CameraTargetDesc, formats: &FogFormats) -> TargetSpec {
        let (half_width, half_height) = desc.half_size();
        let half = |format| TargetSpec {
            width: half_width,
            height: half_height,
            format,
            usage: HALF_TARGET_USAGE,
        };

        match self {
            Self::ColorCopy => TargetSpec {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::TEXTURE_BINDING,
            },
            Self::Fog | Self::Blur0 | Self::Blur1 => half(formats.fog),
            Self::HalfDepth => half(formats.half_depth),
        }
    }
}

/// Size, format and usage of one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetSpec {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
}

impl TargetSpec {
    /// Whether an existing target with spec `current` must be recreated.
    #[inline]
    #[must_use]
    pub fn needs_realloc(current: Option<&TargetSpec>, wanted: &TargetSpec) -> bool {
        current != Some(wanted)
    }
}

/// One allocated target with its default view.
#[derive(Debug)]
pub struct FogTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    spec: TargetSpec,
}

impl FogTarget {
    fn new(device: &wgpu::Device, label: &'static str, spec: TargetSpec) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: spec.width,
                height: spec.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: spec.format,
            usage: spec.usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            ..Default::default()
        });

        Self {
            texture,
            view,
            spec,
        }
    }

    #[inline]
    #[must_use]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    #[must_use]
    pub fn spec(&self) -> &TargetSpec {
        &self.spec
    }
}

/// The pipeline's five render targets.
#[derive(Debug, Default)]
pub struct FogTargets {
    slots: [Option<Tracked<FogTarget>>; 5],
}

impl FogTargets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every slot match `desc`. Returns the number of slots recreated.
    pub fn ensure(
        &mut self,
        device: &wgpu::Device,
        desc: &CameraTargetDesc,
        formats: &FogFormats,
    ) -> usize {
        let mut reallocated = 0;

        for slot in FogTargetSlot::ALL {
            let wanted = slot.spec(desc, formats);
            let entry = &mut self.slots[slot.index()];

            if !TargetSpec::needs_realloc(entry.as_ref().map(|t| t.spec()), &wanted) {
                continue;
            }

            log::debug!(
                "Allocating {} ({}x{}, {:?})",
                slot.label(),
                wanted.width,
                wanted.height,
                wanted.format
            );
            *entry = Some(Tracked::new(FogTarget::new(device, slot.label(), wanted)));
            reallocated += 1;
        }

        reallocated
    }

    #[inline]
    #[must_use]
    pub fn get(&self, slot: FogTargetSlot) -> Option<&Tracked<FogTarget>> {
        self.slots[slot.index()].as_ref()
    }

    /// Allocation id of `slot`, if allocated.
    #[must_use]
    pub fn id(&self, slot: FogTargetSlot) -> Option<u64> {
        self.get(slot).map(Tracked::id)
    }

    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    /// Drops every target. Returns whether anything was allocated.
    pub fn release(&mut self) -> bool {
        let had_any = self.is_allocated();
        for slot in &mut self.slots {
            if let Some(target) = slot.take() {
                target.texture().destroy();
            }
        }
        had_any
    }
}
