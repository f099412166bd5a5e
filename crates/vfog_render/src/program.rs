//! Fog Program Contract
//!
//! The fog effect is driven by one WGSL module exposing a full-screen
//! vertex entry point and one fragment entry point per program pass. A
//! [`FogProgramDescriptor`] names that module and maps each stable pass name
//! to its fragment entry point.
//!
//! | Pass              | Group 1 bindings                                      |
//! |-------------------|-------------------------------------------------------|
//! | `Copy Depth`      | scene depth                                           |
//! | `Render Fog`      | half depth, blue noise 2D, noise 3D, curl noise 3D    |
//! | `Blur Horizontal` | source fog, half depth                                |
//! | `Blur Vertical`   | source fog, half depth                                |
//! | `Apply Fog`       | color copy, blurred fog, half depth, scene depth      |
//!
//! Group 0 is shared by all passes (globals, settings, camera, samplers).
//! `Render Fog` additionally binds the volume array at group 2 when the
//! `VOLUMES` keyword is on. Programs must declare the `VFOG_HEIGHT_FOG` and
//! `VFOG_VOLUMES` overrides with defaults.

use std::borrow::Cow;

use rustc_hash::FxHashMap;
use vfog_core::{FogError, Result};

/// Built-in fog program (reverse-Z depth).
pub const BUILTIN_FOG_WGSL: &str = include_str!("shaders/vfog.wgsl");

/// The five program passes, in pipeline order of first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FogPass {
    CopyDepth,
    RenderFog,
    BlurHorizontal,
    BlurVertical,
    ApplyFog,
}

impl FogPass {
    pub const ALL: [FogPass; 5] = [
        FogPass::CopyDepth,
        FogPass::RenderFog,
        FogPass::BlurHorizontal,
        FogPass::BlurVertical,
        FogPass::ApplyFog,
    ];

    /// Stable name used for pass-table lookup.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::CopyDepth => "Copy Depth",
            Self::RenderFog => "Render Fog",
            Self::BlurHorizontal => "Blur Horizontal",
            Self::BlurVertical => "Blur Vertical",
            Self::ApplyFog => "Apply Fog",
        }
    }

    /// Index into per-pass arrays.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether the pass writes the half-resolution targets.
    #[must_use]
    pub fn is_half_resolution(self) -> bool {
        !matches!(self, Self::ApplyFog)
    }
}

/// WGSL source plus the pass table of a fog program.
#[derive(Debug, Clone)]
pub struct FogProgramDescriptor {
    pub label: String,
    pub source: Cow<'static, str>,
    pub vertex_entry: String,
    passes: FxHashMap<String, String>,
}

impl FogProgramDescriptor {
    /// Creates a program with an empty pass table.
    pub fn new(
        label: impl Into<String>,
        source: impl Into<Cow<'static, str>>,
        vertex_entry: impl Into<String>,
    ) -> Result<Self> {
        let descriptor = Self {
            label: label.into(),
            source: source.into(),
            vertex_entry: vertex_entry.into(),
            passes: FxHashMap::default(),
        };

        if descriptor.source.trim().is_empty() {
            return Err(FogError::InvalidProgram(format!(
                "program '{}' has no source",
                descriptor.label
            )));
        }
        if descriptor.vertex_entry.is_empty() {
            return Err(FogError::InvalidProgram(format!(
                "program '{}' has no vertex entry point",
                descriptor.label
            )));
        }
        Ok(descriptor)
    }

    /// The bundled program with its standard pass table.
    #[must_use]
    pub fn builtin() -> Self {
        let passes = [
            (FogPass::CopyDepth, "fs_copy_depth"),
            (FogPass::RenderFog, "fs_render_fog"),
            (FogPass::BlurHorizontal, "fs_blur_horizontal"),
            (FogPass::BlurVertical, "fs_blur_vertical"),
            (FogPass::ApplyFog, "fs_apply_fog"),
        ]
        .into_iter()
        .map(|(pass, entry)| (pass.name().to_owned(), entry.to_owned()))
        .collect();

        Self {
            label: "VFog Program".to_owned(),
            source: Cow::Borrowed(BUILTIN_FOG_WGSL),
            vertex_entry: "vs_main".to_owned(),
            passes,
        }
    }

    /// Maps a pass name to a fragment entry point.
    #[must_use]
    pub fn with_pass(mut self, name: impl Into<String>, fragment_entry: impl Into<String>) -> Self {
        self.passes.insert(name.into(), fragment_entry.into());
        self
    }

    /// Fragment entry point registered under `name`.
    #[must_use]
    pub fn find_pass(&self, name: &str) -> Option<&str> {
        self.passes.get(name).map(String::as_str)
    }

    /// Looks up all five passes by name.
    pub fn resolve(&self) -> Result<ResolvedPasses> {
        let mut entries: [String; 5] = Default::default();
        for pass in FogPass::ALL {
            let entry = self
                .find_pass(pass.name())
                .filter(|entry| !entry.is_empty())
                .ok_or_else(|| FogError::MissingPass {
                    pass: pass.name().to_owned(),
                })?;
            entries[pass.index()] = entry.to_owned();
        }
        Ok(ResolvedPasses { entries })
    }
}

/// Fragment entry points of all five passes, indexed by [`FogPass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPasses {
    entries: [String; 5],
}

impl ResolvedPasses {
    #[inline]
    #[must_use]
    pub fn entry(&self, pass: FogPass) -> &str {
        &self.entries[pass.index()]
    }
}
