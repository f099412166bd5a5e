//! Fog Parameter Bindings
//!
//! [`FogParameters`] is the explicit replacement for ambient shader globals:
//! everything the fog program reads that is not a render target lives here,
//! and the pipeline binds it into every draw.
//!
//! # Change Tracking
//!
//! Each uniform block carries its own [`ChangeTracker`]. Setters only bump
//! the version when the new value differs, so `publish` can run every frame
//! while the pipeline re-uploads a block only after a real change.
//!
//! # Keywords
//!
//! [`FogKeywords`] are on/off feature switches rather than numeric values.
//! They select pipeline variants (override constants), so a disabled feature
//! is compiled out of the raymarch instead of being multiplied by zero.

use bitflags::bitflags;
use vfog_core::ChangeTracker;

use crate::fog::FogTextures;
use crate::uniforms::{FogCameraUniforms, FogGlobalUniforms, FogSettingsUniforms};

bitflags! {
    /// Feature switches consumed by the `Render Fog` program pass.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct FogKeywords: u32 {
        /// Height-based fog contribution.
        const HEIGHT_FOG = 1 << 0;
        /// Local density volumes (a volume buffer is bound).
        const VOLUMES    = 1 << 1;
    }
}

impl FogKeywords {
    /// Override constant name for each keyword, in bit order.
    pub const OVERRIDE_NAMES: [(FogKeywords, &'static str); 2] = [
        (FogKeywords::HEIGHT_FOG, "VFOG_HEIGHT_FOG"),
        (FogKeywords::VOLUMES, "VFOG_VOLUMES"),
    ];

    /// Pipeline-overridable constants for this keyword set (`0.0` / `1.0`).
    #[must_use]
    pub fn override_constants(self) -> [(&'static str, f64); 2] {
        Self::OVERRIDE_NAMES.map(|(flag, name)| (name, if self.contains(flag) { 1.0 } else { 0.0 }))
    }
}

/// Explicit parameter-binding struct passed into each fog draw.
#[derive(Debug, Clone, Default)]
pub struct FogParameters {
    globals: FogGlobalUniforms,
    settings: FogSettingsUniforms,
    camera: FogCameraUniforms,
    keywords: FogKeywords,
    /// Host-provided noise textures; `None` entries are bound to fallbacks.
    pub textures: FogTextures,

    globals_version: ChangeTracker,
    settings_version: ChangeTracker,
    camera_version: ChangeTracker,
}

impl FogParameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn globals(&self) -> &FogGlobalUniforms {
        &self.globals
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &FogSettingsUniforms {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn camera(&self) -> &FogCameraUniforms {
        &self.camera
    }

    #[inline]
    #[must_use]
    pub fn keywords(&self) -> FogKeywords {
        self.keywords
    }

    /// Returns whether `keyword` is currently enabled.
    #[inline]
    #[must_use]
    pub fn keyword(&self, keyword: FogKeywords) -> bool {
        self.keywords.contains(keyword)
    }

    pub fn set_globals(&mut self, globals: FogGlobalUniforms) {
        if self.globals != globals {
            self.globals = globals;
            self.globals_version.changed();
        }
    }

    pub fn set_settings(&mut self, settings: FogSettingsUniforms) {
        if self.settings != settings {
            self.settings = settings;
            self.settings_version.changed();
        }
    }

    pub fn set_camera(&mut self, camera: FogCameraUniforms) {
        if self.camera != camera {
            self.camera = camera;
            self.camera_version.changed();
        }
    }

    /// Turns one keyword on or off.
    pub fn set_keyword(&mut self, keyword: FogKeywords, enabled: bool) {
        self.keywords.set(keyword, enabled);
    }

    #[inline]
    #[must_use]
    pub fn globals_version(&self) -> u64 {
        self.globals_version.version()
    }

    #[inline]
    #[must_use]
    pub fn settings_version(&self) -> u64 {
        self.settings_version.version()
    }

    #[inline]
    #[must_use]
    pub fn camera_version(&self) -> u64 {
        self.camera_version.version()
    }
}
