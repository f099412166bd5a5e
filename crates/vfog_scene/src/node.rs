//! Fog Volume Nodes
//!
//! A [`FogVolumeNode`] owns the authoring settings and world transform of a
//! local fog volume, plus the derived [`FogVolume`] record consumed by the
//! renderer. The derived record is refreshed by [`FogVolumeNode::update`]:
//!
//! - `position` is the world translation
//! - `radius` is the length of the world scale vector, so a unit-scale node
//!   has radius `sqrt(3)`

use glam::Affine3A;
use slotmap::new_key_type;
use vfog_resources::{FogVolume, FogVolumeSettings};

use crate::registry::VolumeRegistry;

new_key_type! {
    /// Handle of a fog volume node inside a [`FogScene`](crate::FogScene).
    pub struct FogVolumeKey;
}

#[derive(Debug, Clone)]
pub struct FogVolumeNode {
    pub settings: FogVolumeSettings,
    pub transform: Affine3A,
    volume: FogVolume,
    active: bool,
}

impl FogVolumeNode {
    #[must_use]
    pub fn new(settings: FogVolumeSettings, transform: Affine3A) -> Self {
        let mut node = Self {
            settings,
            transform,
            volume: FogVolume::default(),
            active: false,
        };
        node.update();
        node
    }

    /// Derived volume record as of the last [`update`](Self::update).
    #[inline]
    #[must_use]
    pub fn volume(&self) -> &FogVolume {
        &self.volume
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Registers the node's volume. Returns whether membership changed.
    pub fn on_activate(&mut self, key: FogVolumeKey, registry: &mut VolumeRegistry) -> bool {
        self.active = true;
        registry.add(key)
    }

    /// Unregisters the node's volume. Returns whether membership changed.
    pub fn on_deactivate(&mut self, key: FogVolumeKey, registry: &mut VolumeRegistry) -> bool {
        self.active = false;
        registry.remove(key)
    }

    /// Refreshes the derived volume from the transform and settings.
    pub fn update(&mut self) {
        let (scale, _, translation) = self.transform.to_scale_rotation_translation();
        let settings = self.settings.clamped();

        self.volume = FogVolume {
            position: translation,
            radius: scale.length(),
            density_multiplier: settings.density_multiplier,
            color_override: settings.color_override(),
            fade: settings.fade,
        };
    }
}
