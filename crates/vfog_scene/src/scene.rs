//! Fog Scene Context
//!
//! [`FogScene`] is the explicit per-scene owner of everything the fog
//! renderer reads from the scene:
//!
//! - the fog volume node pool (`SlotMap`)
//! - the [`VolumeRegistry`] of active volumes
//! - the optional [`GlobalFogState`]
//!
//! The frame driver owns one `FogScene` per scene and hands a shared
//! reference to the render feature each frame.
//!
//! # Frame Order
//!
//! ```text
//! edit nodes ─► FogScene::update() ─► FogScene::snapshot() ─► upload
//! ```

use glam::Affine3A;
use slotmap::SlotMap;
use vfog_resources::{FogVolumeSettings, GlobalFogState};

use crate::node::{FogVolumeKey, FogVolumeNode};
use crate::registry::{VolumeRegistry, VolumeSnapshot};

#[derive(Debug, Default)]
pub struct FogScene {
    nodes: SlotMap<FogVolumeKey, FogVolumeNode>,
    registry: VolumeRegistry,
    fog: Option<GlobalFogState>,
}

impl FogScene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scene that starts with `fog` as its global state.
    #[must_use]
    pub fn with_fog(fog: GlobalFogState) -> Self {
        Self {
            fog: Some(fog),
            ..Self::default()
        }
    }

    // ========================================================================
    // Volumes
    // ========================================================================

    /// Creates an active fog volume node.
    pub fn spawn_volume(&mut self, settings: FogVolumeSettings, transform: Affine3A) -> FogVolumeKey {
        let key = self.nodes.insert(FogVolumeNode::new(settings, transform));
        if let Some(node) = self.nodes.get_mut(key) {
            node.on_activate(key, &mut self.registry);
        }
        log::debug!("Spawned fog volume {key:?}");
        key
    }

    /// Enables or disables a volume. Returns whether registry membership changed.
    pub fn set_volume_active(&mut self, key: FogVolumeKey, active: bool) -> bool {
        let Some(node) = self.nodes.get_mut(key) else {
            log::warn!("Ignoring activation change for stale fog volume {key:?}");
            return false;
        };

        if active {
            node.update();
            node.on_activate(key, &mut self.registry)
        } else {
            node.on_deactivate(key, &mut self.registry)
        }
    }

    /// Destroys a volume node, unregistering it first.
    pub fn despawn_volume(&mut self, key: FogVolumeKey) -> Option<FogVolumeNode> {
        let mut node = self.nodes.remove(key)?;
        node.on_deactivate(key, &mut self.registry);
        log::debug!("Despawned fog volume {key:?}");
        Some(node)
    }

    #[must_use]
    pub fn volume(&self, key: FogVolumeKey) -> Option<&FogVolumeNode> {
        self.nodes.get(key)
    }

    pub fn volume_mut(&mut self, key: FogVolumeKey) -> Option<&mut FogVolumeNode> {
        self.nodes.get_mut(key)
    }

    #[inline]
    #[must_use]
    pub fn volume_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &VolumeRegistry {
        &self.registry
    }

    /// Refreshes every node's volume from its transform and settings.
    pub fn update(&mut self) {
        for node in self.nodes.values_mut() {
            node.update();
        }
    }

    /// Copies the active volumes for this frame, in registration order.
    #[must_use]
    pub fn snapshot(&self) -> VolumeSnapshot {
        self.registry.snapshot(&self.nodes)
    }

    // ========================================================================
    // Global Fog
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn fog(&self) -> Option<&GlobalFogState> {
        self.fog.as_ref()
    }

    #[inline]
    pub fn fog_mut(&mut self) -> Option<&mut GlobalFogState> {
        self.fog.as_mut()
    }

    /// Replaces the global fog state, returning the previous one.
    pub fn set_fog(&mut self, fog: Option<GlobalFogState>) -> Option<GlobalFogState> {
        std::mem::replace(&mut self.fog, fog)
    }

    /// Turns the global fog on. Returns `false` when there is no fog state.
    pub fn enable_fog(&mut self) -> bool {
        self.set_fog_enabled(true)
    }

    /// Turns the global fog off. Returns `false` when there is no fog state.
    pub fn disable_fog(&mut self) -> bool {
        self.set_fog_enabled(false)
    }

    fn set_fog_enabled(&mut self, enabled: bool) -> bool {
        match self.fog.as_mut() {
            Some(fog) => {
                fog.settings.enabled = enabled;
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Drops every volume node and empties the registry.
    ///
    /// The global fog state is kept.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.nodes.clear();
    }
}
