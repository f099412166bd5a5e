//! Volume Registry
//!
//! Ordered membership of the fog volumes that are currently enabled and
//! alive. The registry never owns a volume: it stores [`FogVolumeKey`]s into
//! the scene's node pool and resolves them when a frame snapshot is taken.
//!
//! # Ordering
//!
//! Keys keep insertion order so the GPU volume buffer layout is stable from
//! frame to frame. Membership checks go through a hash set; removal is a
//! linear search that preserves the order of the remaining entries.

use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use vfog_resources::FogVolume;

use crate::node::{FogVolumeKey, FogVolumeNode};

#[derive(Debug, Default, Clone)]
pub struct VolumeRegistry {
    order: Vec<FogVolumeKey>,
    members: FxHashSet<FogVolumeKey>,
}

impl VolumeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `key` unless it is already present.
    pub fn add(&mut self, key: FogVolumeKey) -> bool {
        if !self.members.insert(key) {
            return false;
        }
        self.order.push(key);
        true
    }

    /// Removes `key` if present.
    pub fn remove(&mut self, key: FogVolumeKey) -> bool {
        if !self.members.remove(&key) {
            return false;
        }
        if let Some(index) = self.order.iter().position(|&k| k == key) {
            self.order.remove(index);
        }
        true
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: FogVolumeKey) -> bool {
        self.members.contains(&key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registered keys in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = FogVolumeKey> + '_ {
        self.order.iter().copied()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Copies the current volume of every registered node, in order.
    ///
    /// Keys whose node no longer exists in `nodes` are skipped.
    #[must_use]
    pub fn snapshot(&self, nodes: &SlotMap<FogVolumeKey, FogVolumeNode>) -> VolumeSnapshot {
        let volumes = self
            .order
            .iter()
            .filter_map(|&key| nodes.get(key).map(|node| *node.volume()))
            .collect();
        VolumeSnapshot { volumes }
    }
}

/// Immutable per-frame copy of the registered volumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeSnapshot {
    volumes: Vec<FogVolume>,
}

impl VolumeSnapshot {
    #[must_use]
    pub fn new(volumes: Vec<FogVolume>) -> Self {
        Self { volumes }
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[FogVolume] {
        &self.volumes
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FogVolume> {
        self.volumes.iter()
    }
}

impl std::ops::Deref for VolumeSnapshot {
    type Target = [FogVolume];

    fn deref(&self) -> &[FogVolume] {
        &self.volumes
    }
}

impl<'a> IntoIterator for &'a VolumeSnapshot {
    type Item = &'a FogVolume;
    type IntoIter = std::slice::Iter<'a, FogVolume>;

    fn into_iter(self) -> Self::IntoIter {
        self.volumes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Affine3A;
    use vfog_resources::FogVolumeSettings;

    fn pool_with(n: usize) -> (SlotMap<FogVolumeKey, FogVolumeNode>, Vec<FogVolumeKey>) {
        let mut pool = SlotMap::with_key();
        let keys = (0..n)
            .map(|i| {
                let transform = Affine3A::from_translation(glam::Vec3::X * i as f32);
                pool.insert(FogVolumeNode::new(FogVolumeSettings::default(), transform))
            })
            .collect();
        (pool, keys)
    }

    #[test]
    fn duplicate_add_is_noop() {
        let (_, keys) = pool_with(1);
        let mut registry = VolumeRegistry::new();

        assert!(registry.add(keys[0]));
        assert!(!registry.add(keys[0]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn absent_remove_is_noop() {
        let (_, keys) = pool_with(2);
        let mut registry = VolumeRegistry::new();
        registry.add(keys[0]);

        assert!(!registry.remove(keys[1]));
        assert!(registry.remove(keys[0]));
        assert!(!registry.remove(keys[0]));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_preserves_order_of_remaining() {
        let (_, keys) = pool_with(4);
        let mut registry = VolumeRegistry::new();
        for &key in &keys {
            registry.add(key);
        }

        registry.remove(keys[1]);
        let order: Vec<_> = registry.iter().collect();
        assert_eq!(order, vec![keys[0], keys[2], keys[3]]);
    }

    #[test]
    fn snapshot_skips_stale_keys() {
        let (mut pool, keys) = pool_with(3);
        let mut registry = VolumeRegistry::new();
        for &key in &keys {
            registry.add(key);
        }

        pool.remove(keys[1]);
        let snapshot = registry.snapshot(&pool);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].position.x, 0.0);
        assert_eq!(snapshot[1].position.x, 2.0);
    }

    #[test]
    fn clear_empties_membership() {
        let (_, keys) = pool_with(2);
        let mut registry = VolumeRegistry::new();
        registry.add(keys[0]);
        registry.add(keys[1]);

        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.contains(keys[0]));
        assert!(registry.add(keys[0]));
    }
}
