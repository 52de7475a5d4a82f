//! Exclusion zones - world volumes inside which fog is suppressed
//!
//! Zones come from scene colliders. The [`ExclusionZoneRegistry`] gathers the
//! live ones into an [`ExclusionVolumeSet`]; the mask pass projects each
//! volume to a screen rectangle and stamps it into the exclusion mask.

mod bounds;
pub mod mask;
pub mod registry;

pub use bounds::Aabb;
pub use mask::{project_volume, rasterize, ExclusionMask, ScreenRect};
pub use registry::{ExclusionMarker, ExclusionZoneQuery, ExclusionZoneRegistry, SceneCollider};

/// Stable identity of a host collider
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ColliderId(pub u64);

/// A collider-bounded region where fog is suppressed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusionVolume {
    pub collider: ColliderId,
    pub bounds: Aabb,
}

impl ExclusionVolume {
    pub fn new(collider: ColliderId, bounds: Aabb) -> Self {
        Self { collider, bounds }
    }
}

/// Ordered exclusion volumes with no collider listed twice
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExclusionVolumeSet {
    volumes: Vec<ExclusionVolume>,
}

impl ExclusionVolumeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `volume` unless its collider is already present
    ///
    /// Returns whether the volume was added.
    pub fn insert(&mut self, volume: ExclusionVolume) -> bool {
        if self.contains(volume.collider) {
            return false;
        }
        self.volumes.push(volume);
        true
    }

    pub fn contains(&self, collider: ColliderId) -> bool {
        self.volumes.iter().any(|v| v.collider == collider)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExclusionVolume> {
        self.volumes.iter()
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    pub fn as_slice(&self) -> &[ExclusionVolume] {
        &self.volumes
    }
}

impl FromIterator<ExclusionVolume> for ExclusionVolumeSet {
    fn from_iter<I: IntoIterator<Item = ExclusionVolume>>(iter: I) -> Self {
        let mut set = Self::new();
        for volume in iter {
            set.insert(volume);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ExclusionVolumeSet {
    type Item = &'a ExclusionVolume;
    type IntoIter = std::slice::Iter<'a, ExclusionVolume>;

    fn into_iter(self) -> Self::IntoIter {
        self.volumes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn insert_rejects_duplicate_colliders() {
        let a = ExclusionVolume::new(ColliderId(1), Aabb::new(Vec3::ZERO, Vec3::ONE));
        let moved = ExclusionVolume::new(ColliderId(1), Aabb::new(Vec3::ONE, Vec3::splat(2.0)));
        let b = ExclusionVolume::new(ColliderId(2), Aabb::new(Vec3::ZERO, Vec3::ONE));

        let set: ExclusionVolumeSet = [a, moved, b].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0], a);
        assert_eq!(set.as_slice()[1].collider, ColliderId(2));
    }
}
