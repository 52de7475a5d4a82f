//! Collects live exclusion zones from the scene

use super::{Aabb, ColliderId, ExclusionVolume, ExclusionVolumeSet};
use crate::config::FogOverrides;

/// Snapshot of a host collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneCollider {
    pub id: ColliderId,
    /// World-space bounds
    pub bounds: Aabb,
    pub enabled: bool,
    /// Owning object and all its parents are active
    pub active_in_hierarchy: bool,
}

impl SceneCollider {
    pub fn new(id: ColliderId, bounds: Aabb) -> Self {
        Self {
            id,
            bounds,
            enabled: true,
            active_in_hierarchy: true,
        }
    }

    pub fn is_live(&self) -> bool {
        self.enabled && self.active_in_hierarchy
    }
}

/// Scene object tagging its collider as an exclusion zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusionMarker {
    pub enable_exclusion: bool,
    pub active_in_hierarchy: bool,
    /// `None` when the collider is missing or destroyed
    pub collider: Option<SceneCollider>,
}

impl ExclusionMarker {
    pub fn new(collider: SceneCollider) -> Self {
        Self {
            enable_exclusion: true,
            active_in_hierarchy: true,
            collider: Some(collider),
        }
    }

    /// The marker's collider if the zone currently excludes fog
    pub fn active_collider(&self) -> Option<&SceneCollider> {
        if !self.enable_exclusion || !self.active_in_hierarchy {
            return None;
        }
        self.collider.as_ref().filter(|c| c.enabled)
    }
}

/// Scene-wide discovery of exclusion markers
pub trait ExclusionZoneQuery {
    /// All markers in the scene, in a stable discovery order
    fn exclusion_markers(&self) -> Vec<ExclusionMarker>;
}

/// Builds the [`ExclusionVolumeSet`] from manual colliders and scene markers
///
/// Manual entries come first, in list order, followed by auto-discovered
/// markers in discovery order. A collider reached both ways is kept once.
pub struct ExclusionZoneRegistry {
    /// Manually assigned colliders; `None` entries stand for null references
    pub manual_colliders: Vec<Option<SceneCollider>>,
    /// Collect markers from the scene on refresh
    pub auto_collect: bool,
    /// Refresh on every [`tick`](Self::tick) (for moving colliders)
    pub update_every_frame: bool,
    volumes: ExclusionVolumeSet,
}

impl ExclusionZoneRegistry {
    pub fn new() -> Self {
        Self {
            manual_colliders: Vec::new(),
            auto_collect: true,
            update_every_frame: false,
            volumes: ExclusionVolumeSet::new(),
        }
    }

    pub fn with_manual_colliders(mut self, colliders: Vec<Option<SceneCollider>>) -> Self {
        self.manual_colliders = colliders;
        self
    }

    pub fn with_auto_collect(mut self, enabled: bool) -> Self {
        self.auto_collect = enabled;
        self
    }

    pub fn with_update_every_frame(mut self, enabled: bool) -> Self {
        self.update_every_frame = enabled;
        self
    }

    /// Recompute the volume set from scratch
    pub fn refresh(&mut self, scene: &dyn ExclusionZoneQuery) -> &ExclusionVolumeSet {
        let mut volumes = ExclusionVolumeSet::new();

        for collider in self.manual_colliders.iter().flatten() {
            if collider.is_live() {
                volumes.insert(ExclusionVolume::new(collider.id, collider.bounds));
            }
        }

        if self.auto_collect {
            for marker in scene.exclusion_markers() {
                if let Some(collider) = marker.active_collider() {
                    volumes.insert(ExclusionVolume::new(collider.id, collider.bounds));
                }
            }
        }

        log::trace!("Exclusion zones refreshed: {} volume(s)", volumes.len());
        self.volumes = volumes;
        &self.volumes
    }

    /// Per-frame hook; refreshes only when `update_every_frame` is set
    ///
    /// Returns whether a refresh happened.
    pub fn tick(&mut self, scene: &dyn ExclusionZoneQuery) -> bool {
        if self.update_every_frame {
            self.refresh(scene);
        }
        self.update_every_frame
    }

    /// Current volume set, for inspection and debug drawing
    pub fn volumes(&self) -> &ExclusionVolumeSet {
        &self.volumes
    }

    /// Publish the current zones as fog overrides
    ///
    /// A non-empty set enables exclusion and hands over the volumes; an empty
    /// set switches exclusion off.
    pub fn apply_to(&self, overrides: &mut FogOverrides) {
        if self.volumes.is_empty() {
            overrides.enable_exclusion_zones.set(false);
        } else {
            overrides.enable_exclusion_zones.set(true);
            overrides.exclusion_zones.set(self.volumes.clone());
        }
    }
}

impl Default for ExclusionZoneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    struct Markers(Vec<ExclusionMarker>);

    impl ExclusionZoneQuery for Markers {
        fn exclusion_markers(&self) -> Vec<ExclusionMarker> {
            self.0.clone()
        }
    }

    fn collider(id: u64) -> SceneCollider {
        let c = Vec3::splat(id as f32);
        SceneCollider::new(ColliderId(id), Aabb::from_center_half_extents(c, Vec3::ONE))
    }

    fn ids(set: &ExclusionVolumeSet) -> Vec<u64> {
        set.iter().map(|v| v.collider.0).collect()
    }

    #[test]
    fn manual_first_then_discovery_order() {
        let scene = Markers(vec![
            ExclusionMarker::new(collider(9)),
            ExclusionMarker::new(collider(4)),
        ]);
        let mut registry = ExclusionZoneRegistry::new()
            .with_manual_colliders(vec![Some(collider(7)), Some(collider(2))]);
        assert_eq!(ids(registry.refresh(&scene)), vec![7, 2, 9, 4]);
    }

    #[test]
    fn filters_null_disabled_and_inactive_entries() {
        let mut disabled = collider(3);
        disabled.enabled = false;
        let mut inactive = collider(5);
        inactive.active_in_hierarchy = false;

        let mut marker_off = ExclusionMarker::new(collider(10));
        marker_off.enable_exclusion = false;
        let mut marker_hidden = ExclusionMarker::new(collider(11));
        marker_hidden.active_in_hierarchy = false;
        let marker_missing = ExclusionMarker {
            collider: None,
            ..ExclusionMarker::new(collider(12))
        };
        let mut marker_disabled_collider = ExclusionMarker::new(collider(13));
        if let Some(c) = marker_disabled_collider.collider.as_mut() {
            c.enabled = false;
        }

        let scene = Markers(vec![
            marker_off,
            marker_hidden,
            marker_missing,
            marker_disabled_collider,
            ExclusionMarker::new(collider(14)),
        ]);
        let mut registry = ExclusionZoneRegistry::new()
            .with_manual_colliders(vec![None, Some(disabled), Some(inactive), Some(collider(1))]);

        assert_eq!(ids(registry.refresh(&scene)), vec![1, 14]);
    }

    #[test]
    fn auto_collect_can_be_switched_off() {
        let scene = Markers(vec![ExclusionMarker::new(collider(4))]);
        let mut registry = ExclusionZoneRegistry::new()
            .with_auto_collect(false)
            .with_manual_colliders(vec![Some(collider(1))]);
        assert_eq!(ids(registry.refresh(&scene)), vec![1]);
    }

    #[test]
    fn tick_only_refreshes_when_asked() {
        let scene = Markers(vec![ExclusionMarker::new(collider(4))]);
        let mut registry = ExclusionZoneRegistry::new();
        assert!(!registry.tick(&scene));
        assert!(registry.volumes().is_empty());

        registry.update_every_frame = true;
        assert!(registry.tick(&scene));
        assert_eq!(ids(registry.volumes()), vec![4]);
    }

    #[test]
    fn apply_to_toggles_exclusion() {
        let mut overrides = FogOverrides::new();
        let mut registry = ExclusionZoneRegistry::new();
        registry.refresh(&Markers(Vec::new()));
        registry.apply_to(&mut overrides);
        assert!(overrides.enable_exclusion_zones.overridden);
        assert!(!overrides.enable_exclusion_zones.value);

        registry.refresh(&Markers(vec![ExclusionMarker::new(collider(8))]));
        registry.apply_to(&mut overrides);
        assert!(overrides.enable_exclusion_zones.value);
        assert_eq!(overrides.exclusion_zones.value.len(), 1);
    }
}
