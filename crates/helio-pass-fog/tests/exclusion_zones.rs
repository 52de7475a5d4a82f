use glam::Vec3;
use helio_pass_fog::exclusion::rasterize;
use helio_pass_fog::{
    Aabb, ColliderId, ExclusionMarker, ExclusionVolume, ExclusionVolumeSet, ExclusionZoneQuery,
    ExclusionZoneRegistry, FogCamera, FogConfig, FogOverrides, SceneCollider,
};

struct Scene {
    markers: Vec<ExclusionMarker>,
}

impl ExclusionZoneQuery for Scene {
    fn exclusion_markers(&self) -> Vec<ExclusionMarker> {
        self.markers.clone()
    }
}

fn collider(id: u64, center: Vec3) -> SceneCollider {
    SceneCollider::new(ColliderId(id), Aabb::from_center_half_extents(center, Vec3::ONE))
}

fn camera() -> FogCamera {
    FogCamera::perspective(
        Vec3::ZERO,
        Vec3::NEG_Z,
        Vec3::Y,
        std::f32::consts::FRAC_PI_2,
        64,
        64,
        0.1,
        200.0,
    )
}

fn single(bounds: Aabb) -> ExclusionVolumeSet {
    std::iter::once(ExclusionVolume::new(ColliderId(1), bounds)).collect()
}

#[test]
fn collider_reached_twice_is_listed_once() {
    let shared = collider(3, Vec3::new(0.0, 0.0, -10.0));
    let scene = Scene { markers: vec![ExclusionMarker::new(shared)] };
    let mut registry = ExclusionZoneRegistry::new().with_manual_colliders(vec![Some(shared)]);

    let volumes = registry.refresh(&scene);
    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes.as_slice()[0].collider, ColliderId(3));
}

#[test]
fn refresh_is_idempotent() {
    let scene = Scene {
        markers: vec![
            ExclusionMarker::new(collider(1, Vec3::X)),
            ExclusionMarker::new(collider(2, Vec3::Y)),
        ],
    };
    let mut registry =
        ExclusionZoneRegistry::new().with_manual_colliders(vec![Some(collider(5, Vec3::Z))]);
    let first = registry.refresh(&scene).clone();
    let second = registry.refresh(&scene).clone();
    assert_eq!(first, second);
}

#[test]
fn registry_feeds_the_fog_config() {
    let scene = Scene {
        markers: vec![ExclusionMarker::new(collider(9, Vec3::new(0.0, 0.0, -8.0)))],
    };
    let mut registry = ExclusionZoneRegistry::new();
    registry.refresh(&scene);

    let mut overrides = FogOverrides::new();
    registry.apply_to(&mut overrides);
    let config = overrides.apply(&FogConfig::default().with_intensity(1.0));

    assert!(config.enable_exclusion_zones);
    assert!(config.exclusion_zones.contains(ColliderId(9)));
    assert!(helio_pass_fog::resolve(&config).exclusion_enabled);
}

#[test]
fn volume_behind_camera_excludes_nothing() {
    let set = single(Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, 15.0), Vec3::splat(4.0)));
    assert_eq!(rasterize(&set, &camera(), 64, 64).excluded_pixel_count(), 0);
}

#[test]
fn degenerate_volume_excludes_nothing() {
    let point = Vec3::new(0.5, -0.5, -12.0);
    let set = single(Aabb::new(point, point));
    assert_eq!(rasterize(&set, &camera(), 64, 64).excluded_pixel_count(), 0);
}

#[test]
fn volume_in_view_excludes_its_footprint() {
    let set = single(Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, -10.0), Vec3::splat(2.0)));
    let mask = rasterize(&set, &camera(), 64, 64);
    assert!(mask.excluded_pixel_count() > 0);
    assert_eq!(mask.get(32, 32), Some(0));
    assert_eq!(mask.get(0, 0), Some(255));
}

#[test]
fn overlapping_volumes_union() {
    let a = ExclusionVolume::new(
        ColliderId(1),
        Aabb::from_center_half_extents(Vec3::new(-1.0, 0.0, -10.0), Vec3::splat(2.0)),
    );
    let b = ExclusionVolume::new(
        ColliderId(2),
        Aabb::from_center_half_extents(Vec3::new(1.0, 0.0, -10.0), Vec3::splat(2.0)),
    );
    let only_a: ExclusionVolumeSet = std::iter::once(a).collect();
    let both: ExclusionVolumeSet = [a, b].into_iter().collect();

    let cam = camera();
    let single_count = rasterize(&only_a, &cam, 64, 64).excluded_pixel_count();
    let union_count = rasterize(&both, &cam, 64, 64).excluded_pixel_count();
    assert!(union_count > single_count);
    assert!(union_count < 2 * single_count);
}
