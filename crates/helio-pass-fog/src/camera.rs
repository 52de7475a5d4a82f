//! Camera data consumed by the fog pass

use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3};

bitflags! {
    /// Kinds of cameras the host renders; used to filter which ones get fog
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CameraTypes: u32 {
        const GAME = 1 << 0;
        const SCENE_VIEW = 1 << 1;
        const PREVIEW = 1 << 2;
        const REFLECTION = 1 << 3;
    }
}

/// View, projection and viewport of the camera being rendered
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FogCamera {
    /// World-to-view transform (right-handed, looking down -Z)
    pub view: Mat4,
    pub projection: Mat4,
    /// Camera position in world space
    pub position: Vec3,
    pub width: u32,
    pub height: u32,
    pub camera_type: CameraTypes,
    /// Per-view fog toggle (editor scene views can switch fog off)
    pub fog_enabled: bool,
    /// Elapsed time in seconds, drives noise scrolling
    pub time: f32,
}

impl FogCamera {
    pub fn new(view: Mat4, projection: Mat4, width: u32, height: u32) -> Self {
        let position = view.inverse().transform_point3(Vec3::ZERO);
        Self {
            view,
            projection,
            position,
            width,
            height,
            camera_type: CameraTypes::GAME,
            fog_enabled: true,
            time: 0.0,
        }
    }

    /// Create a perspective camera
    pub fn perspective(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        width: u32,
        height: u32,
        near: f32,
        far: f32,
    ) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let view = Mat4::look_at_rh(position, target, up);
        let projection = Mat4::perspective_rh(fov_y, aspect, near, far);
        Self {
            position,
            ..Self::new(view, projection, width, height)
        }
    }

    pub fn with_camera_type(mut self, camera_type: CameraTypes) -> Self {
        self.camera_type = camera_type;
        self
    }

    pub fn with_time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }

    pub fn with_fog_enabled(mut self, enabled: bool) -> Self {
        self.fog_enabled = enabled;
        self
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn inverse_view_projection(&self) -> Mat4 {
        self.view_projection().inverse()
    }

    pub fn world_to_view(&self, point: Vec3) -> Vec3 {
        self.view.transform_point3(point)
    }

    /// Distance in front of the camera along its forward axis
    pub fn view_depth(&self, point: Vec3) -> f32 {
        -self.world_to_view(point).z
    }

    /// Project to normalized screen coordinates (origin bottom-left, `[0,1]` on screen)
    pub fn world_to_screen(&self, point: Vec3) -> Vec2 {
        let ndc = self.view_projection().project_point3(point);
        Vec2::new(ndc.x * 0.5 + 0.5, ndc.y * 0.5 + 0.5)
    }
}
