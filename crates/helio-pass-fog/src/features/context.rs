//! Context types for features

use crate::camera::FogCamera;
use crate::config::FogConfig;
use bitflags::bitflags;

bitflags! {
    /// Camera attachments a feature needs from the host
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RequiredInputs: u32 {
        /// Color attachment, sampled and rendered to
        const COLOR = 1 << 0;
        /// Depth attachment, sampled
        const DEPTH = 1 << 1;
    }
}

/// Context provided to features during registration
pub struct FeatureContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    /// Surface / swapchain format (used for pipeline creation)
    pub surface_format: wgpu::TextureFormat,
}

impl<'a> FeatureContext<'a> {
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
        }
    }
}

/// Context provided to features during frame preparation
pub struct PrepareContext<'a> {
    pub frame: u64,
    pub delta_time: f32,
    pub camera: &'a FogCamera,
    /// Fog settings after volume overrides were applied
    pub config: &'a FogConfig,
}

impl<'a> PrepareContext<'a> {
    pub fn new(frame: u64, delta_time: f32, camera: &'a FogCamera, config: &'a FogConfig) -> Self {
        Self {
            frame,
            delta_time,
            camera,
            config,
        }
    }
}

/// Camera color attachment handed to the feature
#[derive(Clone, Copy)]
pub struct ColorTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
    pub width: u32,
    pub height: u32,
}

impl<'a> ColorTarget<'a> {
    /// Usages the fog needs on the camera color texture
    pub const REQUIRED_USAGE: wgpu::TextureUsages =
        wgpu::TextureUsages::RENDER_ATTACHMENT.union(wgpu::TextureUsages::TEXTURE_BINDING);

    /// Why the fog cannot run on this target, if it cannot
    pub fn invalid_reason(&self) -> Option<&'static str> {
        color_target_issue(self.usage, self.width, self.height)
    }
}

/// Validity rules for a color attachment described by its usage and size
pub fn color_target_issue(
    usage: wgpu::TextureUsages,
    width: u32,
    height: u32,
) -> Option<&'static str> {
    if width == 0 || height == 0 {
        Some("color target has zero size")
    } else if !usage.contains(ColorTarget::REQUIRED_USAGE) {
        Some("color target is not both sampled and renderable")
    } else {
        None
    }
}

/// Camera depth attachment handed to the feature
#[derive(Clone, Copy)]
pub struct DepthTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
    /// Aspect `view` was created with
    pub aspect: wgpu::TextureAspect,
}

impl<'a> DepthTarget<'a> {
    /// Why the composite cannot sample this target, if it cannot
    pub fn invalid_reason(&self) -> Option<&'static str> {
        depth_target_issue(self.format, self.usage, self.aspect)
    }
}

/// Validity rules for a depth attachment bound as `texture_depth_2d`
pub fn depth_target_issue(
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    aspect: wgpu::TextureAspect,
) -> Option<&'static str> {
    if !format.has_depth_aspect() {
        Some("depth target has no depth aspect")
    } else if !usage.contains(wgpu::TextureUsages::TEXTURE_BINDING) {
        Some("depth target is not sampleable")
    } else if format.has_stencil_aspect() && aspect != wgpu::TextureAspect::DepthOnly {
        Some("depth target view includes the stencil aspect")
    } else {
        None
    }
}

/// Context provided to features while recording a frame
pub struct FrameContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// `None` when the camera has no intermediate color texture
    pub color: Option<ColorTarget<'a>>,
    /// `None` when the camera renders without a depth texture
    pub depth: Option<DepthTarget<'a>>,
    pub frame: u64,
}
