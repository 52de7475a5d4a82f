//! Render pass trait and execution context

use crate::resources::FogTargets;
use crate::Result;
use super::PassResourceBuilder;

/// Render pass trait - implemented by the fog passes
pub trait RenderPass: Send + Sync {
    /// Unique name for this pass
    fn name(&self) -> &str;

    /// Declare resource dependencies
    ///
    /// Called once when the pass is added to determine pass ordering.
    fn declare_resources(&self, _builder: &mut PassResourceBuilder) {
        // Default: no resource dependencies
    }

    /// Record the pass into the frame's command encoder
    fn execute(&mut self, ctx: &mut PassContext) -> Result<()>;
}

/// Context for pass execution
pub struct PassContext<'a> {
    /// Command encoder for recording GPU commands
    pub encoder: &'a mut wgpu::CommandEncoder,

    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,

    /// Camera color attachment
    pub target: &'a wgpu::TextureView,

    /// Camera depth, bound as a sampled texture
    pub depth_view: &'a wgpu::TextureView,

    /// Fog-owned intermediate targets
    pub targets: &'a FogTargets,

    pub frame: u64,
}

impl<'a> PassContext<'a> {
    /// Begin a render pass
    pub fn begin_render_pass(
        &mut self,
        label: &str,
        color_attachments: &[Option<wgpu::RenderPassColorAttachment>],
    ) -> wgpu::RenderPass {
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments,
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }
}
