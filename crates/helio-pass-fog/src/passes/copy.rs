//! Copy pass - snapshots the camera color so the composite can sample it

use crate::graph::{PassContext, PassResourceBuilder, RenderPass, ResourceHandle};
use crate::pipeline::FogBindGroupLayouts;
use crate::Result;
use std::sync::Arc;

/// Blits the camera color attachment into the fog's copied color target
pub struct CopyColorPass {
    pipeline: Arc<wgpu::RenderPipeline>,
    layouts: Arc<FogBindGroupLayouts>,
}

impl CopyColorPass {
    pub fn new(pipeline: Arc<wgpu::RenderPipeline>, layouts: Arc<FogBindGroupLayouts>) -> Self {
        Self { pipeline, layouts }
    }
}

impl RenderPass for CopyColorPass {
    fn name(&self) -> &str {
        "fog_copy"
    }

    fn declare_resources(&self, builder: &mut PassResourceBuilder) {
        builder
            .read(ResourceHandle::camera_color())
            .write(ResourceHandle::fog_copied_color());
    }

    fn execute(&mut self, ctx: &mut PassContext) -> Result<()> {
        // Extract refs before the mutable encoder borrow
        let targets = ctx.targets;
        let destination = targets.copied_color_view()?;

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Fog Copy Bind Group"),
            layout: &self.layouts.copy,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(ctx.target),
            }],
        });

        let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Fog Copy Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: destination,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);

        Ok(())
    }
}
