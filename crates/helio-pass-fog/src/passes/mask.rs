//! Exclusion mask pass - stamps projected exclusion volumes into an R8 mask

use crate::exclusion::ScreenRect;
use crate::graph::{PassContext, PassResourceBuilder, RenderPass, ResourceHandle};
use crate::Result;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Rects drawn per frame
pub const MAX_EXCLUSION_RECTS: usize = 64;

/// Clears the mask to visible and draws one quad per exclusion rect
pub struct ExclusionMaskPass {
    pipeline: Arc<wgpu::RenderPipeline>,
    instances: Vec<[f32; 4]>,
}

impl ExclusionMaskPass {
    pub fn new(pipeline: Arc<wgpu::RenderPipeline>, rects: &[ScreenRect]) -> Self {
        Self {
            pipeline,
            instances: rect_instances(rects),
        }
    }
}

/// Instance data for `rects`, dropping any beyond [`MAX_EXCLUSION_RECTS`]
pub fn rect_instances(rects: &[ScreenRect]) -> Vec<[f32; 4]> {
    if rects.len() > MAX_EXCLUSION_RECTS {
        log::warn!(
            "{} exclusion zones visible, only the first {} are applied",
            rects.len(),
            MAX_EXCLUSION_RECTS
        );
    }
    rects
        .iter()
        .take(MAX_EXCLUSION_RECTS)
        .map(ScreenRect::to_array)
        .collect()
}

/// Instance buffer contents for one camera's rects, `None` when there are none
pub(crate) fn instance_buffer_init(
    instances: &[[f32; 4]],
) -> Option<wgpu::util::BufferInitDescriptor<'_>> {
    if instances.is_empty() {
        return None;
    }
    Some(wgpu::util::BufferInitDescriptor {
        label: Some("Fog Exclusion Rects"),
        contents: bytemuck::cast_slice(instances),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

impl RenderPass for ExclusionMaskPass {
    fn name(&self) -> &str {
        "fog_exclusion_mask"
    }

    fn declare_resources(&self, builder: &mut PassResourceBuilder) {
        builder.write(ResourceHandle::fog_exclusion_mask());
    }

    fn execute(&mut self, ctx: &mut PassContext) -> Result<()> {
        let targets = ctx.targets;
        let mask = targets.exclusion_mask_view()?;

        let instance_buffer = instance_buffer_init(&self.instances)
            .map(|init| ctx.device.create_buffer_init(&init));

        let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Fog Exclusion Mask Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: mask,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // Nothing to stamp still leaves a cleared mask
        let Some(instance_buffer) = instance_buffer.as_ref() else {
            return Ok(());
        };

        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, instance_buffer.slice(..));
        pass.draw(0..6, 0..self.instances.len() as u32);

        Ok(())
    }
}
