//! Composite pass - blends fog over the copied color into the camera target

use crate::camera::FogCamera;
use crate::graph::{PassContext, PassResourceBuilder, RenderPass, ResourceHandle};
use crate::params::{FogUniforms, GpuFogParams};
use crate::pipeline::FogBindGroupLayouts;
use crate::Result;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Persistent resources bound by the composite pass
#[derive(Clone)]
pub struct CompositeBindings {
    pub layouts: Arc<FogBindGroupLayouts>,
    pub clamp_sampler: Arc<wgpu::Sampler>,
    /// Noise texture, or a white fallback when none is set
    pub noise_view: Arc<wgpu::TextureView>,
    pub noise_sampler: Arc<wgpu::Sampler>,
}

/// Fullscreen fog composite
pub struct FogCompositePass {
    pipeline: Arc<wgpu::RenderPipeline>,
    bindings: CompositeBindings,
    params: GpuFogParams,
    reads_mask: bool,
}

impl FogCompositePass {
    pub fn new(
        pipeline: Arc<wgpu::RenderPipeline>,
        bindings: CompositeBindings,
        uniforms: &FogUniforms,
        camera: &FogCamera,
    ) -> Self {
        Self {
            pipeline,
            bindings,
            params: GpuFogParams::new(uniforms, camera),
            reads_mask: uniforms.exclusion_enabled,
        }
    }
}

/// Uniform buffer contents for one camera
///
/// Each recorded composite owns its buffer, so several cameras recorded into
/// one submission never observe each other's parameters.
pub(crate) fn uniform_buffer_init(params: &GpuFogParams) -> wgpu::util::BufferInitDescriptor<'_> {
    wgpu::util::BufferInitDescriptor {
        label: Some("Fog Params"),
        contents: bytemuck::bytes_of(params),
        usage: wgpu::BufferUsages::UNIFORM,
    }
}

impl RenderPass for FogCompositePass {
    fn name(&self) -> &str {
        "fog_composite"
    }

    fn declare_resources(&self, builder: &mut PassResourceBuilder) {
        builder
            .read(ResourceHandle::fog_copied_color())
            .read(ResourceHandle::camera_depth());
        if self.reads_mask {
            builder.read(ResourceHandle::fog_exclusion_mask());
        }
        builder.write(ResourceHandle::camera_color());
    }

    fn execute(&mut self, ctx: &mut PassContext) -> Result<()> {
        let targets = ctx.targets;
        let copied = targets.copied_color_view()?;
        let mask = targets.exclusion_mask_view()?;
        let target = ctx.target;

        let uniform_buffer = ctx.device.create_buffer_init(&uniform_buffer_init(&self.params));

        let b = &self.bindings;
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Fog Composite Bind Group"),
            layout: &b.layouts.composite,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(copied),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(ctx.depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(mask),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&b.clamp_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(&b.noise_view),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::Sampler(&b.noise_sampler),
                },
            ],
        });

        let mut pass = ctx.begin_render_pass(
            "Fog Composite Pass",
            &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
        );

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FogCamera;
    use crate::config::FogConfig;
    use crate::params::resolve;
    use glam::Vec3;

    fn camera_at(position: Vec3) -> FogCamera {
        FogCamera::perspective(position, Vec3::NEG_Z, Vec3::Y, 1.0, 64, 64, 0.1, 100.0)
    }

    #[test]
    fn each_camera_gets_its_own_uniform_contents() {
        let uniforms = resolve(&FogConfig::default().with_intensity(1.0));
        let a = GpuFogParams::new(&uniforms, &camera_at(Vec3::ZERO));
        let b = GpuFogParams::new(&uniforms, &camera_at(Vec3::new(0.0, 5.0, 20.0)));

        let init_a = uniform_buffer_init(&a);
        let init_b = uniform_buffer_init(&b);
        assert_eq!(init_a.contents, bytemuck::bytes_of(&a));
        assert_eq!(init_b.contents, bytemuck::bytes_of(&b));
        assert_ne!(init_a.contents, init_b.contents);
    }

    #[test]
    fn uniform_buffer_is_not_rewritten_through_the_queue() {
        let uniforms = resolve(&FogConfig::default().with_intensity(1.0));
        let params = GpuFogParams::new(&uniforms, &camera_at(Vec3::ZERO));
        let init = uniform_buffer_init(&params);
        assert_eq!(init.usage, wgpu::BufferUsages::UNIFORM);
        assert!(!init.usage.contains(wgpu::BufferUsages::COPY_DST));
    }
}
