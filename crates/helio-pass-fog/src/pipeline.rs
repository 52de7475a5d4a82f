//! Pipeline cache for the fog passes
//!
//! The composite shader is specialized through WGSL `override` constants
//! prepended to the source, one per [`FogKeywords`] flag. Each keyword set and
//! color format pair compiles once and is reused afterwards.

use crate::params::FogKeywords;
use crate::resources::MASK_FORMAT;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

const COPY_SHADER: &str = include_str!("../shaders/fog_copy.wgsl");
const MASK_SHADER: &str = include_str!("../shaders/fog_mask.wgsl");

/// Bytes per exclusion rect instance (`vec4<f32>`: min.xy, max.xy)
pub const RECT_INSTANCE_SIZE: u64 = 16;

/// Key for composite pipeline lookup
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub struct CompositeKey {
    pub keywords: FogKeywords,
    pub format: wgpu::TextureFormat,
}

/// Bind group layouts shared by the fog passes
pub struct FogBindGroupLayouts {
    /// Copy: source color texture
    pub copy: wgpu::BindGroupLayout,
    /// Composite: params, copied color, depth, mask, sampler, noise
    pub composite: wgpu::BindGroupLayout,
}

impl FogBindGroupLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let copy = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Fog Copy Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let composite = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Fog Composite Layout"),
            entries: &[
                // 0: FogParams uniform
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // 1: copied color (textureLoad)
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // 2: camera depth (textureLoad)
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // 3: exclusion mask
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // 4: clamped sampler (mask)
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // 5: noise texture (white fallback)
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // 6: repeating sampler (noise)
                wgpu::BindGroupLayoutEntry {
                    binding: 6,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self { copy, composite }
    }
}

/// Compiled fog pipelines
pub struct FogPipelines {
    layouts: Arc<FogBindGroupLayouts>,
    composite_source: String,
    copy_cache: HashMap<wgpu::TextureFormat, Arc<wgpu::RenderPipeline>>,
    mask: Option<Arc<wgpu::RenderPipeline>>,
    composite_cache: HashMap<CompositeKey, Arc<wgpu::RenderPipeline>>,
}

impl FogPipelines {
    pub fn new(device: &wgpu::Device, composite_source: impl Into<String>) -> Self {
        let layouts = Arc::new(FogBindGroupLayouts::new(device));
        Self {
            layouts,
            composite_source: composite_source.into(),
            copy_cache: HashMap::new(),
            mask: None,
            composite_cache: HashMap::new(),
        }
    }

    pub fn layouts(&self) -> &Arc<FogBindGroupLayouts> {
        &self.layouts
    }

    /// Fullscreen blit into the copied color target
    pub fn copy_pipeline(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> Arc<wgpu::RenderPipeline> {
        if let Some(pipeline) = self.copy_cache.get(&format) {
            return pipeline.clone();
        }

        log::debug!("Creating fog copy pipeline for {:?}", format);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fog Copy Shader"),
            source: wgpu::ShaderSource::Wgsl(COPY_SHADER.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Fog Copy Pipeline Layout"),
            bind_group_layouts: &[&self.layouts.copy],
            push_constant_ranges: &[],
        });
        let pipeline = Arc::new(fullscreen_pipeline(
            device,
            "Fog Copy Pipeline",
            &layout,
            &shader,
            format,
        ));
        self.copy_cache.insert(format, pipeline.clone());
        pipeline
    }

    /// Instanced rect pipeline writing zeros into the R8 mask
    pub fn mask_pipeline(&mut self, device: &wgpu::Device) -> Arc<wgpu::RenderPipeline> {
        if let Some(pipeline) = &self.mask {
            return pipeline.clone();
        }

        log::debug!("Creating fog exclusion mask pipeline");
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fog Mask Shader"),
            source: wgpu::ShaderSource::Wgsl(MASK_SHADER.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Fog Mask Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Fog Mask Pipeline"),
            layout: Some(&layout),
            cache: None,
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[
                    // Slot 0: per-instance rect (min.xy, max.xy) in screen space
                    wgpu::VertexBufferLayout {
                        array_stride: RECT_INSTANCE_SIZE,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x4,
                            offset: 0,
                            shader_location: 0,
                        }],
                    },
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: MASK_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let pipeline = Arc::new(pipeline);
        self.mask = Some(pipeline.clone());
        pipeline
    }

    /// Composite variant for `key`, compiled on first use
    pub fn composite_pipeline(
        &mut self,
        device: &wgpu::Device,
        key: CompositeKey,
    ) -> Arc<wgpu::RenderPipeline> {
        if let Some(pipeline) = self.composite_cache.get(&key) {
            log::trace!("Using cached fog composite pipeline: {:?}", key);
            return pipeline.clone();
        }

        log::info!("Creating fog composite variant: {:?}", key);
        let source = apply_defines(&self.composite_source, key.keywords);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fog Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Fog Composite Pipeline Layout"),
            bind_group_layouts: &[&self.layouts.composite],
            push_constant_ranges: &[],
        });
        let pipeline = Arc::new(fullscreen_pipeline(
            device,
            "Fog Composite Pipeline",
            &layout,
            &shader,
            key.format,
        ));
        self.composite_cache.insert(key, pipeline.clone());
        pipeline
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        cache: None,
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

/// Check that `source` can serve as the composite shader
///
/// Both entry points must exist and the keyword constants must be left to
/// [`apply_defines`], which would otherwise redeclare them.
pub fn validate_composite_source(source: &str) -> Result<()> {
    for entry_point in ["fn vs_main", "fn fs_main"] {
        if !source.contains(entry_point) {
            return Err(Error::Shader(format!("composite shader lacks `{}`", entry_point)));
        }
    }
    for (name, _) in FogKeywords::all().shader_defines() {
        if source.contains(&format!("override {}", name)) {
            return Err(Error::Shader(format!(
                "composite shader declares keyword `{}` itself",
                name
            )));
        }
    }
    Ok(())
}

/// Prepend one `override` declaration per keyword to `source`
pub fn apply_defines(source: &str, keywords: FogKeywords) -> String {
    let mut result = String::new();
    for (name, value) in keywords.shader_defines() {
        result.push_str(&format!("override {}: bool = {};\n", name, value));
    }
    result.push_str(source);
    result
}
