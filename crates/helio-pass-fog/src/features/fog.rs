//! Full-screen fog feature

use super::{
    ColorTarget, DepthTarget, Feature, FeatureContext, FrameContext, PrepareContext,
    RequiredInputs,
};
use crate::camera::FogCamera;
use crate::config::{FogConfig, FogFeatureSettings, InjectionPoint};
use crate::exclusion::{mask::screen_rects, ScreenRect};
use crate::graph::{GraphContext, RenderGraph, ResourceHandle};
use crate::params::{resolve, FogUniforms};
use crate::passes::{CompositeBindings, CopyColorPass, ExclusionMaskPass, FogCompositePass};
use crate::pipeline::{validate_composite_source, CompositeKey, FogPipelines};
use crate::resources::{FogTargets, TargetKey};
use crate::{Error, Result};
use std::borrow::Cow;
use std::sync::Arc;

/// GPU objects created at registration
struct FogGpu {
    pipelines: FogPipelines,
    clamp_sampler: Arc<wgpu::Sampler>,
    noise_sampler: Arc<wgpu::Sampler>,
    fallback_noise: Arc<wgpu::TextureView>,
}

/// Camera state and resolved parameters for the frame being rendered
struct PreparedFog {
    camera: FogCamera,
    uniforms: FogUniforms,
    rects: Vec<ScreenRect>,
}

/// Why a camera gets no fog this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FogSkip {
    Disabled,
    CameraType,
    ToggledOff,
    Inactive,
}

/// Full-screen fog applied as a post-process over the camera color
///
/// Per frame the feature records Copy, then the exclusion mask when exclusion
/// zones are enabled, then Composite. Frames without a usable color or depth
/// attachment are skipped without error.
pub struct FogFeature {
    enabled: bool,
    settings: FogFeatureSettings,
    shader_missing: bool,
    gpu: Option<FogGpu>,
    targets: FogTargets,
    noise_texture: Option<Arc<wgpu::TextureView>>,
    prepared: Option<PreparedFog>,
}

impl FogFeature {
    pub fn new(settings: FogFeatureSettings) -> Self {
        Self {
            enabled: true,
            settings,
            shader_missing: false,
            gpu: None,
            targets: FogTargets::new(),
            noise_texture: None,
            prepared: None,
        }
    }

    pub fn settings(&self) -> &FogFeatureSettings {
        &self.settings
    }

    pub fn injection_point(&self) -> InjectionPoint {
        self.settings.injection_point
    }

    /// Attachments the host must provide for this feature
    pub fn required_inputs(&self) -> RequiredInputs {
        RequiredInputs::COLOR | RequiredInputs::DEPTH
    }

    /// Noise texture for [`FogNoiseMode::Texture`](crate::FogNoiseMode::Texture);
    /// `None` binds a white texture
    pub fn set_noise_texture(&mut self, view: Option<Arc<wgpu::TextureView>>) {
        self.noise_texture = view;
    }

    /// Whether fog would be drawn for `camera` with `config`
    pub fn skip_reason(&self, camera: &FogCamera, config: &FogConfig) -> Option<FogSkip> {
        if !self.is_enabled() {
            Some(FogSkip::Disabled)
        } else if !self.settings.render_cameras.intersects(camera.camera_type) {
            Some(FogSkip::CameraType)
        } else if !camera.fog_enabled {
            Some(FogSkip::ToggledOff)
        } else if !config.is_active() {
            Some(FogSkip::Inactive)
        } else {
            None
        }
    }

    fn create_gpu(ctx: &FeatureContext, composite_source: &str) -> FogGpu {
        let device = ctx.device;
        let pipelines = FogPipelines::new(device, composite_source);

        let clamp_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Fog Mask Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let noise_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Fog Noise Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // 1×1 white fallback
        let white = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Fog Noise (white fallback)"),
            size: wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        ctx.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &white,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[255u8, 255, 255, 255],
            wgpu::ImageDataLayout { offset: 0, bytes_per_row: Some(4), rows_per_image: Some(1) },
            wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
        );
        let fallback_noise = white.create_view(&wgpu::TextureViewDescriptor::default());

        FogGpu {
            pipelines,
            clamp_sampler: Arc::new(clamp_sampler),
            noise_sampler: Arc::new(noise_sampler),
            fallback_noise: Arc::new(fallback_noise),
        }
    }

    /// Build this frame's graph: Copy, Mask (if enabled), Composite
    fn build_graph(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> Result<Option<RenderGraph>> {
        let (Some(gpu), Some(prepared)) = (self.gpu.as_mut(), self.prepared.as_ref()) else {
            return Ok(None);
        };

        let layouts = gpu.pipelines.layouts().clone();
        let mut graph = RenderGraph::new();
        graph
            .import(ResourceHandle::camera_color())
            .import(ResourceHandle::camera_depth());

        graph.add_pass(CopyColorPass::new(
            gpu.pipelines.copy_pipeline(device, format),
            layouts.clone(),
        ));

        if prepared.uniforms.exclusion_enabled {
            graph.add_pass(ExclusionMaskPass::new(
                gpu.pipelines.mask_pipeline(device),
                &prepared.rects,
            ));
        }

        let bindings = CompositeBindings {
            layouts,
            clamp_sampler: gpu.clamp_sampler.clone(),
            noise_view: self
                .noise_texture
                .clone()
                .unwrap_or_else(|| gpu.fallback_noise.clone()),
            noise_sampler: gpu.noise_sampler.clone(),
        };
        let key = CompositeKey { keywords: prepared.uniforms.keywords, format };
        graph.add_pass(FogCompositePass::new(
            gpu.pipelines.composite_pipeline(device, key),
            bindings,
            &prepared.uniforms,
            &prepared.camera,
        ));

        graph.build()?;
        Ok(Some(graph))
    }

    /// Composite shader to compile at registration
    ///
    /// A missing source disables the feature for good with a single warning;
    /// a source the pipeline cache cannot specialize is an error.
    fn composite_source(&mut self) -> Result<Option<Cow<'static, str>>> {
        let Some(source) = self.settings.shader_source.clone() else {
            log::warn!("Fog composite shader missing; fog feature disabled");
            self.shader_missing = true;
            self.enabled = false;
            return Ok(None);
        };
        validate_composite_source(&source)?;
        Ok(Some(source))
    }

    /// Whether `record` has anything to draw
    fn ready_to_record(&self) -> Result<bool> {
        match (&self.gpu, &self.prepared) {
            (_, None) => Ok(false),
            (Some(_), Some(_)) => Ok(true),
            (None, Some(_)) => Err(Error::Feature("fog feature recorded before register".into())),
        }
    }
}

impl Default for FogFeature {
    fn default() -> Self {
        Self::new(FogFeatureSettings::default())
    }
}

impl Feature for FogFeature {
    fn name(&self) -> &str {
        "fog"
    }

    fn register(&mut self, ctx: &mut FeatureContext) -> Result<()> {
        let Some(source) = self.composite_source()? else {
            return Ok(());
        };

        self.gpu = Some(Self::create_gpu(ctx, &source));
        log::info!(
            "Fog feature registered (injection={:?}, cameras={:?})",
            self.settings.injection_point,
            self.settings.render_cameras
        );
        Ok(())
    }

    fn prepare(&mut self, ctx: &PrepareContext) -> Result<()> {
        self.prepared = None;

        if let Some(reason) = self.skip_reason(ctx.camera, ctx.config) {
            log::trace!("Fog skipped for frame {}: {:?}", ctx.frame, reason);
            return Ok(());
        }

        let uniforms = resolve(ctx.config);
        let rects = if uniforms.exclusion_enabled {
            screen_rects(&ctx.config.exclusion_zones, ctx.camera)
        } else {
            Vec::new()
        };

        self.prepared = Some(PreparedFog {
            camera: *ctx.camera,
            uniforms,
            rects,
        });
        Ok(())
    }

    fn record(&mut self, ctx: &mut FrameContext) -> Result<()> {
        if !self.ready_to_record()? {
            return Ok(());
        }

        let Some(color) = ctx.color else {
            log::debug!("Fog skipped for frame {}: no color target", ctx.frame);
            return Ok(());
        };
        if let Some(reason) = color.invalid_reason() {
            log::debug!("Fog skipped for frame {}: {}", ctx.frame, reason);
            return Ok(());
        }
        let Some(depth) = ctx.depth else {
            log::debug!("Fog skipped for frame {}: no depth target", ctx.frame);
            return Ok(());
        };
        if let Some(reason) = depth.invalid_reason() {
            log::debug!("Fog skipped for frame {}: {}", ctx.frame, reason);
            return Ok(());
        }

        // Screen size follows the attachment actually being written
        if let Some(prepared) = self.prepared.as_mut() {
            prepared.camera.width = color.width;
            prepared.camera.height = color.height;
        }

        let key = TargetKey::new(color.width, color.height, color.format);
        self.targets.reallocate_if_needed(ctx.device, key)?;

        let Some(mut graph) = self.build_graph(ctx.device, color.format)? else {
            return Ok(());
        };

        let ColorTarget { view, .. } = color;
        let DepthTarget {
            view: depth_view, ..
        } = depth;
        let mut graph_ctx = GraphContext {
            encoder: ctx.encoder,
            device: ctx.device,
            queue: ctx.queue,
            target: view,
            depth_view,
            targets: &self.targets,
            frame: ctx.frame,
        };
        graph.execute(&mut graph_ctx)
    }

    fn cleanup(&mut self, _device: &wgpu::Device) {
        self.targets.release();
        self.prepared = None;
        self.gpu = None;
        log::debug!("Fog feature cleaned up");
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        if enabled && self.shader_missing {
            log::debug!("Fog feature stays disabled: composite shader missing");
            return;
        }
        self.enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraTypes;
    use glam::Vec3;

    fn camera(camera_type: CameraTypes) -> FogCamera {
        FogCamera::perspective(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, 1.0, 16, 16, 0.1, 100.0)
            .with_camera_type(camera_type)
    }

    fn active() -> FogConfig {
        FogConfig::default().with_intensity(1.0)
    }

    #[test]
    fn filters_cameras_by_type_and_toggle() {
        let fog = FogFeature::default();
        assert_eq!(fog.skip_reason(&camera(CameraTypes::GAME), &active()), None);
        assert_eq!(
            fog.skip_reason(&camera(CameraTypes::REFLECTION), &active()),
            Some(FogSkip::CameraType)
        );
        assert_eq!(
            fog.skip_reason(&camera(CameraTypes::SCENE_VIEW).with_fog_enabled(false), &active()),
            Some(FogSkip::ToggledOff)
        );
        assert_eq!(
            fog.skip_reason(&camera(CameraTypes::GAME), &FogConfig::default()),
            Some(FogSkip::Inactive)
        );
    }

    #[test]
    fn prepare_skips_inactive_fog() {
        let mut fog = FogFeature::default();
        let cam = camera(CameraTypes::GAME);
        let config = FogConfig::default();
        fog.prepare(&PrepareContext::new(1, 0.016, &cam, &config)).expect("prepare");
        assert!(fog.prepared.is_none());

        let config = active();
        fog.prepare(&PrepareContext::new(2, 0.016, &cam, &config)).expect("prepare");
        assert!(fog.prepared.is_some());
    }

    #[test]
    fn missing_shader_disables_feature_at_registration() {
        let mut fog = FogFeature::new(FogFeatureSettings::default().with_shader_source(None));
        assert!(fog.is_enabled());

        assert!(fog.composite_source().expect("missing shader is not an error").is_none());
        assert!(!fog.is_enabled());

        fog.set_enabled(true);
        assert!(!fog.is_enabled());
        assert_eq!(
            fog.skip_reason(&camera(CameraTypes::GAME), &active()),
            Some(FogSkip::Disabled)
        );
    }

    #[test]
    fn builtin_shader_is_accepted_at_registration() {
        let mut fog = FogFeature::default();
        let source = fog.composite_source().expect("builtin shader");
        assert!(source.is_some());
        assert!(fog.is_enabled());
    }

    #[test]
    fn unusable_shader_fails_registration() {
        let source = Cow::Borrowed("fn main() {}");
        let settings = FogFeatureSettings::default().with_shader_source(Some(source));
        let mut fog = FogFeature::new(settings);
        assert!(matches!(fog.composite_source(), Err(Error::Shader(_))));
    }

    #[test]
    fn recording_without_registration_is_an_error() {
        let mut fog = FogFeature::default();
        assert!(!fog.ready_to_record().expect("nothing prepared"));

        let cam = camera(CameraTypes::GAME);
        let config = active();
        fog.prepare(&PrepareContext::new(1, 0.016, &cam, &config)).expect("prepare");
        assert!(matches!(fog.ready_to_record(), Err(Error::Feature(_))));
    }

    #[test]
    fn requires_color_and_depth() {
        let fog = FogFeature::default();
        assert_eq!(fog.required_inputs(), RequiredInputs::COLOR | RequiredInputs::DEPTH);
        assert_eq!(fog.injection_point(), InjectionPoint::BeforeRenderingPostProcessing);
    }
}
