//! Intermediate render targets owned by the fog feature

use crate::{Error, Result};

/// Format of the exclusion mask target
pub const MASK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// Size and format the intermediate targets were allocated for
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct TargetKey {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl TargetKey {
    pub fn new(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self { width, height, format }
    }

    fn to_descriptor<'a>(
        &self,
        label: Option<&'a str>,
        format: wgpu::TextureFormat,
    ) -> wgpu::TextureDescriptor<'a> {
        wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        }
    }
}

struct Target {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Target {
    fn create(device: &wgpu::Device, desc: &wgpu::TextureDescriptor) -> Self {
        let texture = device.create_texture(desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { _texture: texture, view }
    }
}

/// Copied color and exclusion mask targets
///
/// Both follow the camera target's size; they are recreated only when the
/// size or the color format changes.
#[derive(Default)]
pub struct FogTargets {
    key: Option<TargetKey>,
    copied_color: Option<Target>,
    exclusion_mask: Option<Target>,
}

impl FogTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&self) -> Option<TargetKey> {
        self.key
    }

    /// Whether targets for `key` would have to be (re)created
    pub fn needs_reallocation(&self, key: TargetKey) -> bool {
        self.key != Some(key)
    }

    /// Ensure targets match `key`; returns whether anything was created
    pub fn reallocate_if_needed(&mut self, device: &wgpu::Device, key: TargetKey) -> Result<bool> {
        if !self.needs_reallocation(key) {
            return Ok(false);
        }
        if key.width == 0 || key.height == 0 {
            return Err(Error::Resource(format!(
                "Cannot allocate fog targets of size {}x{}",
                key.width, key.height
            )));
        }

        self.copied_color = Some(Target::create(
            device,
            &key.to_descriptor(Some("Fog Copied Color"), key.format),
        ));
        self.exclusion_mask = Some(Target::create(
            device,
            &key.to_descriptor(Some("Fog Exclusion Mask"), MASK_FORMAT),
        ));
        self.key = Some(key);

        log::info!(
            "Fog targets allocated: {}x{} {:?}",
            key.width,
            key.height,
            key.format
        );
        Ok(true)
    }

    pub fn copied_color_view(&self) -> Result<&wgpu::TextureView> {
        self.copied_color
            .as_ref()
            .map(|t| &t.view)
            .ok_or_else(|| Error::Resource("Fog copied color target not allocated".into()))
    }

    pub fn exclusion_mask_view(&self) -> Result<&wgpu::TextureView> {
        self.exclusion_mask
            .as_ref()
            .map(|t| &t.view)
            .ok_or_else(|| Error::Resource("Fog exclusion mask target not allocated".into()))
    }

    /// Drop both targets
    pub fn release(&mut self) {
        if self.key.take().is_some() {
            log::debug!("Fog targets released");
        }
        self.copied_color = None;
        self.exclusion_mask = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_targets_need_allocation() {
        let targets = FogTargets::new();
        let key = TargetKey::new(1280, 720, wgpu::TextureFormat::Rgba16Float);
        assert!(targets.needs_reallocation(key));
        assert!(targets.copied_color_view().is_err());
        assert!(targets.exclusion_mask_view().is_err());
    }

    #[test]
    fn keys_differ_by_size_and_format() {
        let a = TargetKey::new(1280, 720, wgpu::TextureFormat::Rgba16Float);
        assert_ne!(a, TargetKey::new(1280, 721, wgpu::TextureFormat::Rgba16Float));
        assert_ne!(a, TargetKey::new(1280, 720, wgpu::TextureFormat::Bgra8UnormSrgb));
        assert_eq!(a, TargetKey::new(1280, 720, wgpu::TextureFormat::Rgba16Float));
    }
}
