//! CPU reference of the composite shader
//!
//! `fog_composite.wgsl` evaluates exactly these formulas per pixel. Keeping a
//! host-side copy lets the density functions be checked without a device.

use crate::camera::FogCamera;
use crate::config::{FogDensityMode, FogMode, FogNoiseMode};
use crate::exclusion::ExclusionMask;
use crate::params::FogUniforms;
use crate::{Error, Result};
use glam::{Vec2, Vec3, Vec4};

/// Geometric inputs of one pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogSample {
    /// Linear view-space depth
    pub view_depth: f32,
    /// Distance from the camera
    pub distance: f32,
    /// World-space height
    pub height: f32,
    /// Noise value in `[0,1]`, ignored when noise is off
    pub noise: f32,
}

impl FogSample {
    pub fn from_world(camera: &FogCamera, world: Vec3) -> Self {
        Self {
            view_depth: camera.view_depth(world),
            distance: world.distance(camera.position),
            height: world.y,
            noise: 1.0,
        }
    }

    pub fn with_noise(mut self, noise: f32) -> Self {
        self.noise = noise;
        self
    }
}

/// The quantity the fog mode measures
pub fn fog_coordinate(uniforms: &FogUniforms, sample: &FogSample) -> f32 {
    match uniforms.mode {
        FogMode::Depth => sample.view_depth,
        FogMode::Distance => sample.distance,
        FogMode::Height => sample.height,
    }
}

/// Fog amount in `[0,1]` before intensity and exclusion are applied
pub fn fog_factor(uniforms: &FogUniforms, sample: &FogSample) -> f32 {
    let s = fog_coordinate(uniforms, sample) - uniforms.params.x;
    let y = uniforms.params.y;

    let factor = if uniforms.mode == FogMode::Height {
        // y carries the inverted sign here
        match uniforms.density_mode {
            FogDensityMode::Linear => (1.0 + s * y).clamp(0.0, 1.0),
            FogDensityMode::Exponential => (s.max(0.0) * y).exp(),
            FogDensityMode::ExponentialSquared => {
                let t = s.max(0.0) * y;
                (-(t * t)).exp()
            }
        }
    } else {
        match uniforms.density_mode {
            FogDensityMode::Linear => (s * y).clamp(0.0, 1.0),
            FogDensityMode::Exponential => 1.0 - (-(s.max(0.0) * y)).exp(),
            FogDensityMode::ExponentialSquared => {
                let t = s.max(0.0) * y;
                1.0 - (-(t * t)).exp()
            }
        }
    };

    let factor = if uniforms.noise_mode == FogNoiseMode::Off {
        factor
    } else {
        let intensity = uniforms.noise_params.x;
        factor * (1.0 + (sample.noise - 1.0) * intensity)
    };

    factor.clamp(0.0, 1.0)
}

/// Blend fog over one copied pixel; `visibility` comes from the exclusion mask
pub fn composite_pixel(
    copied: Vec4,
    uniforms: &FogUniforms,
    sample: &FogSample,
    visibility: f32,
) -> Vec4 {
    let blend = fog_factor(uniforms, sample) * uniforms.color.w * visibility.clamp(0.0, 1.0);
    let rgb = copied.truncate().lerp(uniforms.color.truncate(), blend);
    rgb.extend(copied.w)
}

/// Composite a whole `width` x `height` image, rows top first
///
/// The mask is only consulted when exclusion is enabled in `uniforms`.
pub fn composite(
    copied: &[Vec4],
    samples: &[FogSample],
    width: u32,
    height: u32,
    uniforms: &FogUniforms,
    mask: Option<&ExclusionMask>,
) -> Result<Vec<Vec4>> {
    let len = width as usize * height as usize;
    if copied.len() != len || samples.len() != len {
        return Err(Error::Resource(format!(
            "composite inputs do not match {}x{} ({} colors, {} samples)",
            width,
            height,
            copied.len(),
            samples.len()
        )));
    }

    let mask = mask.filter(|_| uniforms.exclusion_enabled);
    let mut out = Vec::with_capacity(len);
    for (i, (color, sample)) in copied.iter().zip(samples).enumerate() {
        let visibility = match mask {
            Some(mask) => {
                let x = (i % width as usize) as f32 + 0.5;
                let y = (i / width as usize) as f32 + 0.5;
                let uv = Vec2::new(x / width as f32, y / height as f32);
                mask.visibility(uv, uniforms.exclusion_smoothing)
            }
            None => 1.0,
        };
        out.push(composite_pixel(*color, uniforms, sample, visibility));
    }
    Ok(out)
}
