//! Per-frame fog parameter resolution
//!
//! [`resolve`] turns a [`FogConfig`] into the numeric payload the composite
//! shader consumes. It is a pure function: the same config always yields the
//! same uniforms, and nothing is cached between frames.

use crate::camera::FogCamera;
use crate::config::{FogConfig, FogDensityMode, FogMode, FogNoiseMode};
use bitflags::bitflags;
use glam::Vec4;

bitflags! {
    /// Shader keywords selecting the composite pipeline variant
    ///
    /// Exactly one flag of each mode group is set by [`resolve`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FogKeywords: u32 {
        const MODE_DEPTH = 1 << 0;
        const MODE_DISTANCE = 1 << 1;
        const MODE_HEIGHT = 1 << 2;
        const DENSITY_LINEAR = 1 << 3;
        const DENSITY_EXPONENTIAL = 1 << 4;
        const DENSITY_EXPONENTIAL_SQUARED = 1 << 5;
        const NOISE_OFF = 1 << 6;
        const NOISE_PROCEDURAL = 1 << 7;
        const NOISE_TEXTURE = 1 << 8;
        const EXCLUSION_ZONES = 1 << 9;
    }
}

impl FogKeywords {
    pub fn for_mode(mode: FogMode) -> Self {
        match mode {
            FogMode::Depth => Self::MODE_DEPTH,
            FogMode::Distance => Self::MODE_DISTANCE,
            FogMode::Height => Self::MODE_HEIGHT,
        }
    }

    pub fn for_density(density: FogDensityMode) -> Self {
        match density {
            FogDensityMode::Linear => Self::DENSITY_LINEAR,
            FogDensityMode::Exponential => Self::DENSITY_EXPONENTIAL,
            FogDensityMode::ExponentialSquared => Self::DENSITY_EXPONENTIAL_SQUARED,
        }
    }

    pub fn for_noise(noise: FogNoiseMode) -> Self {
        match noise {
            FogNoiseMode::Off => Self::NOISE_OFF,
            FogNoiseMode::Procedural => Self::NOISE_PROCEDURAL,
            FogNoiseMode::Texture => Self::NOISE_TEXTURE,
        }
    }

    /// WGSL `override` constant name for every keyword, in a fixed order
    pub fn shader_defines(self) -> [(&'static str, bool); 10] {
        [
            ("FOG_MODE_DEPTH", self.contains(Self::MODE_DEPTH)),
            ("FOG_MODE_DISTANCE", self.contains(Self::MODE_DISTANCE)),
            ("FOG_MODE_HEIGHT", self.contains(Self::MODE_HEIGHT)),
            ("FOG_DENSITY_LINEAR", self.contains(Self::DENSITY_LINEAR)),
            ("FOG_DENSITY_EXPONENTIAL", self.contains(Self::DENSITY_EXPONENTIAL)),
            ("FOG_DENSITY_EXPONENTIAL_SQUARED", self.contains(Self::DENSITY_EXPONENTIAL_SQUARED)),
            ("FOG_NOISE_OFF", self.contains(Self::NOISE_OFF)),
            ("FOG_NOISE_PROCEDURAL", self.contains(Self::NOISE_PROCEDURAL)),
            ("FOG_NOISE_TEXTURE", self.contains(Self::NOISE_TEXTURE)),
            ("FOG_EXCLUSION_ZONES", self.contains(Self::EXCLUSION_ZONES)),
        ]
    }
}

/// Resolved fog parameters for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogUniforms {
    pub mode: FogMode,
    pub density_mode: FogDensityMode,
    pub noise_mode: FogNoiseMode,
    /// x = start (line or height), y = inverse range or density, zw unused
    pub params: Vec4,
    pub keywords: FogKeywords,
    /// x = intensity, y = scale, zw = scroll speed
    pub noise_params: Vec4,
    pub exclusion_enabled: bool,
    pub exclusion_smoothing: f32,
    /// rgb = fog color, a = intensity
    pub color: Vec4,
}

/// Resolve the uniform payload for `config`
///
/// The order of the steps below matters: the height-mode sign flip is applied
/// after the inverse range or density has been chosen.
pub fn resolve(config: &FogConfig) -> FogUniforms {
    let mode = config.mode;
    let density_mode = config.density_mode;
    let noise_mode = config.noise_mode;

    let mut params = Vec4::ZERO;
    if mode.uses_start_line() {
        params.x = config.start_line;
    }
    if mode.uses_start_height() {
        params.x = config.start_height;
    }

    if density_mode.uses_intensity() {
        params.y = config.density;
    } else if mode.uses_end_line(density_mode) {
        params.y = inverse_range(config.start_line, config.end_line);
    } else if mode.uses_end_height(density_mode) {
        params.y = inverse_range(config.start_height, config.end_height);
    }

    // Height fog thins out upwards, so the falloff runs the other way
    if mode.uses_start_height() {
        params.y = -params.y;
    }

    let noise_params = if noise_mode.uses_noise_intensity() {
        Vec4::new(
            config.noise_intensity,
            config.noise_scale,
            config.noise_scroll_speed[0],
            config.noise_scroll_speed[1],
        )
    } else {
        Vec4::ZERO
    };

    let mut keywords = FogKeywords::for_mode(mode)
        | FogKeywords::for_density(density_mode)
        | FogKeywords::for_noise(noise_mode);
    if config.enable_exclusion_zones {
        keywords |= FogKeywords::EXCLUSION_ZONES;
    }

    let [r, g, b] = config.color;

    FogUniforms {
        mode,
        density_mode,
        noise_mode,
        params,
        keywords,
        noise_params,
        exclusion_enabled: config.enable_exclusion_zones,
        exclusion_smoothing: if config.enable_exclusion_zones {
            config.exclusion_zone_smoothing.max(0.0)
        } else {
            0.0
        },
        color: Vec4::new(r, g, b, config.intensity),
    }
}

/// `1 / (end - start)`, saturating to `f32::MAX` when the range is empty or
/// too narrow for the reciprocal to stay finite
fn inverse_range(start: f32, end: f32) -> f32 {
    let delta = end - start;
    let inverse = 1.0 / delta;
    if delta == 0.0 {
        f32::MAX
    } else if !inverse.is_finite() {
        f32::MAX.copysign(delta)
    } else {
        inverse
    }
}

/// GPU uniform block (must match WGSL struct `FogParams`)
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct GpuFogParams {
    pub inv_view_proj: [[f32; 4]; 4], // offset 0
    pub view: [[f32; 4]; 4],          // offset 64
    pub camera_position: [f32; 3],    // offset 128
    pub time: f32,
    pub color: [f32; 4],              // offset 144
    pub main_params: [f32; 4],        // offset 160
    pub noise_params: [f32; 4],       // offset 176
    pub screen_size: [f32; 2],        // offset 192
    pub exclusion_smoothing: f32,
    pub _pad: f32,
}

const _: () = assert!(std::mem::size_of::<GpuFogParams>() == 208);

impl GpuFogParams {
    pub fn new(uniforms: &FogUniforms, camera: &FogCamera) -> Self {
        Self {
            inv_view_proj: camera.inverse_view_projection().to_cols_array_2d(),
            view: camera.view.to_cols_array_2d(),
            camera_position: camera.position.to_array(),
            time: camera.time,
            color: uniforms.color.to_array(),
            main_params: uniforms.params.to_array(),
            noise_params: uniforms.noise_params.to_array(),
            screen_size: [camera.width as f32, camera.height as f32],
            exclusion_smoothing: uniforms.exclusion_smoothing,
            _pad: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::{composite_pixel, fog_factor, FogSample};

    #[test]
    fn linear_distance_uses_inverse_range() {
        let config = FogConfig::default()
            .with_density_mode(FogDensityMode::Linear)
            .with_lines(10.0, 50.0);
        let u = resolve(&config);
        assert_eq!(u.params.x, 10.0);
        assert!((u.params.y - 1.0 / 40.0).abs() < 1e-7);
        assert_eq!(u.params.z, 0.0);
        assert_eq!(u.params.w, 0.0);
    }

    #[test]
    fn exponential_uses_density_directly() {
        let config = FogConfig::default()
            .with_mode(FogMode::Depth)
            .with_density_mode(FogDensityMode::ExponentialSquared)
            .with_lines(3.0, 3.0)
            .with_density(0.25);
        let u = resolve(&config);
        assert_eq!(u.params.x, 3.0);
        assert_eq!(u.params.y, 0.25);
    }

    #[test]
    fn height_linear_inverts_after_reciprocal() {
        let config = FogConfig::default()
            .with_mode(FogMode::Height)
            .with_density_mode(FogDensityMode::Linear)
            .with_lines(100.0, 200.0)
            .with_heights(2.0, 6.0);
        let u = resolve(&config);
        assert_eq!(u.params.x, 2.0);
        assert!((u.params.y + 0.25).abs() < 1e-7);
    }

    #[test]
    fn empty_range_saturates() {
        let config = FogConfig::default()
            .with_density_mode(FogDensityMode::Linear)
            .with_lines(7.0, 7.0);
        let u = resolve(&config);
        assert_eq!(u.params.y, f32::MAX);
        assert!(u.params.y.is_finite());

        let height = config.with_mode(FogMode::Height).with_heights(1.0, 1.0);
        assert_eq!(resolve(&height).params.y, -f32::MAX);
    }

    #[test]
    fn subnormal_range_saturates_instead_of_overflowing() {
        let config = FogConfig::default()
            .with_density_mode(FogDensityMode::Linear)
            .with_lines(0.0, 1e-40);
        let u = resolve(&config);
        assert_eq!(u.params.y, f32::MAX);

        // At the start line the factor is 0 * y, which must stay a number
        let sample = FogSample {
            view_depth: 0.0,
            distance: 0.0,
            height: 0.0,
            noise: 1.0,
        };
        assert_eq!(fog_factor(&u, &sample), 0.0);
        assert!(composite_pixel(Vec4::ONE, &u, &sample, 1.0).is_finite());
    }

    #[test]
    fn noise_params_only_when_noise_is_on() {
        let base = FogConfig::default().with_noise(0.7, 3.0, [0.1, -0.2]);
        assert_eq!(resolve(&base).noise_params, Vec4::ZERO);

        let noisy = base.with_noise_mode(FogNoiseMode::Procedural);
        assert_eq!(resolve(&noisy).noise_params, Vec4::new(0.7, 3.0, 0.1, -0.2));
    }

    #[test]
    fn keywords_pick_one_flag_per_group() {
        let config = FogConfig::default()
            .with_mode(FogMode::Height)
            .with_density_mode(FogDensityMode::Linear)
            .with_noise_mode(FogNoiseMode::Texture);
        let k = resolve(&config).keywords;
        assert_eq!(
            k,
            FogKeywords::MODE_HEIGHT | FogKeywords::DENSITY_LINEAR | FogKeywords::NOISE_TEXTURE
        );
        let on = k.shader_defines().iter().filter(|(_, v)| *v).count();
        assert_eq!(on, 3);
    }

    #[test]
    fn exclusion_flag_and_smoothing() {
        let mut config = FogConfig::default();
        config.exclusion_zone_smoothing = 0.3;
        let u = resolve(&config);
        assert!(!u.exclusion_enabled);
        assert_eq!(u.exclusion_smoothing, 0.0);

        config.enable_exclusion_zones = true;
        let u = resolve(&config);
        assert!(u.keywords.contains(FogKeywords::EXCLUSION_ZONES));
        assert_eq!(u.exclusion_smoothing, 0.3);
    }

    #[test]
    fn color_alpha_carries_intensity() {
        let config = FogConfig::default().with_color([0.1, 0.2, 0.3]).with_intensity(0.6);
        assert_eq!(resolve(&config).color, Vec4::new(0.1, 0.2, 0.3, 0.6));
    }
}
