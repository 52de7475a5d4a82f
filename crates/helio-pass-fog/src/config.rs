//! Fog configuration surface
//!
//! [`FogConfig`] is the fully merged, read-only parameter set the pass
//! consumes each frame. Profiles that only touch a few fields are expressed
//! as [`FogOverrides`] and merged onto a base config before rendering.

use crate::camera::CameraTypes;
use crate::exclusion::ExclusionVolumeSet;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Quantity the fog density is a function of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FogMode {
    /// Linear view-space depth
    Depth,
    /// Euclidean distance from the camera
    #[default]
    Distance,
    /// World-space height
    Height,
}

impl FogMode {
    /// Whether `start_line`/`end_line` drive this mode
    pub fn uses_start_line(self) -> bool {
        matches!(self, FogMode::Depth | FogMode::Distance)
    }

    /// Whether `start_height`/`end_height` drive this mode
    pub fn uses_start_height(self) -> bool {
        self == FogMode::Height
    }

    pub fn uses_end_line(self, density: FogDensityMode) -> bool {
        self.uses_start_line() && density == FogDensityMode::Linear
    }

    pub fn uses_end_height(self, density: FogDensityMode) -> bool {
        self.uses_start_height() && density == FogDensityMode::Linear
    }
}

/// Falloff function mapping the fog coordinate to density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FogDensityMode {
    Linear,
    #[default]
    Exponential,
    ExponentialSquared,
}

impl FogDensityMode {
    /// Exponential falloffs take `density` directly instead of an end bound
    pub fn uses_intensity(self) -> bool {
        !matches!(self, FogDensityMode::Linear)
    }
}

/// Noise modulation applied on top of the density function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FogNoiseMode {
    #[default]
    Off,
    Procedural,
    Texture,
}

impl FogNoiseMode {
    pub fn uses_noise_texture(self) -> bool {
        self == FogNoiseMode::Texture
    }

    pub fn uses_noise_intensity(self) -> bool {
        self != FogNoiseMode::Off
    }
}

/// Fully merged fog parameters for one frame
///
/// The noise texture is a GPU resource and is handed to
/// [`FogFeature::set_noise_texture`](crate::FogFeature::set_noise_texture)
/// instead of living here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    pub mode: FogMode,
    pub density_mode: FogDensityMode,
    pub noise_mode: FogNoiseMode,
    pub start_line: f32,
    pub end_line: f32,
    pub start_height: f32,
    pub end_height: f32,
    pub density: f32,
    /// Linear RGB
    pub color: [f32; 3],
    /// Blend strength of the fog color, also the on/off switch (0 = inactive)
    pub intensity: f32,
    pub noise_intensity: f32,
    pub noise_scale: f32,
    /// UV units per second
    pub noise_scroll_speed: [f32; 2],
    pub enable_exclusion_zones: bool,
    /// Width of the soft band at exclusion edges, in screen UV units
    pub exclusion_zone_smoothing: f32,
    #[serde(skip)]
    pub exclusion_zones: ExclusionVolumeSet,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            mode: FogMode::Distance,
            density_mode: FogDensityMode::Exponential,
            noise_mode: FogNoiseMode::Off,
            start_line: 0.0,
            end_line: 100.0,
            start_height: 0.0,
            end_height: 20.0,
            density: 0.05,
            color: [0.75, 0.78, 0.82],
            intensity: 0.0,
            noise_intensity: 0.5,
            noise_scale: 1.0,
            noise_scroll_speed: [0.01, 0.0],
            enable_exclusion_zones: false,
            exclusion_zone_smoothing: 0.02,
            exclusion_zones: ExclusionVolumeSet::default(),
        }
    }
}

impl FogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fog contributes nothing while intensity is zero
    pub fn is_active(&self) -> bool {
        self.intensity > 0.0
    }

    pub fn with_mode(mut self, mode: FogMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_density_mode(mut self, density_mode: FogDensityMode) -> Self {
        self.density_mode = density_mode;
        self
    }

    pub fn with_noise_mode(mut self, noise_mode: FogNoiseMode) -> Self {
        self.noise_mode = noise_mode;
        self
    }

    pub fn with_lines(mut self, start: f32, end: f32) -> Self {
        self.start_line = start;
        self.end_line = end;
        self
    }

    pub fn with_heights(mut self, start: f32, end: f32) -> Self {
        self.start_height = start;
        self.end_height = end;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density.max(0.0);
        self
    }

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity.clamp(0.0, 1.0);
        self
    }

    pub fn with_noise(mut self, intensity: f32, scale: f32, scroll_speed: [f32; 2]) -> Self {
        self.noise_intensity = intensity.clamp(0.0, 1.0);
        self.noise_scale = scale;
        self.noise_scroll_speed = scroll_speed;
        self
    }

    pub fn with_exclusion_zones(mut self, zones: ExclusionVolumeSet, smoothing: f32) -> Self {
        self.enable_exclusion_zones = true;
        self.exclusion_zones = zones;
        self.exclusion_zone_smoothing = smoothing.clamp(0.0, 1.0);
        self
    }
}

/// A value paired with a flag telling whether it replaces the base value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Overridable<T> {
    pub value: T,
    pub overridden: bool,
}

impl<T: Clone> Overridable<T> {
    pub fn new(value: T) -> Self {
        Self { value, overridden: true }
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.overridden = true;
    }

    pub fn clear(&mut self) {
        self.overridden = false;
    }

    fn resolve(&self, base: &T) -> T {
        if self.overridden {
            self.value.clone()
        } else {
            base.clone()
        }
    }
}

/// Sparse set of per-field overrides layered on top of a [`FogConfig`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FogOverrides {
    pub mode: Overridable<FogMode>,
    pub density_mode: Overridable<FogDensityMode>,
    pub noise_mode: Overridable<FogNoiseMode>,
    pub start_line: Overridable<f32>,
    pub end_line: Overridable<f32>,
    pub start_height: Overridable<f32>,
    pub end_height: Overridable<f32>,
    pub density: Overridable<f32>,
    pub color: Overridable<[f32; 3]>,
    pub intensity: Overridable<f32>,
    pub noise_intensity: Overridable<f32>,
    pub noise_scale: Overridable<f32>,
    pub noise_scroll_speed: Overridable<[f32; 2]>,
    pub enable_exclusion_zones: Overridable<bool>,
    pub exclusion_zone_smoothing: Overridable<f32>,
    #[serde(skip)]
    pub exclusion_zones: Overridable<ExclusionVolumeSet>,
}

impl FogOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge onto `base`, keeping base values for every field not overridden
    pub fn apply(&self, base: &FogConfig) -> FogConfig {
        FogConfig {
            mode: self.mode.resolve(&base.mode),
            density_mode: self.density_mode.resolve(&base.density_mode),
            noise_mode: self.noise_mode.resolve(&base.noise_mode),
            start_line: self.start_line.resolve(&base.start_line),
            end_line: self.end_line.resolve(&base.end_line),
            start_height: self.start_height.resolve(&base.start_height),
            end_height: self.end_height.resolve(&base.end_height),
            density: self.density.resolve(&base.density),
            color: self.color.resolve(&base.color),
            intensity: self.intensity.resolve(&base.intensity),
            noise_intensity: self.noise_intensity.resolve(&base.noise_intensity),
            noise_scale: self.noise_scale.resolve(&base.noise_scale),
            noise_scroll_speed: self.noise_scroll_speed.resolve(&base.noise_scroll_speed),
            enable_exclusion_zones: self
                .enable_exclusion_zones
                .resolve(&base.enable_exclusion_zones),
            exclusion_zone_smoothing: self
                .exclusion_zone_smoothing
                .resolve(&base.exclusion_zone_smoothing),
            exclusion_zones: self.exclusion_zones.resolve(&base.exclusion_zones),
        }
    }
}

/// Points in the host frame where the fog pass may be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum InjectionPoint {
    BeforeRenderingSkybox,
    BeforeRenderingTransparents,
    #[default]
    BeforeRenderingPostProcessing,
    AfterRenderingPostProcessing,
}

/// Built-in composite shader (copy and mask shaders are fixed)
pub const DEFAULT_COMPOSITE_SHADER: &str = include_str!("../shaders/fog_composite.wgsl");

/// Host-facing settings for the fog feature
#[derive(Debug, Clone)]
pub struct FogFeatureSettings {
    pub injection_point: InjectionPoint,
    /// Camera kinds the fog is recorded for
    pub render_cameras: CameraTypes,
    /// WGSL source of the composite shader; `None` disables the feature
    pub shader_source: Option<Cow<'static, str>>,
}

impl Default for FogFeatureSettings {
    fn default() -> Self {
        Self {
            injection_point: InjectionPoint::default(),
            render_cameras: CameraTypes::GAME | CameraTypes::SCENE_VIEW,
            shader_source: Some(Cow::Borrowed(DEFAULT_COMPOSITE_SHADER)),
        }
    }
}

impl FogFeatureSettings {
    pub fn with_injection_point(mut self, point: InjectionPoint) -> Self {
        self.injection_point = point;
        self
    }

    pub fn with_render_cameras(mut self, cameras: CameraTypes) -> Self {
        self.render_cameras = cameras;
        self
    }

    pub fn with_shader_source(mut self, source: Option<Cow<'static, str>>) -> Self {
        self.shader_source = source;
        self
    }
}
