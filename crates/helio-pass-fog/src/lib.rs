//! Helio Fog Pass - full-screen fog as a pluggable render feature
//!
//! The fog is applied as a post-process over the lit color buffer and is
//! recorded into a small render graph once per camera per frame:
//!
//! - **Copy** snapshots the camera color target so the composite can read it
//!   while writing the same attachment
//! - **Exclusion mask** (optional) rasterizes the screen-space footprint of
//!   exclusion volumes into a single-channel mask
//! - **Composite** blends fog over the snapshot, attenuated by the mask
//!
//! Fog parameters are resolved on the CPU into a uniform block and a set of
//! keyword flags that select a pre-compiled pipeline variant.

pub mod camera;
pub mod config;
pub mod evaluate;
pub mod exclusion;
pub mod features;
pub mod graph;
pub mod params;
pub mod passes;
pub mod pipeline;
pub mod resources;

pub use camera::{CameraTypes, FogCamera};
pub use config::{
    FogConfig, FogDensityMode, FogMode, FogNoiseMode, FogOverrides, FogFeatureSettings,
    InjectionPoint, Overridable,
};
pub use exclusion::{
    Aabb, ColliderId, ExclusionMarker, ExclusionMask, ExclusionVolume, ExclusionVolumeSet,
    ExclusionZoneQuery, ExclusionZoneRegistry, SceneCollider, ScreenRect,
};
pub use evaluate::{composite_pixel, fog_factor, FogSample};
pub use features::{
    ColorTarget, DepthTarget, Feature, FeatureContext, FogFeature, FrameContext, PrepareContext,
    RequiredInputs,
};
pub use params::{resolve, FogKeywords, FogUniforms};

/// Result type for fog pass operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up or recording the fog pass
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Feature error: {0}")]
    Feature(String),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Shader error: {0}")]
    Shader(String),
}
