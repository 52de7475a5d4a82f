//! Feature trait definition

use super::{FeatureContext, FrameContext, PrepareContext};
use crate::Result;

/// Feature trait - the host renderer's interface to a pluggable effect
///
/// **Lifecycle:**
/// 1. `register()` - Called once during renderer initialization
/// 2. `prepare()` - Called every frame, per camera, before recording
/// 3. `record()` - Called at the feature's injection point
/// 4. `cleanup()` - Called when the renderer is destroyed
pub trait Feature: Send + Sync {
    /// Unique name for this feature (lowercase snake_case)
    fn name(&self) -> &str;

    /// Create persistent GPU resources
    fn register(&mut self, ctx: &mut FeatureContext) -> Result<()>;

    /// Update per-frame data
    fn prepare(&mut self, ctx: &PrepareContext) -> Result<()>;

    /// Record GPU work for the prepared frame
    fn record(&mut self, ctx: &mut FrameContext) -> Result<()>;

    /// Cleanup GPU resources
    fn cleanup(&mut self, device: &wgpu::Device) {
        let _ = device;
    }

    /// Check if feature is currently enabled
    fn is_enabled(&self) -> bool {
        true
    }

    /// Enable or disable this feature
    fn set_enabled(&mut self, enabled: bool) {
        let _ = enabled;
    }
}
