//! Feature system
//!
//! The fog is exposed to the host renderer as a [`Feature`]: registered once,
//! prepared every frame with the resolved [`FogConfig`](crate::FogConfig),
//! then recorded into the frame's command encoder at its injection point.

mod context;
mod traits;
pub mod fog;

pub use context::{
    color_target_issue, depth_target_issue, ColorTarget, DepthTarget, FeatureContext,
    FrameContext, PrepareContext, RequiredInputs,
};
pub use fog::FogFeature;
pub use traits::Feature;
