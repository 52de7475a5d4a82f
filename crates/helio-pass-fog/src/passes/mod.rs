//! Fog render passes

pub mod composite;
pub mod copy;
pub mod mask;

pub use composite::{CompositeBindings, FogCompositePass};
pub use copy::CopyColorPass;
pub use mask::{ExclusionMaskPass, MAX_EXCLUSION_RECTS};
