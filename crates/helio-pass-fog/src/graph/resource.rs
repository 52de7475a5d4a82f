//! Resource identities for the fog graph

/// Pass identifier
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct PassId(pub usize);

/// Resource handle for graph resources
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct ResourceHandle(pub u64);

impl ResourceHandle {
    /// Create a named resource handle (deterministic)
    pub fn named(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Host color attachment the fog is composited into
    pub fn camera_color() -> Self {
        Self::named("camera_color")
    }

    /// Host depth attachment
    pub fn camera_depth() -> Self {
        Self::named("camera_depth")
    }

    /// Snapshot of the camera color taken before compositing
    pub fn fog_copied_color() -> Self {
        Self::named("fog_copied_color")
    }

    pub fn fog_exclusion_mask() -> Self {
        Self::named("fog_exclusion_mask")
    }
}
