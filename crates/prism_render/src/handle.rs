//! # Resource Handles
//!
//! Renderer resources are named by lightweight opaque tokens, never by
//! pointers into the render thread's tables. A handle is:
//! - Lower 32 bits: slot index into the owning arena
//! - Upper 32 bits: generation counter for detecting stale references
//!
//! Callers copy handles freely; only the render thread dereferences them,
//! validating the generation on every access.

/// Opaque identifier for a renderer-owned resource.
///
/// A handle is either sitting unused in a pool, held by exactly one caller
/// who has not yet freed it, or already destroyed. Using a handle after
/// freeing it is safe: the generation check fails and the operation is
/// ignored (with a log), never misdirected to a reused slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ResourceHandle(u64);

impl ResourceHandle {
    /// Null/invalid handle.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates a handle from slot index and generation.
    #[inline]
    #[must_use]
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (slot as u64))
    }

    /// Returns the slot-index portion of the handle.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks whether this is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for ResourceHandle {
    fn default() -> Self {
        Self::NULL
    }
}

/// The resource families the render server manages.
///
/// Each kind gets its own caller-side handle pool; the backend may store
/// them however it likes (the reference backend uses one shared arena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// 2D texture storage.
    Texture,
    /// Mesh with zero or more surfaces.
    Mesh,
    /// Shader program source.
    Shader,
    /// Material binding a shader plus named parameters.
    Material,
    /// Light source.
    Light,
    /// Camera.
    Camera,
    /// Render viewport.
    Viewport,
    /// 2D canvas item holding draw commands.
    CanvasItem,
}

impl ResourceKind {
    /// Number of resource kinds, for per-kind tables.
    pub const COUNT: usize = 8;

    /// All kinds, in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Texture,
        Self::Mesh,
        Self::Shader,
        Self::Material,
        Self::Light,
        Self::Camera,
        Self::Viewport,
        Self::CanvasItem,
    ];

    /// Stable index of this kind into per-kind tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_roundtrip() {
        let h = ResourceHandle::new(12345, 67890);
        assert_eq!(h.slot(), 12345);
        assert_eq!(h.generation(), 67890);
        assert!(!h.is_null());
    }

    #[test]
    fn test_null_handle() {
        assert!(ResourceHandle::NULL.is_null());
        assert!(ResourceHandle::default().is_null());
        // Generations start at 1 in the arena, so a real handle can never
        // collide with NULL.
        assert_ne!(ResourceHandle::new(u32::MAX, 0), ResourceHandle::NULL);
    }

    #[test]
    fn test_kind_indices_match_table_order() {
        for (i, kind) in ResourceKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}
