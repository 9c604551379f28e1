//! # Render Backend Contract
//!
//! The submission side of the façade: whatever actually performs rendering
//! work implements [`RenderBackend`]. The façade never inspects backend
//! state - it forwards every call over the command queue and hands results
//! back. Exactly one thread (the render thread, or the constructing thread
//! in single-threaded mode) invokes these methods.

use crate::handle::{ResourceHandle, ResourceKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cached render statistics, shared between the backend (writer) and any
/// caller thread (readers).
///
/// Reads bypass the command queue entirely - the "direct pass-through"
/// template. Values are approximate while the render thread is working;
/// use [`RenderServer::sync`](crate::server::RenderServer::sync) first when
/// an exact snapshot matters.
#[derive(Debug, Default)]
pub struct RenderStats {
    frames_drawn: AtomicU64,
    draw_calls: AtomicU64,
    resources_live: AtomicU64,
    ticks: AtomicU64,
}

impl RenderStats {
    /// Creates a zeroed statistics block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total frames the backend has drawn.
    #[inline]
    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn.load(Ordering::Relaxed)
    }

    /// Total draw commands issued across all frames.
    #[inline]
    #[must_use]
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls.load(Ordering::Relaxed)
    }

    /// Resources currently live on the backend (pooled handles included -
    /// they are real, not-yet-assigned resources).
    #[inline]
    #[must_use]
    pub fn resources_live(&self) -> u64 {
        self.resources_live.load(Ordering::Relaxed)
    }

    /// Total ticks the backend has processed.
    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Backend side: records one drawn frame.
    #[inline]
    pub fn record_frame(&self) {
        self.frames_drawn.fetch_add(1, Ordering::Relaxed);
    }

    /// Backend side: records `count` draw commands.
    #[inline]
    pub fn record_draw_calls(&self, count: u64) {
        self.draw_calls.fetch_add(count, Ordering::Relaxed);
    }

    /// Backend side: records one resource created.
    #[inline]
    pub fn record_resource_created(&self) {
        self.resources_live.fetch_add(1, Ordering::Relaxed);
    }

    /// Backend side: records one resource destroyed.
    #[inline]
    pub fn record_resource_freed(&self) {
        self.resources_live.fetch_sub(1, Ordering::Relaxed);
    }

    /// Backend side: records one processed tick.
    #[inline]
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }
}

/// The operations a renderer must provide for the façade to forward.
///
/// Mutators are fire-and-forget at the façade (queued, never awaited);
/// queries are call-and-wait. Implementations may assume single-threaded
/// access: the façade guarantees exactly one thread calls in.
///
/// Invalid or stale handles must be ignored safely (typically with a log),
/// never panicked on - a caller racing its own `free` is allowed by the
/// fire-and-forget contract.
pub trait RenderBackend: Send + 'static {
    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// One-time startup on the owning thread, before any other call.
    fn init(&mut self);

    /// Final teardown on the owning thread, after the queue is drained.
    fn finish(&mut self);

    /// Draws one frame. `frame_step` is the seconds elapsed since the
    /// previous frame.
    fn draw(&mut self, frame_step: f64);

    /// Advances per-frame bookkeeping without drawing.
    fn tick(&mut self);

    // ------------------------------------------------------------------
    // Resource lifetime
    // ------------------------------------------------------------------

    /// Creates a new, empty resource of `kind` and returns its handle.
    fn create_resource(&mut self, kind: ResourceKind) -> ResourceHandle;

    /// Frees a resource of any kind. Invalid handles are ignored.
    fn free_resource(&mut self, handle: ResourceHandle);

    /// Number of live resources of `kind`.
    fn resource_count(&self, kind: ResourceKind) -> usize;

    // ------------------------------------------------------------------
    // Texture
    // ------------------------------------------------------------------

    /// Allocates backing storage for a texture.
    fn texture_allocate(&mut self, texture: ResourceHandle, width: u32, height: u32);

    /// Uploads pixel data into a texture.
    fn texture_set_data(&mut self, texture: ResourceHandle, data: Vec<u8>);

    /// Returns the allocated size of a texture, if the handle is live.
    fn texture_size(&self, texture: ResourceHandle) -> Option<(u32, u32)>;

    // ------------------------------------------------------------------
    // Mesh
    // ------------------------------------------------------------------

    /// Appends a surface to a mesh.
    fn mesh_add_surface(&mut self, mesh: ResourceHandle, vertex_data: Vec<u8>, vertex_count: u32);

    /// Removes all surfaces from a mesh.
    fn mesh_clear(&mut self, mesh: ResourceHandle);

    /// Number of surfaces on a mesh (0 for invalid handles).
    fn mesh_surface_count(&self, mesh: ResourceHandle) -> usize;

    /// Vertex count and raw vertex bytes of one surface, by index.
    fn mesh_surface_data(
        &self,
        mesh: ResourceHandle,
        surface_index: usize,
    ) -> Option<(u32, Vec<u8>)>;

    // ------------------------------------------------------------------
    // Shader / material
    // ------------------------------------------------------------------

    /// Replaces a shader's source code.
    fn shader_set_code(&mut self, shader: ResourceHandle, code: String);

    /// Returns a shader's source code, if the handle is live.
    fn shader_code(&self, shader: ResourceHandle) -> Option<String>;

    /// Binds a shader to a material.
    fn material_set_shader(&mut self, material: ResourceHandle, shader: ResourceHandle);

    /// Returns the shader bound to a material.
    fn material_shader(&self, material: ResourceHandle) -> Option<ResourceHandle>;

    /// Sets a named material parameter.
    fn material_set_param(&mut self, material: ResourceHandle, name: String, value: f32);

    /// Returns a named material parameter.
    fn material_param(&self, material: ResourceHandle, name: &str) -> Option<f32>;

    // ------------------------------------------------------------------
    // Light
    // ------------------------------------------------------------------

    /// Sets a light's color.
    fn light_set_color(&mut self, light: ResourceHandle, color: [f32; 3]);

    /// Sets a light's energy multiplier.
    fn light_set_energy(&mut self, light: ResourceHandle, energy: f32);

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    /// Resizes a viewport.
    fn viewport_set_size(&mut self, viewport: ResourceHandle, width: u32, height: u32);

    /// Enables or disables a viewport for drawing.
    fn viewport_set_active(&mut self, viewport: ResourceHandle, active: bool);

    /// Returns a viewport's size, if the handle is live.
    fn viewport_size(&self, viewport: ResourceHandle) -> Option<(u32, u32)>;

    // ------------------------------------------------------------------
    // Canvas
    // ------------------------------------------------------------------

    /// Appends a filled rectangle to a canvas item.
    fn canvas_item_add_rect(&mut self, item: ResourceHandle, rect: [f32; 4], color: [f32; 4]);

    /// Clears all commands from a canvas item.
    fn canvas_item_clear(&mut self, item: ResourceHandle);

    /// Recorded rectangle commands of a canvas item, as (rect, color)
    /// pairs. Empty for invalid handles.
    fn canvas_item_rects(&self, item: ResourceHandle) -> Vec<([f32; 4], [f32; 4])>;

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    /// Shared statistics block. The façade reads it without queueing.
    fn stats(&self) -> Arc<RenderStats>;
}
