//! # Render Server Façade
//!
//! [`RenderServer`] presents the whole rendering API synchronously on any
//! caller thread while guaranteeing that exactly one thread mutates the
//! backend. It replaces the classic pair of global singletons (a queueing
//! front and a submission back) with one explicit context object,
//! constructed once from [`RenderConfig`] and shared by `Arc`.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──init()──> Running ──finish()──> Uninitialized
//! ```
//!
//! `init` spawns the render thread (threaded mode) and blocks until it
//! reports up, or adopts the calling thread as the server thread
//! (single-threaded mode). `finish` releases the handle pools, runs an
//! exit work item through the queue, and joins the thread; everything
//! pushed before `finish` executes before the thread exits.
//!
//! ## Dispatch
//!
//! Every public operation is one instantiation of a generic forwarding
//! helper:
//! - [`queue_operation`](RenderServer::queue_operation) - fire-and-forget
//! - [`queue_synced_operation`](RenderServer::queue_synced_operation) -
//!   call-and-wait
//! - direct atomic reads for statistics
//!
//! When the caller already *is* the server thread (always true in
//! single-threaded mode), both helpers dispatch directly instead of
//! queueing - queueing from the consumer thread would deadlock.

use crate::backend::{RenderBackend, RenderStats};
use crate::config::RenderConfig;
use crate::handle::{ResourceHandle, ResourceKind};
use crate::pool::HandlePools;
use parking_lot::{Mutex, RwLock};
use prism_core::CommandQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use tracing::{debug, info};

/// Cross-thread façade over a [`RenderBackend`].
///
/// Cheap to share (`Arc`), safe to call from any thread. See the module
/// docs for the threading contract.
pub struct RenderServer<B: RenderBackend> {
    queue: CommandQueue,
    backend: Arc<Mutex<B>>,
    stats: Arc<RenderStats>,
    pools: HandlePools,
    create_thread: bool,
    /// Identity of the thread that owns backend state. `None` while
    /// uninitialized.
    server_thread: RwLock<Option<ThreadId>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
    exit: Arc<AtomicBool>,
    draw_pending: Arc<AtomicBool>,
}

impl<B: RenderBackend> RenderServer<B> {
    /// Creates a server from a configuration and a backend.
    ///
    /// Both configuration values are read here, once; the threading mode
    /// never changes afterwards.
    ///
    /// # Panics
    ///
    /// Panics if `config.pool_prealloc` is zero (use
    /// [`RenderConfig::validate`] to surface that as an error instead).
    #[must_use]
    pub fn new(config: &RenderConfig, backend: B) -> Arc<Self> {
        let stats = backend.stats();
        Arc::new(Self {
            queue: CommandQueue::new(),
            backend: Arc::new(Mutex::new(backend)),
            stats,
            pools: HandlePools::new(config.pool_prealloc),
            create_thread: config.create_thread,
            server_thread: RwLock::new(None),
            thread: Mutex::new(None),
            started: AtomicBool::new(false),
            exit: Arc::new(AtomicBool::new(false)),
            draw_pending: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns whether this server runs a dedicated render thread.
    #[must_use]
    pub fn is_threaded(&self) -> bool {
        self.create_thread
    }

    /// Whether the current thread is the one owning backend state.
    fn is_server_thread(&self) -> bool {
        self.server_thread
            .read()
            .is_some_and(|id| id == thread::current().id())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Starts the server.
    ///
    /// Threaded mode: spawns the render thread and blocks until it has
    /// initialized the backend and reported up. The handshake is a polled
    /// flag - startup happens once, latency is irrelevant.
    ///
    /// Single-threaded mode: the calling thread becomes the server thread
    /// and the backend is initialized inline.
    pub fn init(self: &Arc<Self>) {
        debug_assert!(
            !self.started.load(Ordering::Acquire),
            "init() on a running render server"
        );

        if !self.create_thread {
            *self.server_thread.write() = Some(thread::current().id());
            self.backend.lock().init();
            self.started.store(true, Ordering::Release);
            info!("render server up (single-threaded)");
            return;
        }

        info!("spawning render thread");
        let server = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("prism-render".to_owned())
            .spawn(move || server.thread_loop())
            .expect("failed to spawn render thread");
        *self.thread.lock() = Some(handle);

        while !self.started.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(1));
        }
        info!("render thread up");
    }

    /// The render thread's consumption loop: Idle -> Executing -> Idle,
    /// until the exit work item flips the flag, then a final drain.
    fn thread_loop(&self) {
        *self.server_thread.write() = Some(thread::current().id());
        self.backend.lock().init();
        self.exit.store(false, Ordering::Release);
        self.started.store(true, Ordering::Release);

        while !self.exit.load(Ordering::Acquire) {
            self.queue.wait_and_flush_one();
        }

        // Exit was requested; everything still queued runs before we go.
        self.queue.flush_all();
        self.backend.lock().finish();
        debug!("render thread exiting");
    }

    /// Stops the server.
    ///
    /// Threaded mode: synchronously releases every pooled handle on the
    /// render thread, pushes the exit work item, and joins. Work items
    /// pushed before this call all execute first (FIFO), and none pushed
    /// concurrently are dropped - the loop drains the queue on its way
    /// out.
    ///
    /// Single-threaded mode: frees pooled handles and finishes the backend
    /// inline.
    ///
    /// Handles already handed to callers are not touched; freeing those is
    /// the caller's responsibility via [`free`](Self::free).
    ///
    /// # Panics
    ///
    /// Panics if the render thread itself panicked.
    pub fn finish(&self) {
        debug_assert!(
            !(self.create_thread && self.is_server_thread()),
            "finish() from the render thread would deadlock"
        );

        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            for kind in ResourceKind::ALL {
                let cached = self.pools.drain(kind);
                if cached.is_empty() {
                    continue;
                }
                debug!(?kind, count = cached.len(), "releasing pooled handles");
                let backend = Arc::clone(&self.backend);
                self.queue.push_and_sync(move || {
                    let mut backend = backend.lock();
                    for h in cached {
                        backend.free_resource(h);
                    }
                });
            }

            let exit = Arc::clone(&self.exit);
            self.queue.push(move || exit.store(true, Ordering::Release));
            handle.join().expect("render thread panicked");
            info!("render thread joined");
        } else {
            // Other threads may have queued work without a barrier; run the
            // backlog before teardown so nothing is dropped. Must happen
            // before taking the backend lock - the items lock it themselves.
            self.queue.flush_all();
            let mut backend = self.backend.lock();
            for kind in ResourceKind::ALL {
                for h in self.pools.drain(kind) {
                    backend.free_resource(h);
                }
            }
            backend.finish();
        }

        self.started.store(false, Ordering::Release);
        *self.server_thread.write() = None;
        info!("render server down");
    }

    // ------------------------------------------------------------------
    // Generic forwarding helpers
    // ------------------------------------------------------------------

    /// Fire-and-forget forwarding: runs `op` against the backend on the
    /// server thread, returning immediately.
    ///
    /// From the server thread itself the call dispatches directly, which
    /// is what keeps render-thread callbacks (and the whole single-threaded
    /// mode) from deadlocking on their own queue.
    pub fn queue_operation<F>(&self, op: F)
    where
        F: FnOnce(&mut B) + Send + 'static,
    {
        if self.is_server_thread() {
            op(&mut self.backend.lock());
        } else {
            let backend = Arc::clone(&self.backend);
            self.queue.push(move || op(&mut backend.lock()));
        }
    }

    /// Call-and-wait forwarding: runs `op` on the server thread and blocks
    /// until its result is available.
    pub fn queue_synced_operation<F, R>(&self, op: F) -> R
    where
        F: FnOnce(&mut B) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_server_thread() {
            op(&mut self.backend.lock())
        } else {
            let backend = Arc::clone(&self.backend);
            self.queue.push_and_sync(move || op(&mut backend.lock()))
        }
    }

    /// Pool-backed resource creation: warm pools cost one lock and a pop;
    /// an empty pool pays a single blocking batch-creation work item.
    fn create_handle(&self, kind: ResourceKind) -> ResourceHandle {
        if self.create_thread && !self.is_server_thread() {
            self.pools.allocate(kind, |batch| {
                let backend = Arc::clone(&self.backend);
                self.queue.push_and_sync(move || {
                    let mut backend = backend.lock();
                    (0..batch).map(|_| backend.create_resource(kind)).collect()
                })
            })
        } else {
            self.backend.lock().create_resource(kind)
        }
    }

    // ------------------------------------------------------------------
    // Per-frame protocol
    // ------------------------------------------------------------------

    /// Requests one frame. At most one draw work item is outstanding at a
    /// time: extra calls while a draw is pending coalesce into it instead
    /// of queueing again. Single-threaded mode draws inline.
    pub fn draw(&self, frame_step: f64) {
        if self.create_thread && !self.is_server_thread() {
            if self
                .draw_pending
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let backend = Arc::clone(&self.backend);
                let draw_pending = Arc::clone(&self.draw_pending);
                self.queue.push(move || {
                    backend.lock().draw(frame_step);
                    draw_pending.store(false, Ordering::Release);
                });
            } else {
                debug!("draw request coalesced into pending draw");
            }
        } else {
            self.backend.lock().draw(frame_step);
        }
    }

    /// Explicit barrier: returns once every operation this thread pushed
    /// earlier has executed. Use before trusting the direct-pass-through
    /// statistics for an exact snapshot.
    pub fn sync(&self) {
        if self.create_thread {
            debug_assert!(
                !self.is_server_thread(),
                "sync() from the render thread would deadlock"
            );
            self.queue.push_and_sync(|| {});
        } else {
            // Single-threaded servers still accept pushes from other
            // threads; the barrier is where they get executed.
            self.queue.flush_all();
        }
    }

    /// Advances backend bookkeeping without drawing.
    pub fn tick(&self) {
        self.queue_operation(B::tick);
    }

    // ------------------------------------------------------------------
    // Resource lifetime
    // ------------------------------------------------------------------

    /// Creates an empty texture.
    pub fn texture_create(&self) -> ResourceHandle {
        self.create_handle(ResourceKind::Texture)
    }

    /// Creates an empty mesh.
    pub fn mesh_create(&self) -> ResourceHandle {
        self.create_handle(ResourceKind::Mesh)
    }

    /// Creates an empty shader.
    pub fn shader_create(&self) -> ResourceHandle {
        self.create_handle(ResourceKind::Shader)
    }

    /// Creates an empty material.
    pub fn material_create(&self) -> ResourceHandle {
        self.create_handle(ResourceKind::Material)
    }

    /// Creates a light.
    pub fn light_create(&self) -> ResourceHandle {
        self.create_handle(ResourceKind::Light)
    }

    /// Creates a camera.
    pub fn camera_create(&self) -> ResourceHandle {
        self.create_handle(ResourceKind::Camera)
    }

    /// Creates a viewport.
    pub fn viewport_create(&self) -> ResourceHandle {
        self.create_handle(ResourceKind::Viewport)
    }

    /// Creates an empty canvas item.
    pub fn canvas_item_create(&self) -> ResourceHandle {
        self.create_handle(ResourceKind::CanvasItem)
    }

    /// Frees a resource of any kind. Stale handles are ignored on the
    /// render thread, so racing a pending setter is harmless.
    pub fn free(&self, handle: ResourceHandle) {
        self.queue_operation(move |b| b.free_resource(handle));
    }

    /// Number of live resources of `kind` on the backend. Includes
    /// pool-cached handles, which are real resources awaiting assignment.
    #[must_use]
    pub fn resource_count(&self, kind: ResourceKind) -> usize {
        self.queue_synced_operation(move |b| b.resource_count(kind))
    }

    // ------------------------------------------------------------------
    // Texture
    // ------------------------------------------------------------------

    /// Allocates backing storage for a texture.
    pub fn texture_allocate(&self, texture: ResourceHandle, width: u32, height: u32) {
        self.queue_operation(move |b| b.texture_allocate(texture, width, height));
    }

    /// Uploads pixel data into a texture.
    pub fn texture_set_data(&self, texture: ResourceHandle, data: Vec<u8>) {
        self.queue_operation(move |b| b.texture_set_data(texture, data));
    }

    /// Returns the allocated size of a texture.
    #[must_use]
    pub fn texture_size(&self, texture: ResourceHandle) -> Option<(u32, u32)> {
        self.queue_synced_operation(move |b| b.texture_size(texture))
    }

    // ------------------------------------------------------------------
    // Mesh
    // ------------------------------------------------------------------

    /// Appends a surface to a mesh.
    pub fn mesh_add_surface(&self, mesh: ResourceHandle, vertex_data: Vec<u8>, vertex_count: u32) {
        self.queue_operation(move |b| b.mesh_add_surface(mesh, vertex_data, vertex_count));
    }

    /// Removes all surfaces from a mesh.
    pub fn mesh_clear(&self, mesh: ResourceHandle) {
        self.queue_operation(move |b| b.mesh_clear(mesh));
    }

    /// Number of surfaces on a mesh.
    #[must_use]
    pub fn mesh_surface_count(&self, mesh: ResourceHandle) -> usize {
        self.queue_synced_operation(move |b| b.mesh_surface_count(mesh))
    }

    /// Vertex count and raw vertex bytes of one mesh surface, by index.
    #[must_use]
    pub fn mesh_surface_data(
        &self,
        mesh: ResourceHandle,
        surface_index: usize,
    ) -> Option<(u32, Vec<u8>)> {
        self.queue_synced_operation(move |b| b.mesh_surface_data(mesh, surface_index))
    }

    // ------------------------------------------------------------------
    // Shader / material
    // ------------------------------------------------------------------

    /// Replaces a shader's source code.
    pub fn shader_set_code(&self, shader: ResourceHandle, code: impl Into<String>) {
        let code = code.into();
        self.queue_operation(move |b| b.shader_set_code(shader, code));
    }

    /// Returns a shader's source code.
    #[must_use]
    pub fn shader_code(&self, shader: ResourceHandle) -> Option<String> {
        self.queue_synced_operation(move |b| b.shader_code(shader))
    }

    /// Binds a shader to a material.
    pub fn material_set_shader(&self, material: ResourceHandle, shader: ResourceHandle) {
        self.queue_operation(move |b| b.material_set_shader(material, shader));
    }

    /// Returns the shader bound to a material.
    #[must_use]
    pub fn material_shader(&self, material: ResourceHandle) -> Option<ResourceHandle> {
        self.queue_synced_operation(move |b| b.material_shader(material))
    }

    /// Sets a named material parameter.
    pub fn material_set_param(
        &self,
        material: ResourceHandle,
        name: impl Into<String>,
        value: f32,
    ) {
        let name = name.into();
        self.queue_operation(move |b| b.material_set_param(material, name, value));
    }

    /// Returns a named material parameter.
    #[must_use]
    pub fn material_param(&self, material: ResourceHandle, name: impl Into<String>) -> Option<f32> {
        let name = name.into();
        self.queue_synced_operation(move |b| b.material_param(material, &name))
    }

    // ------------------------------------------------------------------
    // Light
    // ------------------------------------------------------------------

    /// Sets a light's color.
    pub fn light_set_color(&self, light: ResourceHandle, color: [f32; 3]) {
        self.queue_operation(move |b| b.light_set_color(light, color));
    }

    /// Sets a light's energy multiplier.
    pub fn light_set_energy(&self, light: ResourceHandle, energy: f32) {
        self.queue_operation(move |b| b.light_set_energy(light, energy));
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    /// Resizes a viewport.
    pub fn viewport_set_size(&self, viewport: ResourceHandle, width: u32, height: u32) {
        self.queue_operation(move |b| b.viewport_set_size(viewport, width, height));
    }

    /// Enables or disables a viewport for drawing.
    pub fn viewport_set_active(&self, viewport: ResourceHandle, active: bool) {
        self.queue_operation(move |b| b.viewport_set_active(viewport, active));
    }

    /// Returns a viewport's size.
    #[must_use]
    pub fn viewport_size(&self, viewport: ResourceHandle) -> Option<(u32, u32)> {
        self.queue_synced_operation(move |b| b.viewport_size(viewport))
    }

    // ------------------------------------------------------------------
    // Canvas
    // ------------------------------------------------------------------

    /// Appends a filled rectangle to a canvas item.
    pub fn canvas_item_add_rect(&self, item: ResourceHandle, rect: [f32; 4], color: [f32; 4]) {
        self.queue_operation(move |b| b.canvas_item_add_rect(item, rect, color));
    }

    /// Clears all commands from a canvas item.
    pub fn canvas_item_clear(&self, item: ResourceHandle) {
        self.queue_operation(move |b| b.canvas_item_clear(item));
    }

    /// Recorded rectangle commands of a canvas item, as (rect, color) pairs.
    #[must_use]
    pub fn canvas_item_rects(&self, item: ResourceHandle) -> Vec<([f32; 4], [f32; 4])> {
        self.queue_synced_operation(move |b| b.canvas_item_rects(item))
    }

    // ------------------------------------------------------------------
    // Direct pass-through (no queue, approximate by contract)
    // ------------------------------------------------------------------

    /// Shared statistics block, readable from any thread without
    /// synchronization. Approximate while the render thread is working;
    /// call [`sync`](Self::sync) first for an exact snapshot.
    #[must_use]
    pub fn stats(&self) -> Arc<RenderStats> {
        Arc::clone(&self.stats)
    }

    /// Frames drawn so far. Direct pass-through.
    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.stats.frames_drawn()
    }

    /// Draw commands issued so far. Direct pass-through.
    #[must_use]
    pub fn draw_calls(&self) -> u64 {
        self.stats.draw_calls()
    }

    /// Live backend resources. Direct pass-through.
    #[must_use]
    pub fn resources_live(&self) -> u64 {
        self.stats.resources_live()
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Handles currently cached in the pool for `kind`.
    #[must_use]
    pub fn pooled(&self, kind: ResourceKind) -> usize {
        self.pools.cached(kind)
    }

    /// Pool refill batches performed for `kind` so far.
    #[must_use]
    pub fn pool_refills(&self, kind: ResourceKind) -> u64 {
        self.pools.refill_count(kind)
    }

    /// Work items currently queued. Approximate; instrumentation only.
    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.queue.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterBackend;

    #[test]
    fn test_single_threaded_runs_inline() {
        let server = RenderServer::new(&RenderConfig::single_threaded(), RasterBackend::new());
        server.init();

        let tex = server.texture_create();
        server.texture_allocate(tex, 64, 64);
        // No queue involved: state is visible immediately, nothing pending.
        assert_eq!(server.texture_size(tex), Some((64, 64)));
        assert_eq!(server.pending_commands(), 0);
        // Pools are bypassed on the server thread.
        assert_eq!(server.pool_refills(ResourceKind::Texture), 0);

        server.draw(1.0 / 60.0);
        assert_eq!(server.frames_drawn(), 1);

        server.finish();
    }

    #[test]
    fn test_single_threaded_executes_foreign_pushes_on_sync() {
        let server = RenderServer::new(&RenderConfig::single_threaded(), RasterBackend::new());
        server.init();

        let worker = {
            let server = Arc::clone(&server);
            std::thread::spawn(move || server.tick())
        };
        worker.join().unwrap();

        // The other thread's tick is queued until the barrier runs it.
        assert_eq!(server.pending_commands(), 1);
        server.sync();
        assert_eq!(server.stats().ticks(), 1);

        server.finish();
    }

    #[test]
    fn test_single_threaded_finish_drains_foreign_pushes() {
        let server = RenderServer::new(&RenderConfig::single_threaded(), RasterBackend::new());
        server.init();

        let worker = {
            let server = Arc::clone(&server);
            std::thread::spawn(move || server.tick())
        };
        worker.join().unwrap();

        // No barrier before shutdown: finish itself must run the backlog.
        server.finish();
        assert_eq!(server.stats().ticks(), 1);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_finish_on_render_thread_is_rejected() {
        let server = RenderServer::new(&RenderConfig::default(), RasterBackend::new());
        server.init();

        // Teardown from inside a work item runs on the render thread and
        // must trip the contract assertion before touching any state.
        let inner = Arc::clone(&server);
        let panicked = server.queue_synced_operation(move |_| {
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| inner.finish())).is_err()
        });
        assert!(panicked);

        // The rejected call changed nothing; a proper shutdown still works.
        server.finish();
    }

    #[test]
    fn test_threaded_init_finish_cycle() {
        let server = RenderServer::new(&RenderConfig::default(), RasterBackend::new());
        server.init();
        assert!(server.is_threaded());

        let shader = server.shader_create();
        server.shader_set_code(shader, "void main() {}");
        assert_eq!(server.shader_code(shader), Some("void main() {}".to_owned()));

        server.finish();
        // All pooled handles were released; only the issued one remains.
        assert_eq!(server.resources_live(), 1);
    }
}
