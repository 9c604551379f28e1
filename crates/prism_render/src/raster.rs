//! # Raster Backend
//!
//! The in-repo reference implementation of [`RenderBackend`]: a state
//! tracker over a [`HandleArena`], not a rasterizer. It gives the façade a
//! real submission side to forward to, and gives tests something whose
//! final state can be inspected through the query surface.
//!
//! Real GPU backends live outside this crate and only need to implement
//! the same trait.

use crate::arena::HandleArena;
use crate::backend::{RenderBackend, RenderStats};
use crate::handle::{ResourceHandle, ResourceKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One mesh surface: raw vertex bytes plus the vertex count.
struct Surface {
    vertex_data: Vec<u8>,
    vertex_count: u32,
}

/// A single canvas draw command.
enum CanvasCommand {
    Rect { rect: [f32; 4], color: [f32; 4] },
}

/// Kind-specific resource state.
enum ResourceData {
    Texture {
        width: u32,
        height: u32,
        data: Vec<u8>,
    },
    Mesh {
        surfaces: Vec<Surface>,
    },
    Shader {
        code: String,
    },
    Material {
        shader: ResourceHandle,
        params: HashMap<String, f32>,
    },
    Light {
        color: [f32; 3],
        energy: f32,
    },
    Camera,
    Viewport {
        width: u32,
        height: u32,
        active: bool,
    },
    CanvasItem {
        commands: Vec<CanvasCommand>,
    },
}

impl ResourceData {
    fn empty(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Texture => Self::Texture {
                width: 0,
                height: 0,
                data: Vec::new(),
            },
            ResourceKind::Mesh => Self::Mesh {
                surfaces: Vec::new(),
            },
            ResourceKind::Shader => Self::Shader {
                code: String::new(),
            },
            ResourceKind::Material => Self::Material {
                shader: ResourceHandle::NULL,
                params: HashMap::new(),
            },
            ResourceKind::Light => Self::Light {
                color: [1.0, 1.0, 1.0],
                energy: 1.0,
            },
            ResourceKind::Camera => Self::Camera,
            ResourceKind::Viewport => Self::Viewport {
                width: 0,
                height: 0,
                active: false,
            },
            ResourceKind::CanvasItem => Self::CanvasItem {
                commands: Vec::new(),
            },
        }
    }
}

/// A live resource: its kind plus kind-specific state.
struct Resource {
    kind: ResourceKind,
    data: ResourceData,
}

/// State-tracking [`RenderBackend`].
///
/// All resources of all kinds share one generational arena, so `free`
/// needs no kind argument and stale handles of any kind are rejected by
/// the same generation check.
pub struct RasterBackend {
    resources: HandleArena<Resource>,
    kind_counts: [usize; ResourceKind::COUNT],
    stats: Arc<RenderStats>,
}

impl RasterBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resources: HandleArena::new(),
            kind_counts: [0; ResourceKind::COUNT],
            stats: Arc::new(RenderStats::new()),
        }
    }

    /// Looks up a resource expecting a given kind, warning on misuse.
    fn expect_kind(&mut self, handle: ResourceHandle, kind: ResourceKind) -> Option<&mut ResourceData> {
        match self.resources.get_mut(handle) {
            Some(res) if res.kind == kind => Some(&mut res.data),
            Some(res) => {
                warn!(?handle, expected = ?kind, actual = ?res.kind, "operation on wrong resource kind");
                None
            }
            None => {
                warn!(?handle, expected = ?kind, "operation on stale or invalid handle");
                None
            }
        }
    }

    fn get_kind(&self, handle: ResourceHandle, kind: ResourceKind) -> Option<&ResourceData> {
        self.resources
            .get(handle)
            .filter(|res| res.kind == kind)
            .map(|res| &res.data)
    }
}

impl Default for RasterBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for RasterBackend {
    fn init(&mut self) {
        info!("raster backend up");
    }

    fn finish(&mut self) {
        info!(
            resources_live = self.resources.len(),
            "raster backend shutting down"
        );
    }

    fn draw(&mut self, frame_step: f64) {
        // Count one draw call per canvas command on each active frame;
        // good enough for a state tracker.
        let commands: usize = self
            .resources
            .iter()
            .filter_map(|(_, res)| match &res.data {
                ResourceData::CanvasItem { commands } => Some(commands.len()),
                _ => None,
            })
            .sum();
        self.stats.record_draw_calls(commands as u64);
        self.stats.record_frame();
        debug!(frame_step, commands, "frame drawn");
    }

    fn tick(&mut self) {
        self.stats.record_tick();
    }

    fn create_resource(&mut self, kind: ResourceKind) -> ResourceHandle {
        let handle = self.resources.insert(Resource {
            kind,
            data: ResourceData::empty(kind),
        });
        self.kind_counts[kind.index()] += 1;
        self.stats.record_resource_created();
        handle
    }

    fn free_resource(&mut self, handle: ResourceHandle) {
        if let Some(resource) = self.resources.remove(handle) {
            self.kind_counts[resource.kind.index()] -= 1;
            self.stats.record_resource_freed();
        } else {
            warn!(?handle, "free of stale or invalid handle ignored");
        }
    }

    fn resource_count(&self, kind: ResourceKind) -> usize {
        self.kind_counts[kind.index()]
    }

    fn texture_allocate(&mut self, texture: ResourceHandle, width: u32, height: u32) {
        if let Some(ResourceData::Texture {
            width: w,
            height: h,
            data,
        }) = self.expect_kind(texture, ResourceKind::Texture)
        {
            *w = width;
            *h = height;
            data.clear();
        }
    }

    fn texture_set_data(&mut self, texture: ResourceHandle, new_data: Vec<u8>) {
        if let Some(ResourceData::Texture { data, .. }) =
            self.expect_kind(texture, ResourceKind::Texture)
        {
            *data = new_data;
        }
    }

    fn texture_size(&self, texture: ResourceHandle) -> Option<(u32, u32)> {
        match self.get_kind(texture, ResourceKind::Texture)? {
            ResourceData::Texture { width, height, .. } => Some((*width, *height)),
            _ => None,
        }
    }

    fn mesh_add_surface(&mut self, mesh: ResourceHandle, vertex_data: Vec<u8>, vertex_count: u32) {
        if let Some(ResourceData::Mesh { surfaces }) = self.expect_kind(mesh, ResourceKind::Mesh) {
            surfaces.push(Surface {
                vertex_data,
                vertex_count,
            });
        }
    }

    fn mesh_clear(&mut self, mesh: ResourceHandle) {
        if let Some(ResourceData::Mesh { surfaces }) = self.expect_kind(mesh, ResourceKind::Mesh) {
            surfaces.clear();
        }
    }

    fn mesh_surface_count(&self, mesh: ResourceHandle) -> usize {
        match self.get_kind(mesh, ResourceKind::Mesh) {
            Some(ResourceData::Mesh { surfaces }) => surfaces.len(),
            _ => 0,
        }
    }

    fn mesh_surface_data(
        &self,
        mesh: ResourceHandle,
        surface_index: usize,
    ) -> Option<(u32, Vec<u8>)> {
        match self.get_kind(mesh, ResourceKind::Mesh)? {
            ResourceData::Mesh { surfaces } => surfaces
                .get(surface_index)
                .map(|s| (s.vertex_count, s.vertex_data.clone())),
            _ => None,
        }
    }

    fn shader_set_code(&mut self, shader: ResourceHandle, new_code: String) {
        if let Some(ResourceData::Shader { code }) = self.expect_kind(shader, ResourceKind::Shader)
        {
            *code = new_code;
        }
    }

    fn shader_code(&self, shader: ResourceHandle) -> Option<String> {
        match self.get_kind(shader, ResourceKind::Shader)? {
            ResourceData::Shader { code } => Some(code.clone()),
            _ => None,
        }
    }

    fn material_set_shader(&mut self, material: ResourceHandle, new_shader: ResourceHandle) {
        if let Some(ResourceData::Material { shader, .. }) =
            self.expect_kind(material, ResourceKind::Material)
        {
            *shader = new_shader;
        }
    }

    fn material_shader(&self, material: ResourceHandle) -> Option<ResourceHandle> {
        match self.get_kind(material, ResourceKind::Material)? {
            ResourceData::Material { shader, .. } if !shader.is_null() => Some(*shader),
            _ => None,
        }
    }

    fn material_set_param(&mut self, material: ResourceHandle, name: String, value: f32) {
        if let Some(ResourceData::Material { params, .. }) =
            self.expect_kind(material, ResourceKind::Material)
        {
            params.insert(name, value);
        }
    }

    fn material_param(&self, material: ResourceHandle, name: &str) -> Option<f32> {
        match self.get_kind(material, ResourceKind::Material)? {
            ResourceData::Material { params, .. } => params.get(name).copied(),
            _ => None,
        }
    }

    fn light_set_color(&mut self, light: ResourceHandle, new_color: [f32; 3]) {
        if let Some(ResourceData::Light { color, .. }) =
            self.expect_kind(light, ResourceKind::Light)
        {
            *color = new_color;
        }
    }

    fn light_set_energy(&mut self, light: ResourceHandle, new_energy: f32) {
        if let Some(ResourceData::Light { energy, .. }) =
            self.expect_kind(light, ResourceKind::Light)
        {
            *energy = new_energy;
        }
    }

    fn viewport_set_size(&mut self, viewport: ResourceHandle, new_width: u32, new_height: u32) {
        if let Some(ResourceData::Viewport { width, height, .. }) =
            self.expect_kind(viewport, ResourceKind::Viewport)
        {
            *width = new_width;
            *height = new_height;
        }
    }

    fn viewport_set_active(&mut self, viewport: ResourceHandle, new_active: bool) {
        if let Some(ResourceData::Viewport { active, .. }) =
            self.expect_kind(viewport, ResourceKind::Viewport)
        {
            *active = new_active;
        }
    }

    fn viewport_size(&self, viewport: ResourceHandle) -> Option<(u32, u32)> {
        match self.get_kind(viewport, ResourceKind::Viewport)? {
            ResourceData::Viewport { width, height, .. } => Some((*width, *height)),
            _ => None,
        }
    }

    fn canvas_item_add_rect(&mut self, item: ResourceHandle, rect: [f32; 4], color: [f32; 4]) {
        if let Some(ResourceData::CanvasItem { commands }) =
            self.expect_kind(item, ResourceKind::CanvasItem)
        {
            commands.push(CanvasCommand::Rect { rect, color });
        }
    }

    fn canvas_item_clear(&mut self, item: ResourceHandle) {
        if let Some(ResourceData::CanvasItem { commands }) =
            self.expect_kind(item, ResourceKind::CanvasItem)
        {
            commands.clear();
        }
    }

    fn canvas_item_rects(&self, item: ResourceHandle) -> Vec<([f32; 4], [f32; 4])> {
        match self.get_kind(item, ResourceKind::CanvasItem) {
            Some(ResourceData::CanvasItem { commands }) => commands
                .iter()
                .map(|cmd| match cmd {
                    CanvasCommand::Rect { rect, color } => (*rect, *color),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn stats(&self) -> Arc<RenderStats> {
        Arc::clone(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mutate_query_free() {
        let mut backend = RasterBackend::new();
        backend.init();

        let tex = backend.create_resource(ResourceKind::Texture);
        backend.texture_allocate(tex, 128, 64);
        backend.texture_set_data(tex, vec![0xff; 16]);
        assert_eq!(backend.texture_size(tex), Some((128, 64)));
        assert_eq!(backend.resource_count(ResourceKind::Texture), 1);
        assert_eq!(backend.stats().resources_live(), 1);

        backend.free_resource(tex);
        assert_eq!(backend.texture_size(tex), None);
        assert_eq!(backend.resource_count(ResourceKind::Texture), 0);
        assert_eq!(backend.stats().resources_live(), 0);
    }

    #[test]
    fn test_wrong_kind_operation_ignored() {
        let mut backend = RasterBackend::new();
        let mesh = backend.create_resource(ResourceKind::Mesh);

        // Texture op against a mesh handle: ignored, state untouched.
        backend.texture_allocate(mesh, 32, 32);
        assert_eq!(backend.texture_size(mesh), None);
        assert_eq!(backend.mesh_surface_count(mesh), 0);
    }

    #[test]
    fn test_stale_handle_after_free_ignored() {
        let mut backend = RasterBackend::new();
        let shader = backend.create_resource(ResourceKind::Shader);
        backend.free_resource(shader);

        // Slot reuse must not resurrect the old handle.
        let replacement = backend.create_resource(ResourceKind::Shader);
        backend.shader_set_code(shader, "dead".to_owned());
        assert_eq!(backend.shader_code(shader), None);
        assert_eq!(backend.shader_code(replacement), Some(String::new()));

        // Double free is a warning, not a crash, and doesn't skew counts.
        backend.free_resource(shader);
        assert_eq!(backend.resource_count(ResourceKind::Shader), 1);
    }

    #[test]
    fn test_material_params_and_shader_binding() {
        let mut backend = RasterBackend::new();
        let material = backend.create_resource(ResourceKind::Material);
        let shader = backend.create_resource(ResourceKind::Shader);

        assert_eq!(backend.material_shader(material), None);
        backend.material_set_shader(material, shader);
        assert_eq!(backend.material_shader(material), Some(shader));

        backend.material_set_param(material, "roughness".to_owned(), 0.25);
        backend.material_set_param(material, "roughness".to_owned(), 0.75);
        assert_eq!(backend.material_param(material, "roughness"), Some(0.75));
        assert_eq!(backend.material_param(material, "metallic"), None);
    }

    #[test]
    fn test_mesh_surface_readback() {
        let mut backend = RasterBackend::new();
        let mesh = backend.create_resource(ResourceKind::Mesh);
        backend.mesh_add_surface(mesh, vec![1, 2, 3, 4], 2);

        assert_eq!(
            backend.mesh_surface_data(mesh, 0),
            Some((2, vec![1, 2, 3, 4]))
        );
        assert_eq!(backend.mesh_surface_data(mesh, 1), None);

        backend.mesh_clear(mesh);
        assert_eq!(backend.mesh_surface_data(mesh, 0), None);
    }

    #[test]
    fn test_canvas_rect_readback() {
        let mut backend = RasterBackend::new();
        let item = backend.create_resource(ResourceKind::CanvasItem);
        backend.canvas_item_add_rect(item, [0.0, 0.0, 8.0, 8.0], [1.0, 0.0, 0.0, 1.0]);

        let rects = backend.canvas_item_rects(item);
        assert_eq!(rects, vec![([0.0, 0.0, 8.0, 8.0], [1.0, 0.0, 0.0, 1.0])]);
        assert!(backend.canvas_item_rects(ResourceHandle::NULL).is_empty());
    }

    #[test]
    fn test_draw_updates_stats() {
        let mut backend = RasterBackend::new();
        let item = backend.create_resource(ResourceKind::CanvasItem);
        backend.canvas_item_add_rect(item, [0.0, 0.0, 1.0, 1.0], [1.0; 4]);
        backend.canvas_item_add_rect(item, [1.0, 1.0, 2.0, 2.0], [0.5; 4]);

        backend.draw(1.0 / 60.0);
        backend.draw(1.0 / 60.0);

        let stats = backend.stats();
        assert_eq!(stats.frames_drawn(), 2);
        assert_eq!(stats.draw_calls(), 4);

        backend.canvas_item_clear(item);
        backend.draw(1.0 / 60.0);
        assert_eq!(stats.frames_drawn(), 3);
        assert_eq!(stats.draw_calls(), 4);
    }
}
