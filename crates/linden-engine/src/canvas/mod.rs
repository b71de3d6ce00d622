//! Frame orchestration and batching policy.
//!
//! Responsibilities:
//! - frame lifecycle (`begin`/`end` bracket exactly one frame)
//! - batching: draws that share (texture, shader, scissor) land in the
//!   same open layer; any identity change or capacity overflow opens a
//!   new one
//! - layer pooling: layers are arena slots referenced by index, with a
//!   free set and a committed set; buffer handles never leave their slot
//! - ordered flush: committed layers upload in commit order, which is the
//!   paint order

use std::collections::HashMap;

use glam::{Mat4, Vec3};

use crate::backend::{ColorFormat, GpuBackend, Scissor, ShaderId, TextureId};
use crate::coords::{Rect, Vec2, Viewport};
use crate::geometry::{Vertex, tessellate_polyline};
use crate::layer::{AppendParams, RenderLayer};
use crate::paint::Color;
use crate::state::RenderState;

/// Attribute slot carrying position + uv as 4 x f32.
pub const POSITION_SLOT: u32 = 0;
/// Attribute slot carrying the packed RGBA8 color.
pub const COLOR_SLOT: u32 = 1;

const TEXTURE_VERT: &str = include_str!("shaders/texture.vert");
const TEXTURE_FRAG: &str = include_str!("shaders/texture.frag");
const PRIMITIVE_VERT: &str = include_str!("shaders/primitive.vert");
const PRIMITIVE_FRAG: &str = include_str!("shaders/primitive.frag");

/// Registry entry for a created texture: opaque identity plus dimensions.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureInfo {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Immediate-mode 2D canvas over a [`GpuBackend`].
///
/// One canvas per rendering surface; `begin()`/`end()` bracket exactly one
/// frame, and draw calls outside that bracket are unsupported. Single
/// threaded by design: all calls must come from the thread owning the GPU
/// context.
pub struct Canvas<B: GpuBackend> {
    backend: B,
    state: RenderState,

    // Layer arena. A slot is in exactly one of: `free`, `committed`.
    // The currently open layer is the committed tail.
    layers: Vec<RenderLayer>,
    committed: Vec<usize>,
    free: Vec<usize>,

    textures: HashMap<TextureId, TextureInfo>,

    texture_shader: ShaderId,
    color_shader: ShaderId,
    shader_override: Option<ShaderId>,

    scissor: Scissor,
    viewport: Viewport,
    viewport_scale_x: f32,
    viewport_scale_y: f32,
    clear_color: Color,
}

impl<B: GpuBackend> Canvas<B> {
    /// Creates a canvas and compiles the two default shaders through the
    /// backend (a vertex-color shader for untextured draws, a sampling
    /// shader for textured ones).
    ///
    /// Returns `None` when either default shader fails to build; the
    /// backend logs the diagnostics.
    pub fn new(mut backend: B) -> Option<Self> {
        let texture_shader = backend.create_shader(TEXTURE_VERT, TEXTURE_FRAG)?;
        let color_shader = backend.create_shader(PRIMITIVE_VERT, PRIMITIVE_FRAG)?;

        Some(Self {
            backend,
            state: RenderState::new(),
            layers: Vec::new(),
            committed: Vec::new(),
            free: Vec::new(),
            textures: HashMap::new(),
            texture_shader,
            color_shader,
            shader_override: None,
            scissor: Scissor::disabled(),
            viewport: Viewport::default(),
            viewport_scale_x: 1.0,
            viewport_scale_y: 1.0,
            clear_color: Color::black(),
        })
    }

    // ── frame lifecycle ───────────────────────────────────────────────────

    /// Starts a frame: recycles the previous frame's committed layers into
    /// the free pool (buffer handles stay with their slots), resets the
    /// state stacks, drops any stale scissor, and seeds the matrix stack
    /// with the viewport scale when one is configured.
    pub fn begin(&mut self) {
        for slot in self.committed.drain(..) {
            self.layers[slot].recycle();
            self.free.push(slot);
        }

        self.scissor = Scissor::disabled();
        self.state.reset();

        if self.viewport_scale_x != 1.0 || self.viewport_scale_y != 1.0 {
            self.state.push_matrix(Mat4::from_scale(Vec3::new(
                self.viewport_scale_x,
                self.viewport_scale_y,
                1.0,
            )));
        }
    }

    /// Flushes the frame: clears the target, then uploads every committed
    /// layer strictly in commit order. Later layers paint over earlier
    /// ones; there is no depth-based reordering.
    pub fn end(&mut self) {
        self.backend.set_scissor(Scissor::disabled());
        self.backend.set_viewport(self.viewport);
        self.backend.clear(self.clear_color);

        let projection = Mat4::orthographic_rh_gl(
            self.viewport.x,
            self.viewport.width,
            self.viewport.y,
            self.viewport.height,
            -100.0,
            100.0,
        );

        // Tracking is local to this flush so the first layer always binds
        // its shader and receives the current projection.
        let mut applied: Option<ShaderId> = None;
        for &slot in &self.committed {
            let shader = self.layers[slot].shader();
            if applied != Some(shader) {
                self.backend.set_projection(shader, projection);
                self.backend.apply_shader(shader);
                applied = Some(shader);
            }

            self.layers[slot].upload(&mut self.backend, POSITION_SLOT, COLOR_SLOT);
        }
    }

    // ── draw entry points ─────────────────────────────────────────────────

    /// Submits raw untextured geometry in the current state.
    pub fn draw_vertices(&mut self, vertices: &[Vertex], indices: &[u16], flipped_y: bool) {
        self.submit(None, vertices, indices, flipped_y);
    }

    /// Submits raw geometry sampling `texture`.
    pub fn draw_textured(
        &mut self,
        texture: TextureId,
        vertices: &[Vertex],
        indices: &[u16],
        flipped_y: bool,
    ) {
        if !self.textures.contains_key(&texture) {
            log::debug!("draw_textured: unknown texture {texture:?}, skipping");
            return;
        }
        self.submit(Some(texture), vertices, indices, flipped_y);
    }

    /// Fills `dst` with the current state color.
    pub fn draw_rect(&mut self, dst: Rect, flipped_y: bool) {
        let (vertices, indices) = quad(dst, Vec2::zero(), Vec2::new(1.0, 1.0));
        self.submit(None, &vertices, &indices, flipped_y);
    }

    /// Blits the whole of `texture` into `dst`.
    pub fn draw_texture(&mut self, texture: TextureId, dst: Rect, flipped_y: bool) {
        let Some(info) = self.textures.get(&texture).copied() else {
            log::debug!("draw_texture: unknown texture {texture:?}, skipping");
            return;
        };
        let src = Rect::new(0.0, 0.0, info.width as f32, info.height as f32);
        self.blit(texture, info, src, dst, flipped_y);
    }

    /// Blits the `src` sub-rect of `texture` (in texel units) into `dst`.
    pub fn draw_texture_region(
        &mut self,
        texture: TextureId,
        src: Rect,
        dst: Rect,
        flipped_y: bool,
    ) {
        let Some(info) = self.textures.get(&texture).copied() else {
            log::debug!("draw_texture_region: unknown texture {texture:?}, skipping");
            return;
        };
        self.blit(texture, info, src, dst, flipped_y);
    }

    /// Strokes a polyline of half-width `strength`.
    pub fn draw_polyline(&mut self, points: &[Vec2], closed: bool, strength: f32) {
        let batch = tessellate_polyline(points, closed, strength);
        self.submit(None, &batch.vertices, &batch.indices, false);
    }

    /// Strokes a single line segment; the two-point polyline case.
    pub fn draw_line(&mut self, p0: Vec2, p1: Vec2, strength: f32) {
        self.draw_polyline(&[p0, p1], false, strength);
    }

    // ── frame configuration ───────────────────────────────────────────────

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Configures a scale seeded into the matrix stack at every `begin()`.
    pub fn set_viewport_scaling(&mut self, scale_x: f32, scale_y: f32) {
        self.viewport_scale_x = scale_x;
        self.viewport_scale_y = scale_y;
    }

    /// Sets the scissor state inherited by layers opened from now on.
    pub fn set_scissor(&mut self, scissor: Scissor) {
        self.scissor = scissor;
    }

    /// Overrides the shader for subsequent draws; `None` restores the
    /// default shader resolution (untextured: vertex-color shader,
    /// textured: sampling shader).
    pub fn set_shader(&mut self, shader: Option<ShaderId>) {
        self.shader_override = shader;
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    // ── resources ─────────────────────────────────────────────────────────

    /// Creates a texture from raw pixels through the backend and registers
    /// its dimensions. Returns `None` when the backend rejects it.
    pub fn create_texture(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> Option<TextureId> {
        let id = self.backend.create_texture(pixels, width, height, format)?;
        self.textures.insert(id, TextureInfo { id, width, height });
        Some(id)
    }

    /// Looks up a previously created texture; `None` for unknown ids.
    pub fn texture(&self, id: TextureId) -> Option<&TextureInfo> {
        self.textures.get(&id)
    }

    /// Compiles a custom shader through the backend. Returns `None` on
    /// compile/link failure (logged by the backend).
    pub fn create_shader(&mut self, vertex_src: &str, fragment_src: &str) -> Option<ShaderId> {
        self.backend.create_shader(vertex_src, fragment_src)
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scissor(&self) -> Scissor {
        self.scissor
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Layers committed so far this frame.
    pub fn committed_layer_count(&self) -> usize {
        self.committed.len()
    }

    /// Layers sitting in the recycle pool.
    pub fn pooled_layer_count(&self) -> usize {
        self.free.len()
    }

    // ── internals ─────────────────────────────────────────────────────────

    /// Resolves the effective shader: an explicit override always wins,
    /// otherwise textured draws sample and untextured draws use vertex
    /// color only.
    fn effective_shader(&self, texture: Option<TextureId>) -> ShaderId {
        match self.shader_override {
            Some(shader) => shader,
            None if texture.is_some() => self.texture_shader,
            None => self.color_shader,
        }
    }

    /// Returns the slot of a layer compatible with (texture, effective
    /// shader, current scissor), opening one if needed.
    ///
    /// Preference order: the open layer when it validates and `force` is
    /// off, then a recycled slot from the free pool, then a fresh layer
    /// with a new buffer pair.
    fn layer_for(&mut self, texture: Option<TextureId>, force: bool) -> usize {
        let shader = self.effective_shader(texture);

        if !force {
            if let Some(&tail) = self.committed.last() {
                if self.layers[tail].validate(texture, shader, self.scissor) {
                    return tail;
                }
            }
        }

        let slot = match self.free.pop() {
            Some(slot) => {
                self.layers[slot].reset(texture, shader, self.scissor);
                slot
            }
            None => {
                let buffers = self.backend.create_buffer_pair();
                self.layers
                    .push(RenderLayer::new(buffers, texture, shader, self.scissor));
                self.layers.len() - 1
            }
        };

        self.committed.push(slot);
        slot
    }

    /// Common tail of every draw entry point: pick a compatible layer and
    /// append; on capacity overflow retry once against a forced-fresh
    /// layer. This retry is the sole overflow-recovery path.
    fn submit(
        &mut self,
        texture: Option<TextureId>,
        vertices: &[Vertex],
        indices: &[u16],
        flipped_y: bool,
    ) {
        if vertices.is_empty() || indices.is_empty() {
            return;
        }

        let params = AppendParams {
            matrix: self.state.matrix(),
            color: self.state.color(),
            opacity: self.state.opacity(),
            flip_y: flipped_y.then_some(self.viewport.height),
        };

        let slot = self.layer_for(texture, false);
        if self.layers[slot].append(vertices, indices, &params) {
            return;
        }

        let slot = self.layer_for(texture, true);
        if !self.layers[slot].append(vertices, indices, &params) {
            // A single batch larger than a whole layer cannot be split.
            log::warn!(
                "draw call exceeds layer capacity ({} vertices, {} triangles), dropped",
                vertices.len(),
                indices.len() / 3
            );
        }
    }

    fn blit(
        &mut self,
        texture: TextureId,
        info: TextureInfo,
        src: Rect,
        dst: Rect,
        flipped_y: bool,
    ) {
        let tw = info.width.max(1) as f32;
        let th = info.height.max(1) as f32;
        let uv_min = Vec2::new(src.min().x / tw, src.min().y / th);
        let uv_max = Vec2::new(src.max().x / tw, src.max().y / th);

        let (vertices, indices) = quad(dst, uv_min, uv_max);
        self.submit(Some(texture), &vertices, &indices, flipped_y);
    }
}

/// Opaque-white quad over `dst` with the given uv corners; built in
/// per-call locals, never in shared scratch storage.
fn quad(dst: Rect, uv_min: Vec2, uv_max: Vec2) -> ([Vertex; 4], [u16; 6]) {
    let min = dst.min();
    let max = dst.max();

    let vertices = [
        Vertex::new(min, uv_min, 0xFFFF_FFFF),
        Vertex::new(Vec2::new(max.x, min.y), Vec2::new(uv_max.x, uv_min.y), 0xFFFF_FFFF),
        Vertex::new(max, uv_max, 0xFFFF_FFFF),
        Vertex::new(Vec2::new(min.x, max.y), Vec2::new(uv_min.x, uv_max.y), 0xFFFF_FFFF),
    ];

    (vertices, [0, 1, 2, 2, 3, 0])
}
