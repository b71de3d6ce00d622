//! One fixed-capacity GPU-bound batch.

use glam::Mat4;

use crate::backend::{BufferPair, GpuBackend, Scissor, ShaderId, TextureId};
use crate::geometry::Vertex;
use crate::paint::Color;

/// Triangle ceiling per layer. Fixed by design: overflow opens a new layer
/// instead of growing a buffer, keeping the per-frame hot path free of
/// reallocation.
pub const MAX_TRIANGLES: usize = 8192;

/// Vertex (and index) ceiling per layer.
pub const MAX_VERTICES: usize = MAX_TRIANGLES * 3;

/// Composed draw state baked into vertices at append time.
#[derive(Debug, Copy, Clone)]
pub struct AppendParams {
    /// Composed model matrix. Only the 2D affine part is applied
    /// (2x2 linear block plus translation; no perspective).
    pub matrix: Mat4,
    /// Composed state color, modulated with each vertex color.
    pub color: Color,
    /// Composed opacity, applied channel-wise.
    pub opacity: f32,
    /// `Some(viewport_height)` mirrors y after the affine transform.
    pub flip_y: Option<f32>,
}

/// One batch of geometry sharing texture, shader and scissor state, backed
/// by one GPU buffer pair and flushed with exactly one draw call.
///
/// The buffer pair is owned by this layer for its entire lifetime; frame
/// recycling reuses the layer object and never transfers the handles. The
/// batch identity (texture, shader, scissor snapshot) is immutable from one
/// [`reset`](Self::reset) to the next.
#[derive(Debug)]
pub struct RenderLayer {
    buffers: BufferPair,

    vertices: Vec<Vertex>,
    indices: Vec<u16>,

    // Batch identity; can't change while the layer is open.
    texture: Option<TextureId>,
    shader: ShaderId,
    scissor: Scissor,
}

impl RenderLayer {
    /// Creates a layer over a freshly created buffer pair, bound to its
    /// first batch identity.
    pub fn new(
        buffers: BufferPair,
        texture: Option<TextureId>,
        shader: ShaderId,
        scissor: Scissor,
    ) -> Self {
        Self {
            buffers,
            vertices: Vec::with_capacity(MAX_VERTICES),
            indices: Vec::with_capacity(MAX_VERTICES),
            texture,
            shader,
            scissor,
        }
    }

    /// Rebinds a recycled layer to a new batch identity: snapshots the
    /// caller's current scissor state, zeroes the fill cursors and clears
    /// the backing arrays. The buffer handles are untouched.
    pub fn reset(&mut self, texture: Option<TextureId>, shader: ShaderId, scissor: Scissor) {
        self.texture = texture;
        self.shader = shader;
        self.scissor = scissor;
        self.vertices.clear();
        self.indices.clear();
    }

    /// Returns a committed layer to the free pool: content and texture
    /// binding are dropped, buffer handles stay put. The next
    /// [`reset`](Self::reset) rebinds the full identity.
    pub fn recycle(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.texture = None;
        self.scissor = Scissor::disabled();
    }

    /// True iff `texture`, `shader` and the caller's current scissor state
    /// all equal this layer's bound identity.
    pub fn validate(&self, texture: Option<TextureId>, shader: ShaderId, scissor: Scissor) -> bool {
        self.texture == texture && self.shader == shader && self.scissor.matches(scissor)
    }

    /// Appends geometry transactionally.
    ///
    /// Returns `false` without mutating anything when the append would
    /// exceed the vertex or triangle capacity; filling a layer to exactly
    /// its capacity succeeds. Empty input is a successful no-op.
    ///
    /// On success each position goes through the composed affine transform
    /// (then the optional y flip), each color is modulated by the composed
    /// state color and opacity, and each index is rebased onto the running
    /// vertex count.
    pub fn append(&mut self, vertices: &[Vertex], indices: &[u16], params: &AppendParams) -> bool {
        if vertices.is_empty() || indices.is_empty() {
            return true;
        }

        let triangles = indices.len() / 3;
        if self.vertices.len() + vertices.len() > MAX_VERTICES
            || self.triangle_count() + triangles > MAX_TRIANGLES
        {
            return false;
        }

        let base = self.vertices.len() as u16;

        let m = &params.matrix;
        let (m00, m01) = (m.x_axis.x, m.x_axis.y);
        let (m10, m11) = (m.y_axis.x, m.y_axis.y);
        let (m30, m31) = (m.w_axis.x, m.w_axis.y);

        let tint = params.color * params.opacity;

        for v in vertices {
            let x = m00 * v.pos[0] + m10 * v.pos[1] + m30;
            let mut y = m01 * v.pos[0] + m11 * v.pos[1] + m31;
            if let Some(height) = params.flip_y {
                y = height - y;
            }

            self.vertices.push(Vertex {
                pos: [x, y],
                uv: v.uv,
                color: (tint * Color::from_rgba8(v.color)).to_rgba8(),
            });
        }

        self.indices.extend(indices.iter().map(|&i| base + i));

        true
    }

    /// Pushes the filled prefix to the backend and issues this layer's
    /// single draw call for the frame. No-op when nothing was appended.
    pub fn upload<B: GpuBackend>(&self, backend: &mut B, position_slot: u32, color_slot: u32) {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return;
        }

        backend.upload_vertices(self.buffers.vertices, &self.vertices);
        backend.upload_indices(self.buffers.indices, &self.indices);
        backend.bind_attributes(position_slot, color_slot);
        backend.set_scissor(self.scissor);
        backend.draw_indexed(self.buffers, self.texture, self.triangle_count() * 3);
    }

    /// Vertex fill cursor.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Triangle fill cursor.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Transformed vertices appended so far.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Rebased indices appended so far.
    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    #[inline]
    pub fn buffers(&self) -> BufferPair {
        self.buffers
    }

    #[inline]
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    #[inline]
    pub fn shader(&self) -> ShaderId {
        self.shader
    }

    #[inline]
    pub fn scissor(&self) -> Scissor {
        self.scissor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BufferId, Command, RecordingBackend};
    use crate::coords::{Rect, Vec2};
    use glam::Vec3;

    fn pair() -> BufferPair {
        BufferPair {
            vertices: BufferId(0),
            indices: BufferId(1),
        }
    }

    fn layer() -> RenderLayer {
        RenderLayer::new(pair(), None, ShaderId(7), Scissor::disabled())
    }

    fn identity_params() -> AppendParams {
        AppendParams {
            matrix: Mat4::IDENTITY,
            color: Color::white(),
            opacity: 1.0,
            flip_y: None,
        }
    }

    fn quad() -> ([Vertex; 4], [u16; 6]) {
        let verts = [
            Vertex::from_pos(Vec2::new(0.0, 0.0)),
            Vertex::from_pos(Vec2::new(1.0, 0.0)),
            Vertex::from_pos(Vec2::new(1.0, 1.0)),
            Vertex::from_pos(Vec2::new(0.0, 1.0)),
        ];
        (verts, [0, 1, 2, 2, 3, 0])
    }

    /// `count` disconnected triangles, 3 vertices each.
    fn triangles(count: usize) -> (Vec<Vertex>, Vec<u16>) {
        let mut verts = Vec::with_capacity(count * 3);
        let mut indices = Vec::with_capacity(count * 3);
        for t in 0..count {
            let x = t as f32;
            verts.push(Vertex::from_pos(Vec2::new(x, 0.0)));
            verts.push(Vertex::from_pos(Vec2::new(x + 1.0, 0.0)));
            verts.push(Vertex::from_pos(Vec2::new(x, 1.0)));
            let b = (t * 3) as u16;
            indices.extend_from_slice(&[b, b + 1, b + 2]);
        }
        (verts, indices)
    }

    // ── append ────────────────────────────────────────────────────────────

    #[test]
    fn empty_input_is_a_successful_no_op() {
        let mut layer = layer();
        assert!(layer.append(&[], &[], &identity_params()));
        assert_eq!(layer.vertex_count(), 0);
        assert_eq!(layer.triangle_count(), 0);
    }

    #[test]
    fn append_advances_both_cursors() {
        let mut layer = layer();
        let (verts, indices) = quad();

        assert!(layer.append(&verts, &indices, &identity_params()));
        assert!(layer.append(&verts, &indices, &identity_params()));

        assert_eq!(layer.vertex_count(), 8);
        assert_eq!(layer.triangle_count(), 4);
    }

    #[test]
    fn indices_are_rebased_per_append() {
        let mut layer = layer();
        let (verts, indices) = quad();

        layer.append(&verts, &indices, &identity_params());
        layer.append(&verts, &indices, &identity_params());

        assert_eq!(&layer.indices()[..6], &[0, 1, 2, 2, 3, 0]);
        assert_eq!(&layer.indices()[6..], &[4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn positions_go_through_the_affine_transform() {
        let mut layer = layer();
        let (verts, indices) = quad();

        let params = AppendParams {
            matrix: Mat4::from_translation(Vec3::new(10.0, 20.0, 0.0))
                * Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0)),
            ..identity_params()
        };
        layer.append(&verts, &indices, &params);

        assert_eq!(layer.vertices()[0].pos, [10.0, 20.0]);
        assert_eq!(layer.vertices()[2].pos, [12.0, 22.0]);
    }

    #[test]
    fn flip_y_mirrors_after_the_transform() {
        let mut layer = layer();
        let (verts, indices) = quad();

        let params = AppendParams {
            matrix: Mat4::from_translation(Vec3::new(0.0, 10.0, 0.0)),
            flip_y: Some(100.0),
            ..identity_params()
        };
        layer.append(&verts, &indices, &params);

        // v0 at y = 0 transforms to 10, then mirrors to 90.
        assert_eq!(layer.vertices()[0].pos, [0.0, 90.0]);
    }

    #[test]
    fn colors_are_modulated_and_repacked() {
        let mut layer = layer();
        let (verts, indices) = quad();

        let params = AppendParams {
            color: Color::new(1.0, 0.0, 1.0, 1.0),
            opacity: 0.5,
            ..identity_params()
        };
        layer.append(&verts, &indices, &params);

        let c = Color::from_rgba8(layer.vertices()[0].color);
        assert!((c.r - 0.5).abs() < 1.0 / 255.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 0.5).abs() < 1.0 / 255.0);
        assert!((c.a - 0.5).abs() < 1.0 / 255.0);
    }

    // ── capacity ──────────────────────────────────────────────────────────

    #[test]
    fn filling_exactly_to_capacity_succeeds() {
        let mut layer = layer();
        let (verts, indices) = triangles(MAX_TRIANGLES);

        assert!(layer.append(&verts, &indices, &identity_params()));
        assert_eq!(layer.vertex_count(), MAX_VERTICES);
        assert_eq!(layer.triangle_count(), MAX_TRIANGLES);
    }

    #[test]
    fn one_triangle_past_capacity_fails_without_mutation() {
        let mut layer = layer();
        let (verts, indices) = triangles(MAX_TRIANGLES);
        assert!(layer.append(&verts, &indices, &identity_params()));

        let (one_vert, one_index) = triangles(1);
        assert!(!layer.append(&one_vert, &one_index, &identity_params()));

        assert_eq!(layer.vertex_count(), MAX_VERTICES);
        assert_eq!(layer.triangle_count(), MAX_TRIANGLES);
    }

    #[test]
    fn oversized_batch_fails_on_an_empty_layer() {
        let mut layer = layer();
        let (verts, indices) = triangles(MAX_TRIANGLES + 1);

        assert!(!layer.append(&verts, &indices, &identity_params()));
        assert_eq!(layer.vertex_count(), 0);
        assert_eq!(layer.triangle_count(), 0);
    }

    // ── identity / validate ───────────────────────────────────────────────

    #[test]
    fn validate_requires_all_three_identity_parts() {
        let scissor = Scissor::enabled(Rect::new(0.0, 0.0, 5.0, 5.0));
        let layer = RenderLayer::new(pair(), Some(TextureId(1)), ShaderId(2), scissor);

        assert!(layer.validate(Some(TextureId(1)), ShaderId(2), scissor));
        assert!(!layer.validate(None, ShaderId(2), scissor));
        assert!(!layer.validate(Some(TextureId(9)), ShaderId(2), scissor));
        assert!(!layer.validate(Some(TextureId(1)), ShaderId(3), scissor));
        assert!(!layer.validate(Some(TextureId(1)), ShaderId(2), Scissor::disabled()));
        assert!(!layer.validate(
            Some(TextureId(1)),
            ShaderId(2),
            Scissor::enabled(Rect::new(0.0, 0.0, 5.0, 6.0))
        ));
    }

    #[test]
    fn reset_rebinds_identity_and_clears_content() {
        let mut layer = layer();
        let (verts, indices) = quad();
        layer.append(&verts, &indices, &identity_params());

        let scissor = Scissor::enabled(Rect::new(1.0, 1.0, 2.0, 2.0));
        layer.reset(Some(TextureId(3)), ShaderId(4), scissor);

        assert_eq!(layer.vertex_count(), 0);
        assert_eq!(layer.triangle_count(), 0);
        assert!(layer.validate(Some(TextureId(3)), ShaderId(4), scissor));
        assert_eq!(layer.buffers(), pair());
    }

    // ── upload ────────────────────────────────────────────────────────────

    #[test]
    fn upload_of_an_empty_layer_is_a_no_op() {
        let backend_layer = layer();
        let mut backend = RecordingBackend::new();
        backend_layer.upload(&mut backend, 0, 1);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn upload_issues_exactly_one_draw_over_the_filled_prefix() {
        let mut layer = layer();
        let (verts, indices) = quad();
        layer.append(&verts, &indices, &identity_params());

        let mut backend = RecordingBackend::new();
        layer.upload(&mut backend, 0, 1);

        assert_eq!(
            backend.commands(),
            &[
                Command::UploadVertices { buffer: BufferId(0), count: 4 },
                Command::UploadIndices { buffer: BufferId(1), count: 6 },
                Command::BindAttributes { position_slot: 0, color_slot: 1 },
                Command::SetScissor(Scissor::disabled()),
                Command::DrawIndexed {
                    buffers: pair(),
                    texture: None,
                    index_count: 6,
                },
            ]
        );
    }
}
