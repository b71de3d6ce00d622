//! GPU collaborator contract.
//!
//! The core never talks to a graphics API directly; it drives a
//! [`GpuBackend`] and decides only *what* to send and *when*. Buffer,
//! texture and shader identities are opaque handles compared by equality.
//!
//! [`recording::RecordingBackend`] is a headless implementation that
//! captures the command stream, used by the test suite and usable for
//! golden-image style verification of batching decisions.

pub mod recording;

use glam::Mat4;

use crate::coords::{Rect, Viewport};
use crate::geometry::Vertex;
use crate::paint::Color;

pub use recording::{Command, RecordingBackend};

/// Opaque GPU buffer handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufferId(pub u32);

/// Opaque texture handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub u32);

/// Opaque shader program handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ShaderId(pub u32);

/// Vertex/index buffer pair backing one render layer.
///
/// Created once per layer and owned by that layer for process lifetime;
/// recycling reuses the layer, never transfers the handles.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BufferPair {
    pub vertices: BufferId,
    pub indices: BufferId,
}

/// Pixel channel order of texture data handed to [`GpuBackend::create_texture`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ColorFormat {
    #[default]
    Rgba,
    Bgra,
    Argb,
    Abgr,
}

/// Scissor state: an enabled flag plus the rect it applies.
///
/// Two scissor states are batch-compatible when the flags match and, if
/// enabled, the rects are exactly equal. The rect is ignored while the
/// flag is off.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Scissor {
    pub enabled: bool,
    pub rect: Rect,
}

impl Scissor {
    #[inline]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            rect: Rect::new(0.0, 0.0, 0.0, 0.0),
        }
    }

    #[inline]
    pub const fn enabled(rect: Rect) -> Self {
        Self { enabled: true, rect }
    }

    /// Batch-compatibility equality: flag, and rect only while enabled.
    #[inline]
    pub fn matches(self, other: Scissor) -> bool {
        self.enabled == other.enabled && (!self.enabled || self.rect == other.rect)
    }
}

/// The GPU command backend the core flushes into.
///
/// Implementations are synchronous: every call is a direct handoff, and
/// any internal queuing is the backend's own concern. Creation failures
/// are reported by returning `None` after logging; the core never panics
/// on them.
pub trait GpuBackend {
    /// Creates one vertex/index buffer pair for a new layer.
    fn create_buffer_pair(&mut self) -> BufferPair;

    /// Uploads the filled vertex prefix of a layer into its vertex buffer.
    fn upload_vertices(&mut self, buffer: BufferId, vertices: &[Vertex]);

    /// Uploads the filled index prefix of a layer into its index buffer.
    fn upload_indices(&mut self, buffer: BufferId, indices: &[u16]);

    /// Binds the two vertex attributes to the fixed [`Vertex`] layout:
    /// position+uv as 4 x f32 at offset 0, color as 4 x u8 normalized at
    /// [`Vertex::COLOR_OFFSET`], both at [`Vertex::STRIDE`].
    fn bind_attributes(&mut self, position_slot: u32, color_slot: u32);

    /// Enables or disables the scissor test with the given rect.
    fn set_scissor(&mut self, scissor: Scissor);

    /// Issues one indexed triangle-list draw over the currently uploaded
    /// prefix of `buffers`, sampling `texture` when present.
    fn draw_indexed(&mut self, buffers: BufferPair, texture: Option<TextureId>, index_count: usize);

    fn set_viewport(&mut self, viewport: Viewport);

    /// Clears the frame buffer to `color`.
    fn clear(&mut self, color: Color);

    /// Creates a texture from raw pixel data. Decoding from image files is
    /// a caller concern. Returns `None` on failure.
    fn create_texture(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> Option<TextureId>;

    /// Compiles and links a shader program. Returns `None` on failure; the
    /// backend is expected to log the compile/link diagnostics.
    fn create_shader(&mut self, vertex_src: &str, fragment_src: &str) -> Option<ShaderId>;

    /// Binds `shader` and pushes its pending uniforms.
    fn apply_shader(&mut self, shader: ShaderId);

    /// Stages the named 4x4 projection uniform on `shader`.
    fn set_projection(&mut self, shader: ShaderId, projection: Mat4);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_scissors_match_regardless_of_rect() {
        let a = Scissor {
            enabled: false,
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        };
        assert!(a.matches(Scissor::disabled()));
    }

    #[test]
    fn enabled_scissors_require_exact_rect() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert!(Scissor::enabled(rect).matches(Scissor::enabled(rect)));
        assert!(!Scissor::enabled(rect).matches(Scissor::enabled(Rect::new(1.0, 2.0, 3.0, 5.0))));
        assert!(!Scissor::enabled(rect).matches(Scissor::disabled()));
    }
}
