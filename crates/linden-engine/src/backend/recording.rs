//! Headless backend that records the command stream.
//!
//! Every [`GpuBackend`] call is appended to an in-order command list.
//! Uploads record element counts rather than payloads so large frames stay
//! cheap to capture.

use glam::Mat4;

use crate::coords::Viewport;
use crate::geometry::Vertex;
use crate::paint::Color;

use super::{BufferId, BufferPair, ColorFormat, GpuBackend, Scissor, ShaderId, TextureId};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateBufferPair(BufferPair),
    UploadVertices { buffer: BufferId, count: usize },
    UploadIndices { buffer: BufferId, count: usize },
    BindAttributes { position_slot: u32, color_slot: u32 },
    SetScissor(Scissor),
    DrawIndexed {
        buffers: BufferPair,
        texture: Option<TextureId>,
        index_count: usize,
    },
    SetViewport(Viewport),
    Clear(Color),
    CreateTexture {
        id: TextureId,
        width: u32,
        height: u32,
        format: ColorFormat,
    },
    CreateShader(ShaderId),
    ApplyShader(ShaderId),
    SetProjection(ShaderId, Mat4),
}

/// Recording [`GpuBackend`]: hands out sequential handles and captures the
/// command stream for inspection.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub(crate) commands: Vec<Command>,
    pub(crate) next_buffer: u32,
    pub(crate) next_texture: u32,
    pub(crate) next_shader: u32,

    /// When set, [`create_shader`](GpuBackend::create_shader) simulates a
    /// compile/link failure and returns `None`.
    pub fail_shader_creation: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded command stream, in call order.
    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of recorded indexed draw calls.
    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawIndexed { .. }))
            .count()
    }

    /// Drops the recorded stream. Handle counters keep running so handles
    /// stay unique across frames.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

impl GpuBackend for RecordingBackend {
    fn create_buffer_pair(&mut self) -> BufferPair {
        let pair = BufferPair {
            vertices: BufferId(self.next_buffer),
            indices: BufferId(self.next_buffer + 1),
        };
        self.next_buffer += 2;
        self.commands.push(Command::CreateBufferPair(pair));
        pair
    }

    fn upload_vertices(&mut self, buffer: BufferId, vertices: &[Vertex]) {
        self.commands.push(Command::UploadVertices {
            buffer,
            count: vertices.len(),
        });
    }

    fn upload_indices(&mut self, buffer: BufferId, indices: &[u16]) {
        self.commands.push(Command::UploadIndices {
            buffer,
            count: indices.len(),
        });
    }

    fn bind_attributes(&mut self, position_slot: u32, color_slot: u32) {
        self.commands.push(Command::BindAttributes {
            position_slot,
            color_slot,
        });
    }

    fn set_scissor(&mut self, scissor: Scissor) {
        self.commands.push(Command::SetScissor(scissor));
    }

    fn draw_indexed(&mut self, buffers: BufferPair, texture: Option<TextureId>, index_count: usize) {
        self.commands.push(Command::DrawIndexed {
            buffers,
            texture,
            index_count,
        });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(Command::SetViewport(viewport));
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(Command::Clear(color));
    }

    fn create_texture(
        &mut self,
        _pixels: &[u8],
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> Option<TextureId> {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.commands.push(Command::CreateTexture {
            id,
            width,
            height,
            format,
        });
        Some(id)
    }

    fn create_shader(&mut self, _vertex_src: &str, _fragment_src: &str) -> Option<ShaderId> {
        if self.fail_shader_creation {
            log::error!("recording backend: simulated shader compile failure");
            return None;
        }
        let id = ShaderId(self.next_shader);
        self.next_shader += 1;
        self.commands.push(Command::CreateShader(id));
        Some(id)
    }

    fn apply_shader(&mut self, shader: ShaderId) {
        self.commands.push(Command::ApplyShader(shader));
    }

    fn set_projection(&mut self, shader: ShaderId, projection: Mat4) {
        self.commands.push(Command::SetProjection(shader, projection));
    }
}
