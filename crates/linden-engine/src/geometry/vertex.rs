use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;

/// GPU vertex: position (2 x f32), texture coordinate (2 x f32), packed
/// RGBA8 color. Value type with no identity; 20 bytes, no padding.
///
/// Backends bind it with the fixed layout
/// `{ position: 2 x f32 @ 0, uv: 2 x f32 @ 8, color: 4 x u8 normalized @ 16 }`
/// at [`Vertex::STRIDE`].
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: u32,
}

impl Vertex {
    pub const STRIDE: usize = core::mem::size_of::<Vertex>();
    pub const POSITION_OFFSET: usize = 0;
    pub const UV_OFFSET: usize = 8;
    pub const COLOR_OFFSET: usize = 16;

    #[inline]
    pub const fn new(pos: Vec2, uv: Vec2, color: u32) -> Self {
        Self {
            pos: [pos.x, pos.y],
            uv: [uv.x, uv.y],
            color,
        }
    }

    /// Untextured opaque-white vertex, the form tessellation emits.
    #[inline]
    pub const fn from_pos(pos: Vec2) -> Self {
        Self::new(pos, Vec2::zero(), 0xFFFF_FFFF)
    }
}
