//! Coordinate and geometry types shared across the renderer.
//!
//! Canonical CPU space:
//! - Logical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! The canvas converts to clip space with one orthographic projection at
//! flush time; everything before that stays in this space.

mod rect;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
