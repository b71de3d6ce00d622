//! Geometry production for the batching canvas.
//!
//! Responsibilities:
//! - the GPU vertex wire type ([`Vertex`])
//! - ephemeral tessellation output ([`GeometryBatch`])
//! - polyline stroking with miter joints ([`tessellate_polyline`]) and the
//!   segment-intersection primitive it is built on ([`intersect`])
//!
//! Everything here is pure: no GPU state, no canvas state.

mod tessellate;
mod vertex;

pub use tessellate::{GeometryBatch, LineRelation, intersect, tessellate_polyline};
pub use vertex::Vertex;
