//! Linden engine crate.
//!
//! A 2D immediate-mode renderer that batches draw calls into fixed-capacity
//! GPU-ready layers and tessellates polylines into triangulated strokes.
//!
//! The crate owns the batching policy (what gets uploaded, and when), not
//! the GPU itself: all device work goes through the [`backend::GpuBackend`]
//! trait, so the core stays headless and testable.

pub mod backend;
pub mod canvas;
pub mod coords;
pub mod geometry;
pub mod layer;
pub mod logging;
pub mod paint;
pub mod state;

pub use canvas::Canvas;
pub use layer::RenderLayer;
pub use state::RenderState;
