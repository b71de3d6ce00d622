//! Paint model for the renderer.
//!
//! Scope:
//! - color representation (straight alpha, f32 channels)
//! - packed RGBA8 conversion for the GPU vertex stream
//!
//! Colors are straight alpha because the canvas modulates state color,
//! vertex color and opacity per channel at append time; premultiplication
//! is left to the blend configuration of the backend.

mod color;

pub use color::Color;
