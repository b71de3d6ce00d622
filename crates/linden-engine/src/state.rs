//! Transform/color/opacity composition stacks.

use glam::Mat4;

use crate::paint::Color;

/// Three independent push/pop stacks composing draw state multiplicatively.
///
/// Reads on an empty stack yield the neutral element (identity matrix,
/// opaque white, opacity 1.0). A push composes its argument with the
/// current top, so the top is always the fully composed value. Pops on an
/// empty stack are no-ops, not errors.
///
/// Owned by exactly one [`Canvas`](crate::canvas::Canvas) and cleared at
/// every `begin()`.
#[derive(Debug, Default)]
pub struct RenderState {
    matrices: Vec<Mat4>,
    colors: Vec<Color>,
    opacities: Vec<f32>,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all three stacks back to their neutral values.
    pub fn reset(&mut self) {
        self.matrices.clear();
        self.colors.clear();
        self.opacities.clear();
    }

    pub fn push_matrix(&mut self, matrix: Mat4) {
        let composed = self.matrix() * matrix;
        self.matrices.push(composed);
    }

    pub fn push_color(&mut self, color: Color) {
        let composed = self.color() * color;
        self.colors.push(composed);
    }

    pub fn push_opacity(&mut self, opacity: f32) {
        let composed = self.opacity() * opacity;
        self.opacities.push(composed);
    }

    /// Composed model matrix; identity when nothing is pushed.
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.matrices.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    /// Composed color; opaque white when nothing is pushed.
    #[inline]
    pub fn color(&self) -> Color {
        self.colors.last().copied().unwrap_or(Color::white())
    }

    /// Composed opacity; 1.0 when nothing is pushed.
    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacities.last().copied().unwrap_or(1.0)
    }

    pub fn pop_matrix(&mut self) {
        self.matrices.pop();
    }

    pub fn pop_color(&mut self) {
        self.colors.pop();
    }

    pub fn pop_opacity(&mut self) {
        self.opacities.pop();
    }
}
