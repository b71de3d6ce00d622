use core::ops::Mul;

const R_SHIFT: u32 = 0;
const G_SHIFT: u32 = 8;
const B_SHIFT: u32 = 16;
const A_SHIFT: u32 = 24;

/// Straight-alpha RGBA color with f32 channels.
///
/// The packed form is `0xAABBGGRR` (red in the lowest byte), the byte
/// order the vertex stream carries as `4 x u8 normalized`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Unpacks a `0xAABBGGRR` value into f32 channels.
    #[inline]
    pub fn from_rgba8(packed: u32) -> Self {
        let s = 1.0 / 255.0;
        Self {
            r: ((packed >> R_SHIFT) & 0xFF) as f32 * s,
            g: ((packed >> G_SHIFT) & 0xFF) as f32 * s,
            b: ((packed >> B_SHIFT) & 0xFF) as f32 * s,
            a: ((packed >> A_SHIFT) & 0xFF) as f32 * s,
        }
    }

    /// Packs the channels into `0xAABBGGRR`, rounding and saturating to u8.
    #[inline]
    pub fn to_rgba8(self) -> u32 {
        #[inline]
        fn sat(v: f32) -> u32 {
            (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u32
        }

        sat(self.r) << R_SHIFT | sat(self.g) << G_SHIFT | sat(self.b) << B_SHIFT | sat(self.a) << A_SHIFT
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

impl Default for Color {
    #[inline]
    fn default() -> Self {
        Self::white()
    }
}

/// Channel-wise modulation.
impl Mul for Color {
    type Output = Color;
    #[inline]
    fn mul(self, rhs: Color) -> Color {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b, self.a * rhs.a)
    }
}

/// Uniform scaling of all channels, used for opacity.
impl Mul<f32> for Color {
    type Output = Color;
    #[inline]
    fn mul(self, rhs: f32) -> Color {
        Color::new(self.r * rhs, self.g * rhs, self.b * rhs, self.a * rhs)
    }
}
