/// Linear RGBA color.
///
/// Light intensities may exceed 1.0; the present pass tone-maps them.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Opaque grey with all channels at `v`.
    #[inline]
    pub const fn grey(v: f32) -> Self {
        Self::new(v, v, v, 1.0)
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<ColorRgba> for wgpu::Color {
    fn from(c: ColorRgba) -> Self {
        wgpu::Color { r: c.r as f64, g: c.g as f64, b: c.b as f64, a: c.a as f64 }
    }
}

impl From<glam::Vec4> for ColorRgba {
    fn from(v: glam::Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grey_is_opaque() {
        assert_eq!(ColorRgba::grey(0.25).to_array(), [0.25, 0.25, 0.25, 1.0]);
    }

    #[test]
    fn hdr_light_colour_is_kept() {
        let c = ColorRgba::from(glam::Vec4::new(4.0, 2.0, 0.5, 1.0));
        assert_eq!(c.to_array(), [4.0, 2.0, 0.5, 1.0]);
    }

    #[test]
    fn converts_to_clear_color() {
        let c: wgpu::Color = ColorRgba::white().into();
        assert_eq!((c.r, c.g, c.b, c.a), (1.0, 1.0, 1.0, 1.0));
    }
}
