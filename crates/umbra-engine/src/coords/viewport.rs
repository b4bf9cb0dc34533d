/// Drawable size in physical pixels.
///
/// The SDF and colour buffers hold one element per pixel of this area, so
/// any change of either dimension invalidates them.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-area viewport cannot be rendered into.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Pixel count.
    #[inline]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    #[inline]
    pub fn size_f32(self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Viewport {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_is_invalid() {
        assert!(!Viewport::new(0, 600).is_valid());
        assert!(!Viewport::new(800, 0).is_valid());
        assert!(Viewport::new(1, 1).is_valid());
    }

    #[test]
    fn area_does_not_overflow() {
        assert_eq!(Viewport::new(u32::MAX, 2).area(), u32::MAX as u64 * 2);
        assert_eq!(Viewport::new(800, 600).area(), 480_000);
    }
}
