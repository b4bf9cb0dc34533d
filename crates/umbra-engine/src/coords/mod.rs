//! Coordinate and colour types shared by the scene, renderers and overlay.
//!
//! Canonical CPU space:
//! - Physical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! Passes convert to NDC in shaders using the viewport uniform.

mod color;
mod viewport;

pub use color::ColorRgba;
pub use viewport::Viewport;
