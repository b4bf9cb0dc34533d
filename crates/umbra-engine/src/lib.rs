//! Umbra engine crate.
//!
//! A 2D signed-distance-field renderer: a [`scene::Scene`] of circles, rects
//! and point lights is packed into GPU records laid out from WGSL struct
//! declarations, shaded by compute passes and presented to a window surface.

pub mod coords;
pub mod core;
pub mod device;
pub mod logging;
pub mod render;
pub mod scene;
pub mod window;
