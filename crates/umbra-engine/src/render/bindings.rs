//! Binding indices shared with the WGSL sources.
//!
//! Every pass binds a single group. Indices are part of the shader ABI and
//! must not be renumbered without editing the matching `.wgsl` file.

pub const GROUP: u32 = 0;

pub mod sdf {
    pub const DISTANCE_FIELD: u32 = 0;
    pub const VIEWPORT: u32 = 1;
    pub const RECTS: u32 = 2;
    pub const RECT_COUNT: u32 = 3;
    pub const CIRCLES: u32 = 4;
    pub const CIRCLE_COUNT: u32 = 5;
}

pub mod lighting {
    pub const DISTANCE_FIELD: u32 = 0;
    pub const COLOR: u32 = 1;
    pub const VIEWPORT: u32 = 2;
    pub const LIGHTS: u32 = 3;
    pub const LIGHT_COUNT: u32 = 4;
}

pub mod present {
    pub const VIEWPORT: u32 = 0;
    pub const COLOR: u32 = 1;
}

pub mod overlay {
    pub const VIEWPORT: u32 = 0;
}
