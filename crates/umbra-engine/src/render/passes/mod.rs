//! GPU passes of the scene renderer.
//!
//! Each pass owns its pipeline and bind group layout. Bind groups reference
//! viewport-sized buffers owned by [`FrameTargets`](common::FrameTargets) and
//! are rebuilt whenever those are.

pub(crate) mod common;
pub(crate) mod lighting;
pub(crate) mod present;
pub(crate) mod sdf;
