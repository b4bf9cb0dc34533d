//! GPU rendering subsystem.
//!
//! [`SceneRenderer`] turns a [`crate::scene::Scene`] into a lit frame:
//! records are packed on the CPU by the [`Marshaler`], a compute pass
//! evaluates the signed distance field, a second one accumulates light, and a
//! fullscreen pass presents the result. [`ImmediateGeometry`] lines are drawn
//! on top.
//!
//! Convention:
//! - Geometry is in physical pixels (top-left origin, +Y down).
//! - Record layouts come from `shaders/records.wgsl`, which is prepended to
//!   every shader module.

pub mod bindings;
mod ctx;
mod error;
pub mod immediate;
mod line;
pub mod marshal;
pub(crate) mod passes;
pub mod records;
mod renderer;
pub mod schedule;

pub use ctx::{RenderCtx, RenderTarget};
pub use error::{CapacityError, RenderError};
pub use immediate::{
    DEFAULT_CIRCLE_RESOLUTION, ImmediateGeometry, LineInstance, OUTLINE_HOVERED, OUTLINE_IDLE,
    OUTLINE_SELECTED,
};
pub use line::LineRenderer;
pub use marshal::{MarshalReport, Marshaler, OverflowPolicy, ShapeSlot, SlotCapacities, SlotReport};
pub use records::{FieldSpan, RecordLayouts};
pub use renderer::{FrameStats, RendererConfig, SceneRenderer};
pub use schedule::{FramePlan, FrameScheduler};
