use thiserror::Error;
use umbra_layout::LayoutError;

use crate::scene::ShapeKind;

/// Renderer setup failures.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("shader record layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("struct `{0}` is not declared in the shader source")]
    MissingRecord(&'static str),

    #[error("struct `{record}` has no field `{field}`")]
    MissingField { record: &'static str, field: &'static str },

    #[error("field `{record}.{field}` is only {size} bytes")]
    FieldTooSmall { record: &'static str, field: &'static str, size: usize },

    #[error("host `{name}` is {host} bytes but the shader declares {shader}")]
    UniformMismatch { name: &'static str, host: usize, shader: usize },

    #[error("{width}x{height} viewport needs {bytes} bytes per target, device allows {limit}")]
    ViewportTooLarge { width: u32, height: u32, bytes: u64, limit: u64 },
}

/// The scene holds more objects of one kind than its device slot can take.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
#[error("{kind} slot holds {capacity} records but the scene has {live}")]
pub struct CapacityError {
    pub kind: ShapeKind,
    pub live: usize,
    pub capacity: usize,
}
