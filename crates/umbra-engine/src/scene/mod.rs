//! Scene model.
//!
//! Responsibilities:
//! - own the ordered set of circles, rects and lights with stable identities
//! - track whether device-side results are stale (dirty flag)
//! - produce and consume typed snapshots (persistence, undo/redo)

mod error;
mod history;
mod model;
mod object;
mod snapshot;

pub use error::SceneError;
pub use history::SceneHistory;
pub use model::Scene;
pub use object::{ObjectId, SceneObject, Shape, ShapeKind};
pub use snapshot::SceneSnapshot;
