use thiserror::Error;

use super::ObjectId;

#[derive(Debug, Error)]
pub enum SceneError {
    /// An object with this identity is already part of the scene (or appears
    /// twice in a snapshot).
    #[error("duplicate object identity {0}")]
    DuplicateId(ObjectId),

    /// The identity counter would have to pass `u32::MAX`.
    #[error("no object identities left")]
    IdentitiesExhausted,

    #[error("scene snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
