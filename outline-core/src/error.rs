//! Error types shared across the outline pipeline.
//!
//! None of these cross the public highlight API: the manager logs them and
//! degrades (skip, no-op or recompute) so one broken target never stalls the rest.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OutlineError {
    /// A required material template is missing from the resource store.
    #[error("material template `{path}` not found in resource store")]
    MissingTemplate { path: String },

    /// Persisted bake keys and values disagree, or no longer match the meshes.
    #[error("stale bake data: {keys} keys, {values} values, {meshes} meshes in hierarchy")]
    StaleBake { keys: usize, values: usize, meshes: usize },

    #[error("channel has {got} entries but mesh has {expected} vertices")]
    VertexCountMismatch { expected: usize, got: usize },

    #[error("uv channel {0} out of range")]
    UvChannelOutOfRange(usize),

    #[error("object is not part of the scene")]
    UnknownObject,
}

pub type Result<T, E = OutlineError> = std::result::Result<T, E>;
