//! Engine-level error type.

use cassini_ecs::EcsError;

/// Errors produced by the simulation driver and its systems.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// A configuration document could not be parsed or holds unusable values.
    #[error("invalid configuration: {details}")]
    InvalidConfig { details: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
