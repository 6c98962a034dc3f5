use std::path::PathBuf;

use thiserror::Error;

use tensile_native::{ColliderShape, NativeError};

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Native(#[from] NativeError),

    #[error("engine refused to initialize (returned the null handle)")]
    InitializationFailure,

    #[error("invalid mesh data: {vertices} vertices, {triangles} triangles")]
    InvalidMeshData { vertices: i32, triangles: i32 },

    #[error("engine read failed: {what}")]
    ReadFailure { what: &'static str },

    #[error("engine write failed: {what}")]
    WriteFailure { what: &'static str },

    #[error("collider registration failed: {shape:?}")]
    RegistrationFailure { shape: ColliderShape },

    #[error("watch setup failed: {path:?}: {message}")]
    WatchFailure { path: PathBuf, message: String },

    #[error("config load failed: {path:?}: {message}")]
    Config { path: PathBuf, message: String },
}

pub type HostResult<T> = Result<T, HostError>;
