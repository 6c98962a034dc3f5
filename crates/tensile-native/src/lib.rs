//! Wire contract with the native simulation module: the loader that maps and
//! unmaps it, the typed entry point table resolved from it, and the value
//! types that cross the boundary.
//!
//! The host side (queue, watcher, parameter sync, buffers, colliders) lives
//! in `tensile-host`; this crate knows nothing about ticks or reload policy.

pub mod api;
pub mod entry_points;
pub mod error;
pub mod module;
pub mod types;

pub use api::EngineApi;
pub use entry_points::EntryPointTable;
pub use error::{NativeError, NativeResult};
pub use module::NativeModule;
pub use types::{ColliderShape, Pose, Quat, SimHandle, Vec3};
