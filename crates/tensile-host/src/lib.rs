//! Host and resynchronization layer for the native simulation module.
//!
//! Keeps the application's view of the engine consistent across per-frame
//! parameter changes, dynamically registered collision proxies, and live
//! replacement of the module itself while the process keeps running.
//!
//! The pieces, leaf first: [`MainThreadQueue`] (the only bridge from
//! background threads to host state), [`ChangeWatcher`] (debounced file
//! notifications that post reload requests), [`ParameterSnapshot`]
//! (group-wise diffing of tunables), [`MeshBuffers`] (fixed-layout
//! read-back), [`ColliderRegistry`] (proxy reconciliation),
//! [`SimulationHost`] (the state machine), and [`HostRuntime`] (wiring).

pub mod colliders;
pub mod config;
pub mod error;
pub mod host;
pub mod mesh;
pub mod params;
pub mod queue;
pub mod runtime;
pub mod watcher;

#[cfg(test)]
pub(crate) mod mock;

pub use colliders::{ColliderProxy, ColliderRegistry, UNREGISTERED};
pub use config::HostConfig;
pub use error::{HostError, HostResult};
pub use host::{HostState, SimulationHost};
pub use mesh::{MeshBuffers, StressPalette};
pub use params::{FieldGroup, ParameterSnapshot};
pub use queue::{MainThreadQueue, Task, TaskSender};
pub use runtime::HostRuntime;
pub use watcher::{ChangeWatcher, DEFAULT_DEBOUNCE};
