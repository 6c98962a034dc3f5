use crate::types::{ColliderShape, Pose, SimHandle};

/// Safe call surface over one generation of the engine's entry points.
///
/// Production code talks to an [`EntryPointTable`](crate::EntryPointTable);
/// tests substitute a scripted implementation. The host replaces the whole
/// object on reload, never individual operations.
///
/// Conventions mirror the wire contract: boolean-ish operations return
/// `true` for engine success (wire 1) and `false` for failure (wire 0);
/// count queries return the engine's value as-is; buffer reads return the
/// number of elements written, negative on failure; collider registration
/// returns the assigned id, negative on failure.
///
/// All poses passed here must already be in engine space (see
/// [`Pose::mirrored`]).
pub trait EngineApi: Send {
    fn initialize(&self, ground_height: f32) -> SimHandle;
    fn release(&self, handle: SimHandle) -> bool;
    fn step(&self, handle: SimHandle) -> bool;

    fn vertex_count(&self, handle: SimHandle) -> i32;
    fn triangle_count(&self, handle: SimHandle) -> i32;
    fn uv_count(&self, handle: SimHandle) -> i32;

    fn read_vertex_positions(&self, handle: SimHandle, out: &mut [f32]) -> i32;
    fn read_triangle_indices(&self, handle: SimHandle, out: &mut [u32]) -> i32;
    fn read_vertex_uvs(&self, handle: SimHandle, out: &mut [f32]) -> i32;
    fn read_vertex_stress(&self, handle: SimHandle, out: &mut [f32]) -> i32;

    fn set_time_step(&self, handle: SimHandle, dt: f32, substeps: i32) -> bool;
    fn set_material(&self, handle: SimHandle, density: f32, stiffness: f32, damping: f32) -> bool;
    fn set_friction(&self, handle: SimHandle, dynamic: f32, static_: f32) -> bool;
    fn set_collision(&self, handle: SimHandle, margin: f32, self_collision: bool) -> bool;
    fn set_solver(&self, handle: SimHandle, iterations: i32, tolerance: f32) -> bool;
    fn set_stress_visualization(&self, handle: SimHandle, enabled: bool, max_stress: f32) -> bool;
    fn set_mesh_name(&self, handle: SimHandle, name: &str) -> bool;
    fn set_body_transform(&self, handle: SimHandle, pose: &Pose) -> bool;
    fn set_attached_indices(&self, handle: SimHandle, indices: &[u32]) -> bool;
    fn set_resource_path(&self, handle: SimHandle, path: &str) -> bool;
    fn create_scene(&self, handle: SimHandle) -> bool;

    fn add_collider(&self, handle: SimHandle, shape: ColliderShape, pose: &Pose) -> i32;
    fn update_collider(&self, handle: SimHandle, id: i32, pose: &Pose) -> bool;
    fn remove_collider(&self, handle: SimHandle, id: i32) -> bool;
}
