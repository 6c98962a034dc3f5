#![forbid(unsafe_op_in_unsafe_fn)]

use std::ffi::CString;
use std::os::raw::c_char;

use crate::api::EngineApi;
use crate::error::{NativeError, NativeResult};
use crate::module::{symbol_name, NativeModule};
use crate::types::{ColliderShape, Pose, SimHandle};

// Entry point signatures. Scalars cross as plain values; strings are
// null-terminated; bulk data crosses via caller-allocated buffers with an
// explicit element capacity. Pose-accepting calls take a pointer to ten
// floats laid out per `Pose::to_wire`.
type InitializeFn = unsafe extern "C" fn(f32) -> i32;
type HandleOnlyFn = unsafe extern "C" fn(i32) -> i32;
type FillF32Fn = unsafe extern "C" fn(i32, *mut f32, i32) -> i32;
type FillU32Fn = unsafe extern "C" fn(i32, *mut u32, i32) -> i32;
type SetTimeStepFn = unsafe extern "C" fn(i32, f32, i32) -> i32;
type SetMaterialFn = unsafe extern "C" fn(i32, f32, f32, f32) -> i32;
type SetFrictionFn = unsafe extern "C" fn(i32, f32, f32) -> i32;
type SetCollisionFn = unsafe extern "C" fn(i32, f32, i32) -> i32;
type SetSolverFn = unsafe extern "C" fn(i32, i32, f32) -> i32;
type SetStressVisFn = unsafe extern "C" fn(i32, i32, f32) -> i32;
type SetStringFn = unsafe extern "C" fn(i32, *const c_char) -> i32;
type SetPoseFn = unsafe extern "C" fn(i32, *const f32) -> i32;
type SetIndicesFn = unsafe extern "C" fn(i32, *const u32, i32) -> i32;
type AddColliderFn = unsafe extern "C" fn(i32, i32, *const f32) -> i32;
type UpdateColliderFn = unsafe extern "C" fn(i32, i32, *const f32) -> i32;
type RemoveColliderFn = unsafe extern "C" fn(i32, i32) -> i32;

/// The full set of engine entry points, bound against exactly one
/// [`NativeModule`] generation.
///
/// Built atomically: if any required symbol is missing the build fails and
/// no partially bound table is ever exposed. On reload the table is rebuilt
/// from scratch and the old value dropped wholesale; entries are never
/// patched in place, so there is no window where some are stale and some
/// fresh.
pub struct EntryPointTable {
    generation: u64,

    initialize: InitializeFn,
    step: HandleOnlyFn,
    release: HandleOnlyFn,

    get_vertex_count: HandleOnlyFn,
    get_triangle_count: HandleOnlyFn,
    get_uv_count: HandleOnlyFn,
    get_vertex_positions: FillF32Fn,
    get_triangle_indices: FillU32Fn,
    get_vertex_uvs: FillF32Fn,
    get_vertex_stress: FillF32Fn,

    set_time_step: SetTimeStepFn,
    set_material: SetMaterialFn,
    set_friction: SetFrictionFn,
    set_collision: SetCollisionFn,
    set_solver: SetSolverFn,
    set_stress_visualization: SetStressVisFn,
    set_mesh_name: SetStringFn,
    set_body_transform: SetPoseFn,
    set_attached_indices: SetIndicesFn,
    set_resource_path: SetStringFn,
    create_scene: HandleOnlyFn,

    add_collider: AddColliderFn,
    update_collider: UpdateColliderFn,
    remove_collider: RemoveColliderFn,
}

impl EntryPointTable {
    /// Resolves every entry point from the module's current mapping.
    ///
    /// Fails with `BindingFailure` naming the first missing symbol. The
    /// returned table is valid only while the module stays loaded in the
    /// same generation.
    pub fn bind(module: &NativeModule) -> NativeResult<Self> {
        Ok(Self {
            generation: module.generation(),

            initialize: bound(module, b"sim_initialize\0")?,
            step: bound(module, b"sim_step\0")?,
            release: bound(module, b"sim_release\0")?,

            get_vertex_count: bound(module, b"sim_get_vertex_count\0")?,
            get_triangle_count: bound(module, b"sim_get_triangle_count\0")?,
            get_uv_count: bound(module, b"sim_get_uv_count\0")?,
            get_vertex_positions: bound(module, b"sim_get_vertex_positions\0")?,
            get_triangle_indices: bound(module, b"sim_get_triangle_indices\0")?,
            get_vertex_uvs: bound(module, b"sim_get_vertex_uvs\0")?,
            get_vertex_stress: bound(module, b"sim_get_vertex_stress\0")?,

            set_time_step: bound(module, b"sim_set_time_step\0")?,
            set_material: bound(module, b"sim_set_material\0")?,
            set_friction: bound(module, b"sim_set_friction\0")?,
            set_collision: bound(module, b"sim_set_collision\0")?,
            set_solver: bound(module, b"sim_set_solver\0")?,
            set_stress_visualization: bound(module, b"sim_set_stress_visualization\0")?,
            set_mesh_name: bound(module, b"sim_set_mesh_name\0")?,
            set_body_transform: bound(module, b"sim_set_body_transform\0")?,
            set_attached_indices: bound(module, b"sim_set_attached_indices\0")?,
            set_resource_path: bound(module, b"sim_set_resource_path\0")?,
            create_scene: bound(module, b"sim_create_scene\0")?,

            add_collider: bound(module, b"sim_add_collider\0")?,
            update_collider: bound(module, b"sim_update_collider\0")?,
            remove_collider: bound(module, b"sim_remove_collider\0")?,
        })
    }

    /// Generation of the module this table was bound against.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn bound<T: Copy>(module: &NativeModule, symbol: &'static [u8]) -> NativeResult<T> {
    module.resolve::<T>(symbol).map_err(|_| NativeError::BindingFailure {
        symbol: symbol_name(symbol),
    })
}

#[inline]
fn ok(wire: i32) -> bool {
    wire != 0
}

impl EngineApi for EntryPointTable {
    fn initialize(&self, ground_height: f32) -> SimHandle {
        SimHandle(unsafe { (self.initialize)(ground_height) })
    }

    fn release(&self, handle: SimHandle) -> bool {
        ok(unsafe { (self.release)(handle.0) })
    }

    fn step(&self, handle: SimHandle) -> bool {
        ok(unsafe { (self.step)(handle.0) })
    }

    fn vertex_count(&self, handle: SimHandle) -> i32 {
        unsafe { (self.get_vertex_count)(handle.0) }
    }

    fn triangle_count(&self, handle: SimHandle) -> i32 {
        unsafe { (self.get_triangle_count)(handle.0) }
    }

    fn uv_count(&self, handle: SimHandle) -> i32 {
        unsafe { (self.get_uv_count)(handle.0) }
    }

    fn read_vertex_positions(&self, handle: SimHandle, out: &mut [f32]) -> i32 {
        unsafe { (self.get_vertex_positions)(handle.0, out.as_mut_ptr(), out.len() as i32) }
    }

    fn read_triangle_indices(&self, handle: SimHandle, out: &mut [u32]) -> i32 {
        unsafe { (self.get_triangle_indices)(handle.0, out.as_mut_ptr(), out.len() as i32) }
    }

    fn read_vertex_uvs(&self, handle: SimHandle, out: &mut [f32]) -> i32 {
        unsafe { (self.get_vertex_uvs)(handle.0, out.as_mut_ptr(), out.len() as i32) }
    }

    fn read_vertex_stress(&self, handle: SimHandle, out: &mut [f32]) -> i32 {
        unsafe { (self.get_vertex_stress)(handle.0, out.as_mut_ptr(), out.len() as i32) }
    }

    fn set_time_step(&self, handle: SimHandle, dt: f32, substeps: i32) -> bool {
        ok(unsafe { (self.set_time_step)(handle.0, dt, substeps) })
    }

    fn set_material(&self, handle: SimHandle, density: f32, stiffness: f32, damping: f32) -> bool {
        ok(unsafe { (self.set_material)(handle.0, density, stiffness, damping) })
    }

    fn set_friction(&self, handle: SimHandle, dynamic: f32, static_: f32) -> bool {
        ok(unsafe { (self.set_friction)(handle.0, dynamic, static_) })
    }

    fn set_collision(&self, handle: SimHandle, margin: f32, self_collision: bool) -> bool {
        ok(unsafe { (self.set_collision)(handle.0, margin, self_collision as i32) })
    }

    fn set_solver(&self, handle: SimHandle, iterations: i32, tolerance: f32) -> bool {
        ok(unsafe { (self.set_solver)(handle.0, iterations, tolerance) })
    }

    fn set_stress_visualization(&self, handle: SimHandle, enabled: bool, max_stress: f32) -> bool {
        ok(unsafe { (self.set_stress_visualization)(handle.0, enabled as i32, max_stress) })
    }

    fn set_mesh_name(&self, handle: SimHandle, name: &str) -> bool {
        let Ok(name) = CString::new(name) else {
            log::warn!("entry points: mesh name contains interior NUL, call skipped");
            return false;
        };
        ok(unsafe { (self.set_mesh_name)(handle.0, name.as_ptr()) })
    }

    fn set_body_transform(&self, handle: SimHandle, pose: &Pose) -> bool {
        let wire = pose.to_wire();
        ok(unsafe { (self.set_body_transform)(handle.0, wire.as_ptr()) })
    }

    fn set_attached_indices(&self, handle: SimHandle, indices: &[u32]) -> bool {
        ok(unsafe { (self.set_attached_indices)(handle.0, indices.as_ptr(), indices.len() as i32) })
    }

    fn set_resource_path(&self, handle: SimHandle, path: &str) -> bool {
        let Ok(path) = CString::new(path) else {
            log::warn!("entry points: resource path contains interior NUL, call skipped");
            return false;
        };
        ok(unsafe { (self.set_resource_path)(handle.0, path.as_ptr()) })
    }

    fn create_scene(&self, handle: SimHandle) -> bool {
        ok(unsafe { (self.create_scene)(handle.0) })
    }

    fn add_collider(&self, handle: SimHandle, shape: ColliderShape, pose: &Pose) -> i32 {
        let wire = pose.to_wire();
        unsafe { (self.add_collider)(handle.0, shape.wire_code(), wire.as_ptr()) }
    }

    fn update_collider(&self, handle: SimHandle, id: i32, pose: &Pose) -> bool {
        let wire = pose.to_wire();
        ok(unsafe { (self.update_collider)(handle.0, id, wire.as_ptr()) })
    }

    fn remove_collider(&self, handle: SimHandle, id: i32) -> bool {
        ok(unsafe { (self.remove_collider)(handle.0, id) })
    }
}
