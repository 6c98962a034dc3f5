//! Scripted stand-in for the native engine, shared by the unit tests.
//!
//! Records every boundary call and serves configurable data, so tests can
//! assert call counts, ordering, and argument values without a real module.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use tensile_native::{ColliderShape, EngineApi, Pose, SimHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Initialize,
    Release,
    Step,
    VertexCount,
    TriangleCount,
    UvCount,
    ReadPositions,
    ReadIndices,
    ReadUvs,
    ReadStress,
    SetTimeStep,
    SetMaterial,
    SetFriction,
    SetCollision,
    SetSolver,
    SetStressVis,
    SetMeshName(String),
    SetBodyTransform(Pose),
    SetAttachedIndices(Vec<u32>),
    SetResourcePath(String),
    CreateScene,
    AddCollider(ColliderShape, Pose),
    UpdateCollider(i32, Pose),
    RemoveCollider(i32),
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::Initialize => "initialize",
            Call::Release => "release",
            Call::Step => "step",
            Call::VertexCount => "vertex_count",
            Call::TriangleCount => "triangle_count",
            Call::UvCount => "uv_count",
            Call::ReadPositions => "read_vertex_positions",
            Call::ReadIndices => "read_triangle_indices",
            Call::ReadUvs => "read_vertex_uvs",
            Call::ReadStress => "read_vertex_stress",
            Call::SetTimeStep => "set_time_step",
            Call::SetMaterial => "set_material",
            Call::SetFriction => "set_friction",
            Call::SetCollision => "set_collision",
            Call::SetSolver => "set_solver",
            Call::SetStressVis => "set_stress_visualization",
            Call::SetMeshName(_) => "set_mesh_name",
            Call::SetBodyTransform(_) => "set_body_transform",
            Call::SetAttachedIndices(_) => "set_attached_indices",
            Call::SetResourcePath(_) => "set_resource_path",
            Call::CreateScene => "create_scene",
            Call::AddCollider(..) => "add_collider",
            Call::UpdateCollider(..) => "update_collider",
            Call::RemoveCollider(_) => "remove_collider",
        }
    }
}

pub struct ScriptState {
    pub next_handle: i32,
    pub next_collider_id: i32,
    pub vertex_count: i32,
    pub triangle_count: i32,
    pub uv_count: i32,
    pub positions: Vec<f32>,
    pub uvs: Vec<f32>,
    pub stress: Vec<f32>,
    /// Call names that currently report failure.
    pub fail: HashSet<&'static str>,
    pub calls: Vec<Call>,
}

impl Default for ScriptState {
    fn default() -> Self {
        Self {
            next_handle: 1,
            next_collider_id: 1,
            vertex_count: 4,
            triangle_count: 2,
            uv_count: 0,
            positions: vec![0.0; 12],
            uvs: Vec::new(),
            stress: vec![0.0; 4],
            fail: HashSet::new(),
            calls: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct ScriptedEngine {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock()
    }

    pub fn fail(&self, call: &'static str) {
        self.state().fail.insert(call);
    }

    pub fn recover(&self, call: &'static str) {
        self.state().fail.remove(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.state().calls.iter().filter(|c| c.name() == name).count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

fn serve(source: &[f32], out: &mut [f32]) {
    let n = source.len().min(out.len());
    out[..n].copy_from_slice(&source[..n]);
}

impl EngineApi for ScriptedEngine {
    fn initialize(&self, _ground_height: f32) -> SimHandle {
        let mut s = self.state();
        s.calls.push(Call::Initialize);
        SimHandle(s.next_handle)
    }

    fn release(&self, _handle: SimHandle) -> bool {
        let mut s = self.state();
        s.calls.push(Call::Release);
        !s.fail.contains("release")
    }

    fn step(&self, _handle: SimHandle) -> bool {
        let mut s = self.state();
        s.calls.push(Call::Step);
        !s.fail.contains("step")
    }

    fn vertex_count(&self, _handle: SimHandle) -> i32 {
        let mut s = self.state();
        s.calls.push(Call::VertexCount);
        s.vertex_count
    }

    fn triangle_count(&self, _handle: SimHandle) -> i32 {
        let mut s = self.state();
        s.calls.push(Call::TriangleCount);
        s.triangle_count
    }

    fn uv_count(&self, _handle: SimHandle) -> i32 {
        let mut s = self.state();
        s.calls.push(Call::UvCount);
        s.uv_count
    }

    fn read_vertex_positions(&self, _handle: SimHandle, out: &mut [f32]) -> i32 {
        let mut s = self.state();
        s.calls.push(Call::ReadPositions);
        if s.fail.contains("read_vertex_positions") {
            return -1;
        }
        serve(&s.positions, out);
        out.len() as i32
    }

    fn read_triangle_indices(&self, _handle: SimHandle, out: &mut [u32]) -> i32 {
        let mut s = self.state();
        s.calls.push(Call::ReadIndices);
        if s.fail.contains("read_triangle_indices") {
            return -1;
        }
        out.fill(0);
        out.len() as i32
    }

    fn read_vertex_uvs(&self, _handle: SimHandle, out: &mut [f32]) -> i32 {
        let mut s = self.state();
        s.calls.push(Call::ReadUvs);
        if s.fail.contains("read_vertex_uvs") {
            return -1;
        }
        serve(&s.uvs, out);
        out.len() as i32
    }

    fn read_vertex_stress(&self, _handle: SimHandle, out: &mut [f32]) -> i32 {
        let mut s = self.state();
        s.calls.push(Call::ReadStress);
        if s.fail.contains("read_vertex_stress") {
            return -1;
        }
        serve(&s.stress, out);
        out.len() as i32
    }

    fn set_time_step(&self, _handle: SimHandle, _dt: f32, _substeps: i32) -> bool {
        let mut s = self.state();
        s.calls.push(Call::SetTimeStep);
        !s.fail.contains("set_time_step")
    }

    fn set_material(&self, _handle: SimHandle, _density: f32, _stiffness: f32, _damping: f32) -> bool {
        let mut s = self.state();
        s.calls.push(Call::SetMaterial);
        !s.fail.contains("set_material")
    }

    fn set_friction(&self, _handle: SimHandle, _dynamic: f32, _static: f32) -> bool {
        let mut s = self.state();
        s.calls.push(Call::SetFriction);
        !s.fail.contains("set_friction")
    }

    fn set_collision(&self, _handle: SimHandle, _margin: f32, _self_collision: bool) -> bool {
        let mut s = self.state();
        s.calls.push(Call::SetCollision);
        !s.fail.contains("set_collision")
    }

    fn set_solver(&self, _handle: SimHandle, _iterations: i32, _tolerance: f32) -> bool {
        let mut s = self.state();
        s.calls.push(Call::SetSolver);
        !s.fail.contains("set_solver")
    }

    fn set_stress_visualization(&self, _handle: SimHandle, _enabled: bool, _max_stress: f32) -> bool {
        let mut s = self.state();
        s.calls.push(Call::SetStressVis);
        !s.fail.contains("set_stress_visualization")
    }

    fn set_mesh_name(&self, _handle: SimHandle, name: &str) -> bool {
        let mut s = self.state();
        s.calls.push(Call::SetMeshName(name.to_owned()));
        !s.fail.contains("set_mesh_name")
    }

    fn set_body_transform(&self, _handle: SimHandle, pose: &Pose) -> bool {
        let mut s = self.state();
        s.calls.push(Call::SetBodyTransform(*pose));
        !s.fail.contains("set_body_transform")
    }

    fn set_attached_indices(&self, _handle: SimHandle, indices: &[u32]) -> bool {
        let mut s = self.state();
        s.calls.push(Call::SetAttachedIndices(indices.to_vec()));
        !s.fail.contains("set_attached_indices")
    }

    fn set_resource_path(&self, _handle: SimHandle, path: &str) -> bool {
        let mut s = self.state();
        s.calls.push(Call::SetResourcePath(path.to_owned()));
        !s.fail.contains("set_resource_path")
    }

    fn create_scene(&self, _handle: SimHandle) -> bool {
        let mut s = self.state();
        s.calls.push(Call::CreateScene);
        !s.fail.contains("create_scene")
    }

    fn add_collider(&self, _handle: SimHandle, shape: ColliderShape, pose: &Pose) -> i32 {
        let mut s = self.state();
        s.calls.push(Call::AddCollider(shape, *pose));
        if s.fail.contains("add_collider") {
            return -1;
        }
        let id = s.next_collider_id;
        s.next_collider_id += 1;
        id
    }

    fn update_collider(&self, _handle: SimHandle, id: i32, pose: &Pose) -> bool {
        let mut s = self.state();
        s.calls.push(Call::UpdateCollider(id, *pose));
        !s.fail.contains("update_collider")
    }

    fn remove_collider(&self, _handle: SimHandle, id: i32) -> bool {
        let mut s = self.state();
        s.calls.push(Call::RemoveCollider(id));
        !s.fail.contains("remove_collider")
    }
}
