use std::sync::Arc;

use tensile_native::{EngineApi, SimHandle};

use crate::colliders::{ColliderProxy, ColliderRegistry};
use crate::error::{HostError, HostResult};
use crate::mesh::{MeshBuffers, StressPalette};
use crate::params::{FieldGroup, ParameterSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Uninitialized,
    Ready,
    /// Terminal failure state: the engine refused to produce a handle, or a
    /// reload discarded the old module before the new one came up. No engine
    /// calls are issued from here and the host does not retry on its own.
    Disabled,
    Released,
}

/// Owns the simulation handle, the applied parameter snapshot, the exchange
/// buffers, and the collider registry, and drives the per-tick protocol:
/// diff-and-sync parameters, reconcile colliders, step, read back.
///
/// All methods must be called from the host tick thread. Reload entry points
/// are only ever invoked from a drained [`MainThreadQueue`](crate::MainThreadQueue)
/// task, never concurrently with a tick.
pub struct SimulationHost {
    api: Box<dyn EngineApi>,
    state: HostState,
    handle: SimHandle,

    ground_height: f32,
    with_uvs: bool,

    /// Live values, externally settable at any time.
    params: ParameterSnapshot,
    /// What the engine last accepted, group by group.
    applied: ParameterSnapshot,

    palette: StressPalette,
    mesh: Option<MeshBuffers>,
    colliders: ColliderRegistry,

    /// Length of the current run of consecutive step failures. Step failures
    /// never disable the host; the streak is exposed so callers can apply
    /// their own policy, and logging is rate-limited against it.
    step_failures: u64,
}

impl SimulationHost {
    pub fn new(api: Box<dyn EngineApi>, ground_height: f32, with_uvs: bool) -> Self {
        Self {
            api,
            state: HostState::Uninitialized,
            handle: SimHandle::NONE,
            ground_height,
            with_uvs,
            params: ParameterSnapshot::default(),
            applied: ParameterSnapshot::default(),
            palette: StressPalette::default(),
            mesh: None,
            colliders: ColliderRegistry::new(),
            step_failures: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> HostState {
        self.state
    }

    #[inline]
    pub fn handle(&self) -> SimHandle {
        self.handle
    }

    #[inline]
    pub fn params(&self) -> &ParameterSnapshot {
        &self.params
    }

    /// The external configuration surface: UI, config files, or callers
    /// write here; the host pushes dirty groups on its next tick.
    #[inline]
    pub fn params_mut(&mut self) -> &mut ParameterSnapshot {
        &mut self.params
    }

    #[inline]
    pub fn palette(&self) -> &StressPalette {
        &self.palette
    }

    #[inline]
    pub fn set_palette(&mut self, palette: StressPalette) {
        self.palette = palette;
    }

    #[inline]
    pub fn mesh(&self) -> Option<&MeshBuffers> {
        self.mesh.as_ref()
    }

    #[inline]
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    #[inline]
    pub fn step_failure_streak(&self) -> u64 {
        self.step_failures
    }

    /// First bring-up against a freshly bound engine.
    pub fn initialize(&mut self, live: &[Arc<ColliderProxy>]) -> HostResult<()> {
        if self.state != HostState::Uninitialized {
            log::warn!("host: initialize ignored in state {:?}", self.state);
            return Ok(());
        }
        self.bring_up(live, false)
    }

    /// Resynchronization after a module reload.
    ///
    /// The previous module instance is gone, so the old handle is discarded
    /// WITHOUT a release call and every tracked collider is re-registered
    /// for a fresh id. On failure the host lands in [`HostState::Disabled`]:
    /// there is no old engine to fall back to.
    pub fn on_reload(&mut self, api: Box<dyn EngineApi>, live: &[Arc<ColliderProxy>]) -> HostResult<()> {
        log::info!("host: module reloaded, replaying full state");
        self.api = api;
        self.handle = SimHandle::NONE;
        self.mesh = None;
        self.step_failures = 0;
        self.state = HostState::Uninitialized;
        self.bring_up(live, true)
    }

    fn bring_up(&mut self, live: &[Arc<ColliderProxy>], rebind: bool) -> HostResult<()> {
        self.handle = self.api.initialize(self.ground_height);
        if self.handle.is_none() {
            log::error!("host: engine initialize failed (returned the null handle); host disabled");
            self.state = HostState::Disabled;
            return Err(HostError::InitializationFailure);
        }

        for group in FieldGroup::APPLY_ORDER {
            if let Err(e) = self.apply_group(group) {
                log::warn!("host: initial apply: {e}");
            }
        }
        if !self.api.create_scene(self.handle) {
            log::error!("host: create_scene reported failure");
        }
        self.applied = self.params.clone();

        match MeshBuffers::create(&*self.api, self.handle, self.with_uvs) {
            Ok(mesh) => self.mesh = Some(mesh),
            Err(e @ HostError::InvalidMeshData { .. }) => {
                // Fatal for rendering only; stepping continues without buffers.
                log::error!("host: {e}");
                self.mesh = None;
            }
            Err(e) => {
                log::error!("host: mesh creation failed: {e}");
                self.mesh = None;
            }
        }

        if rebind {
            self.colliders.rebind(&*self.api, self.handle);
        }
        self.colliders.reconcile(&*self.api, self.handle, live);

        self.state = HostState::Ready;
        log::info!(
            "host: ready (handle {}, {} colliders, mesh: {})",
            self.handle.raw(),
            self.colliders.len(),
            self.mesh.is_some()
        );
        Ok(())
    }

    /// One steady-state tick: parameter diff, collider reconciliation, step,
    /// read-back. Per-tick failures are absorbed and logged; they never stop
    /// the loop.
    pub fn tick(&mut self, live: &[Arc<ColliderProxy>]) {
        if self.state != HostState::Ready {
            return;
        }

        self.sync_parameters();
        self.colliders.reconcile(&*self.api, self.handle, live);

        if !self.api.step(self.handle) {
            self.step_failures += 1;
            // First failure of a streak is a warning; the rest stay quiet so
            // a persistent failure does not flood the log every tick.
            if self.step_failures == 1 {
                log::warn!("host: engine step failed, skipping read-back");
            } else {
                log::debug!(
                    "host: engine step failed ({} consecutive), skipping read-back",
                    self.step_failures
                );
            }
            return;
        }
        if self.step_failures > 0 {
            log::info!(
                "host: engine step recovered after {} failed ticks",
                self.step_failures
            );
            self.step_failures = 0;
        }

        self.read_back();
    }

    /// Registers a collider outside the per-tick scan.
    pub fn add_collider(&mut self, proxy: &Arc<ColliderProxy>) -> bool {
        if self.state != HostState::Ready {
            return false;
        }
        self.colliders.add(&*self.api, self.handle, proxy)
    }

    /// Unregisters a collider outside the per-tick scan.
    pub fn remove_collider(&mut self, proxy: &Arc<ColliderProxy>) {
        if self.state != HostState::Ready {
            return;
        }
        self.colliders.remove(&*self.api, self.handle, proxy);
    }

    /// Explicit teardown. Releases the engine-side simulation and clears the
    /// registry without further native calls.
    pub fn release(&mut self) {
        if self.state == HostState::Released {
            return;
        }
        if self.state == HostState::Ready && !self.handle.is_none() {
            if !self.api.release(self.handle) {
                log::warn!("host: engine release reported failure");
            }
        }
        self.handle = SimHandle::NONE;
        self.colliders.reset();
        self.mesh = None;
        self.state = HostState::Released;
        log::info!("host: released");
    }

    /// Moves to the terminal disabled state without touching the engine.
    /// Used when the module backing the current entry points is already
    /// gone (e.g. a reload that failed after unload).
    pub(crate) fn disable(&mut self, reason: &str) {
        log::error!("host: disabled: {reason}");
        self.handle = SimHandle::NONE;
        self.colliders.reset();
        self.state = HostState::Disabled;
    }

    fn sync_parameters(&mut self) {
        for group in self.params.changed_groups(&self.applied) {
            match self.apply_group(group) {
                Ok(()) => self.applied.copy_group_from(&self.params, group),
                // Applied copy stays stale, so the group is retried next tick.
                Err(e) => log::warn!("host: {e}, retrying next tick"),
            }
        }
    }

    fn apply_group(&self, group: FieldGroup) -> HostResult<()> {
        let p = &self.params;
        let h = self.handle;
        let api = &*self.api;
        let accepted = match group {
            FieldGroup::TimeStep => api.set_time_step(h, p.time_step, p.substeps as i32),
            FieldGroup::Material => api.set_material(h, p.density, p.stiffness, p.damping),
            FieldGroup::Friction => api.set_friction(h, p.dynamic_friction, p.static_friction),
            FieldGroup::Collision => api.set_collision(h, p.collision_margin, p.self_collision),
            FieldGroup::Solver => {
                api.set_solver(h, p.solver_iterations as i32, p.solver_tolerance)
            }
            FieldGroup::StressVisualization => {
                api.set_stress_visualization(h, p.stress_enabled, p.max_stress)
            }
            FieldGroup::MeshName => api.set_mesh_name(h, &p.mesh_name),
            FieldGroup::BodyTransform => {
                api.set_body_transform(h, &p.body_transform.mirrored())
            }
            FieldGroup::AttachedIndices => {
                // An empty attachment specification is a deliberate no-op.
                if p.attached_indices.is_empty() {
                    true
                } else {
                    api.set_attached_indices(h, &p.attached_indices)
                }
            }
            FieldGroup::ResourcePath => api.set_resource_path(h, &p.resource_path),
        };
        if accepted {
            Ok(())
        } else {
            Err(HostError::WriteFailure { what: group.name() })
        }
    }

    fn read_back(&mut self) {
        let Some(mesh) = self.mesh.as_mut() else {
            return;
        };
        if let Err(e) = mesh.refill(&*self.api, self.handle) {
            log::debug!("host: geometry update skipped: {e}");
            return;
        }
        if self.params.stress_enabled {
            if let Err(e) =
                mesh.update_stress_colors(&*self.api, self.handle, self.params.max_stress, &self.palette)
            {
                log::debug!("host: stress recolor skipped: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, ScriptedEngine};
    use tensile_native::{ColliderShape, Pose, Vec3};

    fn ready_host(engine: &ScriptedEngine) -> SimulationHost {
        let mut host = SimulationHost::new(Box::new(engine.clone()), 0.0, false);
        host.initialize(&[]).unwrap();
        engine.clear_calls();
        host
    }

    #[test]
    fn initialize_failure_disables_the_host() {
        let engine = ScriptedEngine::new();
        engine.state().next_handle = 0;

        let mut host = SimulationHost::new(Box::new(engine.clone()), 0.0, false);
        match host.initialize(&[]) {
            Err(HostError::InitializationFailure) => {}
            other => panic!("expected InitializationFailure, got {:?}", other.map(|_| ())),
        }
        assert_eq!(host.state(), HostState::Disabled);
        assert_eq!(engine.calls(), vec![Call::Initialize]);

        // No further entry points this session: ticks are inert.
        host.tick(&[]);
        host.tick(&[]);
        assert_eq!(engine.calls(), vec![Call::Initialize]);
    }

    #[test]
    fn initial_apply_runs_in_fixed_order_and_ends_with_create_scene() {
        let engine = ScriptedEngine::new();
        let mut host = SimulationHost::new(Box::new(engine.clone()), 0.0, false);
        host.params_mut().attached_indices = vec![0, 3];
        host.initialize(&[]).unwrap();

        let names: Vec<&'static str> = engine
            .calls()
            .iter()
            .map(|c| c.name())
            .take_while(|n| *n != "vertex_count")
            .collect();
        assert_eq!(
            names,
            vec![
                "initialize",
                "set_time_step",
                "set_material",
                "set_friction",
                "set_collision",
                "set_solver",
                "set_stress_visualization",
                "set_mesh_name",
                "set_body_transform",
                "set_attached_indices",
                "set_resource_path",
                "create_scene",
            ]
        );
    }

    #[test]
    fn empty_attachment_list_issues_no_call() {
        let engine = ScriptedEngine::new();
        let mut host = SimulationHost::new(Box::new(engine.clone()), 0.0, false);
        host.initialize(&[]).unwrap();
        assert_eq!(engine.count_calls("set_attached_indices"), 0);
    }

    #[test]
    fn unchanged_parameters_issue_no_calls() {
        let engine = ScriptedEngine::new();
        let mut host = ready_host(&engine);

        host.tick(&[]);

        let set_calls = engine
            .calls()
            .iter()
            .filter(|c| c.name().starts_with("set_"))
            .count();
        assert_eq!(set_calls, 0);
    }

    #[test]
    fn one_changed_field_issues_exactly_one_group_call() {
        let engine = ScriptedEngine::new();
        let mut host = ready_host(&engine);

        host.params_mut().stiffness = 0.42;
        host.tick(&[]);

        assert_eq!(engine.count_calls("set_material"), 1);
        let other_sets = engine
            .calls()
            .iter()
            .filter(|c| c.name().starts_with("set_") && c.name() != "set_material")
            .count();
        assert_eq!(other_sets, 0);

        // Clean again: no repeat next tick.
        host.tick(&[]);
        assert_eq!(engine.count_calls("set_material"), 1);
    }

    #[test]
    fn failed_parameter_write_is_retried_next_tick() {
        let engine = ScriptedEngine::new();
        let mut host = ready_host(&engine);

        engine.fail("set_friction");
        host.params_mut().dynamic_friction = 0.8;
        host.tick(&[]);
        assert_eq!(engine.count_calls("set_friction"), 1);

        engine.recover("set_friction");
        host.tick(&[]);
        assert_eq!(engine.count_calls("set_friction"), 2);

        host.tick(&[]);
        assert_eq!(engine.count_calls("set_friction"), 2);
    }

    #[test]
    fn step_failure_skips_read_back_but_not_the_loop() {
        let engine = ScriptedEngine::new();
        let mut host = ready_host(&engine);
        assert!(host.mesh().is_some());

        engine.fail("step");
        host.tick(&[]);
        host.tick(&[]);
        assert_eq!(engine.count_calls("read_vertex_positions"), 0);
        assert_eq!(host.step_failure_streak(), 2);
        assert_eq!(host.state(), HostState::Ready);

        engine.recover("step");
        host.tick(&[]);
        assert_eq!(engine.count_calls("read_vertex_positions"), 1);
        assert_eq!(host.step_failure_streak(), 0);
    }

    #[test]
    fn zero_vertex_mesh_keeps_the_simulation_stepping() {
        let engine = ScriptedEngine::new();
        engine.state().vertex_count = 0;

        let mut host = SimulationHost::new(Box::new(engine.clone()), 0.0, false);
        host.initialize(&[]).unwrap();
        assert_eq!(host.state(), HostState::Ready);
        assert!(host.mesh().is_none());

        engine.clear_calls();
        host.tick(&[]);
        assert_eq!(engine.count_calls("step"), 1);
        assert_eq!(engine.count_calls("read_vertex_positions"), 0);
    }

    #[test]
    fn reload_replays_state_against_the_new_module() {
        let engine = ScriptedEngine::new();
        let proxies = vec![
            ColliderProxy::new(ColliderShape::Plane, Pose::identity()),
            ColliderProxy::new(
                ColliderShape::Sphere,
                Pose {
                    position: Vec3::new(0.0, 1.0, 0.0),
                    ..Pose::identity()
                },
            ),
        ];

        let mut host = SimulationHost::new(Box::new(engine.clone()), 0.0, false);
        host.params_mut().mesh_name = "torus".to_owned();
        host.initialize(&proxies).unwrap();
        let old_ids = (proxies[0].native_id(), proxies[1].native_id());

        let fresh = ScriptedEngine::new();
        fresh.state().next_handle = 7;
        fresh.state().next_collider_id = 50;
        host.on_reload(Box::new(fresh.clone()), &[]).unwrap();

        assert_eq!(host.state(), HostState::Ready);
        assert_eq!(host.handle(), SimHandle(7));
        // The old handle is discarded without a release call; its module is gone.
        assert_eq!(engine.count_calls("release"), 0);
        // Full snapshot replayed, including the changed mesh name.
        assert!(fresh.calls().contains(&Call::SetMeshName("torus".to_owned())));
        // Every tracked proxy re-registered with a fresh id, count unchanged.
        assert_eq!(host.collider_count(), 2);
        assert!(proxies[0].native_id() >= 50);
        assert!(proxies[1].native_id() >= 50);
        assert_ne!(proxies[0].native_id(), old_ids.0);
        assert_ne!(proxies[1].native_id(), old_ids.1);
    }

    #[test]
    fn reload_into_refusing_engine_disables_the_host() {
        let engine = ScriptedEngine::new();
        let mut host = SimulationHost::new(Box::new(engine.clone()), 0.0, false);
        host.initialize(&[]).unwrap();

        let fresh = ScriptedEngine::new();
        fresh.state().next_handle = 0;
        assert!(host.on_reload(Box::new(fresh.clone()), &[]).is_err());
        assert_eq!(host.state(), HostState::Disabled);

        host.tick(&[]);
        assert_eq!(fresh.calls(), vec![Call::Initialize]);
    }

    #[test]
    fn release_tears_down_once() {
        let engine = ScriptedEngine::new();
        let proxy = ColliderProxy::new(ColliderShape::Cube, Pose::identity());
        let mut host = SimulationHost::new(Box::new(engine.clone()), 0.0, false);
        host.initialize(std::slice::from_ref(&proxy)).unwrap();

        host.release();
        host.release();

        assert_eq!(host.state(), HostState::Released);
        assert_eq!(host.handle(), SimHandle::NONE);
        assert_eq!(host.collider_count(), 0);
        assert_eq!(engine.count_calls("release"), 1);
        // Registry teardown is host-side only; the engine is going away.
        assert_eq!(engine.count_calls("remove_collider"), 0);

        host.tick(&[]);
        assert_eq!(engine.count_calls("step"), 0);
    }

    #[test]
    fn direct_add_and_remove_work_between_ticks() {
        let engine = ScriptedEngine::new();
        let mut host = ready_host(&engine);
        let proxy = ColliderProxy::new(ColliderShape::Sphere, Pose::identity());

        assert!(host.add_collider(&proxy));
        assert!(proxy.native_id() >= 0);
        assert_eq!(host.collider_count(), 1);

        host.remove_collider(&proxy);
        assert_eq!(host.collider_count(), 0);
        assert_eq!(engine.count_calls("remove_collider"), 1);
    }
}
