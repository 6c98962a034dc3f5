use tensile_native::Pose;

/// Parameter field groups, in engine apply order.
///
/// Diffing and application both operate at group granularity: when any field
/// in a group changes, exactly one engine call is issued for that group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    TimeStep,
    Material,
    Friction,
    Collision,
    Solver,
    StressVisualization,
    MeshName,
    BodyTransform,
    AttachedIndices,
    ResourcePath,
}

impl FieldGroup {
    /// The fixed order in which groups are pushed to the engine, both for
    /// the full apply after (re)initialization and for per-tick diffs.
    pub const APPLY_ORDER: [FieldGroup; 10] = [
        FieldGroup::TimeStep,
        FieldGroup::Material,
        FieldGroup::Friction,
        FieldGroup::Collision,
        FieldGroup::Solver,
        FieldGroup::StressVisualization,
        FieldGroup::MeshName,
        FieldGroup::BodyTransform,
        FieldGroup::AttachedIndices,
        FieldGroup::ResourcePath,
    ];

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            FieldGroup::TimeStep => "time step",
            FieldGroup::Material => "material",
            FieldGroup::Friction => "friction",
            FieldGroup::Collision => "collision",
            FieldGroup::Solver => "solver",
            FieldGroup::StressVisualization => "stress visualization",
            FieldGroup::MeshName => "mesh name",
            FieldGroup::BodyTransform => "body transform",
            FieldGroup::AttachedIndices => "attached indices",
            FieldGroup::ResourcePath => "resource path",
        }
    }
}

/// The full set of engine tunables as plain values.
///
/// All fields have concrete defaults. Collaborators (UI, config, callers)
/// may overwrite fields at any time; the host compares the live values
/// against the last-applied snapshot each tick and pushes only the groups
/// that differ.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSnapshot {
    pub time_step: f32,
    pub substeps: u32,

    pub density: f32,
    pub stiffness: f32,
    pub damping: f32,

    pub dynamic_friction: f32,
    pub static_friction: f32,

    pub collision_margin: f32,
    pub self_collision: bool,

    pub solver_iterations: u32,
    pub solver_tolerance: f32,

    pub stress_enabled: bool,
    pub max_stress: f32,

    pub mesh_name: String,
    pub body_transform: Pose,

    /// Vertex indices pinned to the body transform. Empty means "attach
    /// nothing", which is a deliberate no-op rather than an error.
    pub attached_indices: Vec<u32>,

    pub resource_path: String,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 60.0,
            substeps: 4,

            density: 1000.0,
            stiffness: 0.9,
            damping: 0.01,

            dynamic_friction: 0.4,
            static_friction: 0.5,

            collision_margin: 0.01,
            self_collision: false,

            solver_iterations: 10,
            solver_tolerance: 1.0e-4,

            stress_enabled: false,
            max_stress: 1.0,

            mesh_name: String::new(),
            body_transform: Pose::identity(),

            attached_indices: Vec::new(),

            resource_path: String::new(),
        }
    }
}

impl ParameterSnapshot {
    /// Whether any field of `group` differs between `self` and `applied`.
    pub fn group_differs(&self, applied: &Self, group: FieldGroup) -> bool {
        match group {
            FieldGroup::TimeStep => {
                self.time_step != applied.time_step || self.substeps != applied.substeps
            }
            FieldGroup::Material => {
                self.density != applied.density
                    || self.stiffness != applied.stiffness
                    || self.damping != applied.damping
            }
            FieldGroup::Friction => {
                self.dynamic_friction != applied.dynamic_friction
                    || self.static_friction != applied.static_friction
            }
            FieldGroup::Collision => {
                self.collision_margin != applied.collision_margin
                    || self.self_collision != applied.self_collision
            }
            FieldGroup::Solver => {
                self.solver_iterations != applied.solver_iterations
                    || self.solver_tolerance != applied.solver_tolerance
            }
            FieldGroup::StressVisualization => {
                self.stress_enabled != applied.stress_enabled
                    || self.max_stress != applied.max_stress
            }
            FieldGroup::MeshName => self.mesh_name != applied.mesh_name,
            FieldGroup::BodyTransform => self.body_transform != applied.body_transform,
            FieldGroup::AttachedIndices => self.attached_indices != applied.attached_indices,
            FieldGroup::ResourcePath => self.resource_path != applied.resource_path,
        }
    }

    /// Dirty groups relative to `applied`, in apply order.
    pub fn changed_groups(&self, applied: &Self) -> Vec<FieldGroup> {
        FieldGroup::APPLY_ORDER
            .iter()
            .copied()
            .filter(|g| self.group_differs(applied, *g))
            .collect()
    }

    /// Copies one group's fields from `src`, marking it clean relative to
    /// `src` without touching the other groups.
    pub fn copy_group_from(&mut self, src: &Self, group: FieldGroup) {
        match group {
            FieldGroup::TimeStep => {
                self.time_step = src.time_step;
                self.substeps = src.substeps;
            }
            FieldGroup::Material => {
                self.density = src.density;
                self.stiffness = src.stiffness;
                self.damping = src.damping;
            }
            FieldGroup::Friction => {
                self.dynamic_friction = src.dynamic_friction;
                self.static_friction = src.static_friction;
            }
            FieldGroup::Collision => {
                self.collision_margin = src.collision_margin;
                self.self_collision = src.self_collision;
            }
            FieldGroup::Solver => {
                self.solver_iterations = src.solver_iterations;
                self.solver_tolerance = src.solver_tolerance;
            }
            FieldGroup::StressVisualization => {
                self.stress_enabled = src.stress_enabled;
                self.max_stress = src.max_stress;
            }
            FieldGroup::MeshName => self.mesh_name = src.mesh_name.clone(),
            FieldGroup::BodyTransform => self.body_transform = src.body_transform,
            FieldGroup::AttachedIndices => {
                self.attached_indices = src.attached_indices.clone();
            }
            FieldGroup::ResourcePath => self.resource_path = src.resource_path.clone(),
        }
    }
}
