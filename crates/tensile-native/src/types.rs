/// Opaque simulation handle returned by the engine's initialize entry point.
///
/// `0` is the engine's "no simulation" sentinel. Non-zero values are unique
/// only within one module generation; after a reload a stored handle is
/// meaningless and must not be passed back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimHandle(pub i32);

impl SimHandle {
    pub const NONE: SimHandle = SimHandle(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn raw(self) -> i32 {
        self.0
    }
}

impl Default for SimHandle {
    #[inline]
    fn default() -> Self {
        Self::NONE
    }
}

/// Collider shape kinds understood by the engine. Closed set; the wire code
/// is part of the ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderShape {
    Plane,
    Sphere,
    Cube,
}

impl ColliderShape {
    #[inline]
    pub fn wire_code(self) -> i32 {
        match self {
            ColliderShape::Plane => 0,
            ColliderShape::Sphere => 1,
            ColliderShape::Cube => 2,
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            ColliderShape::Plane => "plane",
            ColliderShape::Sphere => "sphere",
            ColliderShape::Cube => "cube",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

/// Position + rotation + non-uniform scale, in host space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Pose {
    #[inline]
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Host-to-engine handedness flip: the engine's coordinate space mirrors
    /// the host's across the YZ plane. Position X and the quaternion Y/Z
    /// components are negated; scale is unchanged.
    ///
    /// This is part of the wire contract. Every pose that crosses the
    /// boundary (collider registration, collider update, body transform)
    /// goes through this transform exactly once.
    #[inline]
    pub fn mirrored(&self) -> Pose {
        Pose {
            position: Vec3::new(-self.position.x, self.position.y, self.position.z),
            rotation: Quat::new(self.rotation.x, -self.rotation.y, -self.rotation.z, self.rotation.w),
            scale: self.scale,
        }
    }

    /// Wire layout for pose-accepting entry points: `[px py pz qx qy qz qw sx sy sz]`.
    #[inline]
    pub fn to_wire(&self) -> [f32; 10] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
            self.rotation.w,
            self.scale.x,
            self.scale.y,
            self.scale.z,
        ]
    }
}

impl Default for Pose {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}
