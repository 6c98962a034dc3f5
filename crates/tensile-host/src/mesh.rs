use tensile_native::{EngineApi, SimHandle};

use crate::error::{HostError, HostResult};

/// Endpoints of the stress color gradient. Host-side rendering data, not an
/// engine parameter: changing the palette never triggers a boundary call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressPalette {
    pub low: [f32; 4],
    pub high: [f32; 4],
}

impl Default for StressPalette {
    #[inline]
    fn default() -> Self {
        Self {
            low: [0.18, 0.35, 0.92, 1.0],
            high: [0.95, 0.20, 0.12, 1.0],
        }
    }
}

/// Fixed-layout exchange buffers for one simulation handle generation.
///
/// Sized once at creation from engine-reported counts and never resized
/// afterwards; a reload creates a new handle and new buffers from scratch.
/// Per-tick refills go through a staging buffer so a failed read leaves the
/// previously published geometry intact instead of half-written.
pub struct MeshBuffers {
    vertex_count: usize,
    triangle_count: usize,

    positions: Vec<f32>,
    indices: Vec<u32>,
    uvs: Option<Vec<f32>>,
    stress: Vec<f32>,
    colors: Vec<[f32; 4]>,

    staging: Vec<f32>,
}

impl MeshBuffers {
    /// Queries counts and performs the first full read.
    ///
    /// Zero-sized geometry is `InvalidMeshData`: construction aborts and the
    /// caller is expected to keep simulating without a render mesh. Position
    /// and index reads must fill the exact creation-time element counts; a
    /// UV read failure falls back to a planar projection instead of failing
    /// the whole creation.
    pub fn create(api: &dyn EngineApi, handle: SimHandle, with_uvs: bool) -> HostResult<Self> {
        let vertices = api.vertex_count(handle);
        let triangles = api.triangle_count(handle);
        if vertices <= 0 || triangles <= 0 {
            return Err(HostError::InvalidMeshData {
                vertices,
                triangles,
            });
        }

        let vertex_count = vertices as usize;
        let triangle_count = triangles as usize;

        let mut positions = vec![0.0f32; vertex_count * 3];
        if api.read_vertex_positions(handle, &mut positions) != positions.len() as i32 {
            return Err(HostError::ReadFailure {
                what: "vertex positions",
            });
        }

        let mut indices = vec![0u32; triangle_count * 3];
        if api.read_triangle_indices(handle, &mut indices) != indices.len() as i32 {
            return Err(HostError::ReadFailure {
                what: "triangle indices",
            });
        }

        let uvs = with_uvs.then(|| read_or_project_uvs(api, handle, &positions));

        log::info!(
            "mesh: created buffers ({vertex_count} vertices, {triangle_count} triangles, uvs: {})",
            uvs.is_some()
        );

        Ok(Self {
            vertex_count,
            triangle_count,
            staging: vec![0.0f32; vertex_count * 3],
            positions,
            indices,
            uvs,
            stress: vec![0.0f32; vertex_count],
            colors: vec![[0.0f32; 4]; vertex_count],
        })
    }

    /// Refills vertex positions in place from the engine.
    ///
    /// The buffer sizes are fixed; a read that does not fill the exact
    /// creation-time count is a tick-scoped `ReadFailure` and the published
    /// positions keep their previous (stale) values.
    pub fn refill(&mut self, api: &dyn EngineApi, handle: SimHandle) -> HostResult<()> {
        let expected = self.positions.len() as i32;
        if api.read_vertex_positions(handle, &mut self.staging) != expected {
            return Err(HostError::ReadFailure {
                what: "vertex positions",
            });
        }
        self.positions.copy_from_slice(&self.staging);
        Ok(())
    }

    /// Reads per-vertex stress and recomputes the color gradient.
    ///
    /// Values are normalized to `[0, 1]` against `(max_stress - min)` where
    /// `min` is the observed minimum this tick; a collapsed range maps
    /// everything to the low end.
    pub fn update_stress_colors(
        &mut self,
        api: &dyn EngineApi,
        handle: SimHandle,
        max_stress: f32,
        palette: &StressPalette,
    ) -> HostResult<()> {
        let expected = self.vertex_count as i32;
        let staging = &mut self.staging[..self.vertex_count];
        if api.read_vertex_stress(handle, staging) != expected {
            return Err(HostError::ReadFailure {
                what: "vertex stress",
            });
        }
        self.stress.copy_from_slice(staging);

        let min = self.stress.iter().copied().fold(f32::INFINITY, f32::min);
        for (value, color) in self.stress.iter().zip(self.colors.iter_mut()) {
            let t = normalize_stress(*value, min, max_stress);
            *color = lerp_rgba(palette.low, palette.high, t);
        }
        Ok(())
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Flat `[x y z]` triples, one per vertex.
    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat vertex-index triples, one per triangle.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Flat `[u v]` pairs when UV read-back was requested.
    #[inline]
    pub fn uvs(&self) -> Option<&[f32]> {
        self.uvs.as_deref()
    }

    #[inline]
    pub fn stress(&self) -> &[f32] {
        &self.stress
    }

    #[inline]
    pub fn colors(&self) -> &[[f32; 4]] {
        &self.colors
    }
}

/// UV read with deterministic fallback: when the engine reports no UV data
/// or the read fails, each vertex gets a planar `(x, z)` projection of its
/// position instead.
fn read_or_project_uvs(api: &dyn EngineApi, handle: SimHandle, positions: &[f32]) -> Vec<f32> {
    let uv_count = api.uv_count(handle);
    if uv_count > 0 {
        let mut uvs = vec![0.0f32; uv_count as usize * 2];
        if api.read_vertex_uvs(handle, &mut uvs) == uvs.len() as i32 {
            return uvs;
        }
        log::warn!("mesh: uv read failed, falling back to planar projection");
    }

    positions
        .chunks_exact(3)
        .flat_map(|v| [v[0], v[2]])
        .collect()
}

#[inline]
fn normalize_stress(value: f32, min: f32, max: f32) -> f32 {
    let range = max - min;
    if range <= 0.0 {
        return 0.0;
    }
    ((value - min) / range).clamp(0.0, 1.0)
}

#[inline]
fn lerp_rgba(low: [f32; 4], high: [f32; 4], t: f32) -> [f32; 4] {
    [
        low[0] + (high[0] - low[0]) * t,
        low[1] + (high[1] - low[1]) * t,
        low[2] + (high[2] - low[2]) * t,
        low[3] + (high[3] - low[3]) * t,
    ]
}
