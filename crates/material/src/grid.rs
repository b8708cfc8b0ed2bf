use crate::program::{ProgramError, ShaderProgram, ShaderStage, UniformKind, UniformSlot};
use crate::{MaterialAdapter, shaders};
use bytemuck::{Pod, Zeroable};

/// GPU layout of `GridParams`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GridUniforms {
    pub limits: [f32; 2],
    pub time: f32,
    pub speed: f32,
}

/// Scrolling grid-line material.
///
/// Vertices flagged moveable have their depth wrapped into `[lo, hi)` as
/// time advances, so the cross lines appear to stream towards the viewer
/// forever while the lines running along the road stay put.
#[derive(Debug, Clone)]
pub struct GridMaterial {
    program: ShaderProgram,
    uniforms: GridUniforms,
}

impl GridMaterial {
    /// Build a grid material wrapping depth within `[lo, hi)`.
    ///
    /// Fails when the interval is empty, inverted or non-finite, since the
    /// wrap would divide by a zero or meaningless length.
    pub fn new(lo: f32, hi: f32, speed: f32) -> Result<Self, ProgramError> {
        if !lo.is_finite() || !hi.is_finite() || hi <= lo {
            return Err(ProgramError::DegenerateWrapInterval { lo, hi });
        }
        let program = ShaderProgram::new(
            "grid",
            ShaderStage::new(shaders::grid_vertex(), "vs_grid"),
            ShaderStage::new(shaders::grid_fragment(), "fs_grid"),
            vec![
                UniformSlot::new("limits", UniformKind::Vec2),
                UniformSlot::new("time", UniformKind::Float),
                UniformSlot::new("speed", UniformKind::Float),
            ],
        )?;
        Ok(Self {
            program,
            uniforms: GridUniforms {
                limits: [lo, hi],
                time: 0.0,
                speed,
            },
        })
    }

    pub fn limits(&self) -> (f32, f32) {
        (self.uniforms.limits[0], self.uniforms.limits[1])
    }

    /// Depth of a vertex at the material's current time, as the vertex
    /// stage computes it.
    pub fn vertex_z(&self, z: f32, moveable: bool) -> f32 {
        self.vertex_z_at(z, moveable, self.uniforms.time)
    }

    /// Depth of a vertex at an arbitrary `time`.
    pub fn vertex_z_at(&self, z: f32, moveable: bool, time: f32) -> f32 {
        if !moveable {
            return z;
        }
        let (lo, hi) = self.limits();
        let len = hi - lo;
        let dist = self.uniforms.speed * time;
        let offset = ((z + dist) - lo).rem_euclid(len);
        // A tiny negative remainder rounds up to exactly `len`.
        let offset = if offset >= len { 0.0 } else { offset };
        offset + lo
    }
}

impl MaterialAdapter for GridMaterial {
    fn program(&self) -> &ShaderProgram {
        &self.program
    }

    fn time(&self) -> f32 {
        self.uniforms.time
    }

    fn set_time(&mut self, time: f32) {
        self.uniforms.time = time;
    }

    fn speed(&self) -> f32 {
        self.uniforms.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.uniforms.speed = speed;
    }

    fn uniform_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.uniforms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> GridMaterial {
        GridMaterial::new(-100.0, 100.0, 1.0).unwrap()
    }

    #[test]
    fn degenerate_interval_rejected() {
        assert_eq!(
            GridMaterial::new(5.0, 5.0, 1.0).unwrap_err(),
            ProgramError::DegenerateWrapInterval { lo: 5.0, hi: 5.0 }
        );
        assert!(GridMaterial::new(10.0, -10.0, 1.0).is_err());
        assert!(GridMaterial::new(f32::NAN, 10.0, 1.0).is_err());
    }

    #[test]
    fn moveable_vertex_at_time_zero_is_unchanged() {
        let grid = material();
        assert_eq!(grid.vertex_z_at(50.0, true, 0.0), 50.0);
    }

    #[test]
    fn moveable_vertex_wraps_to_lower_limit() {
        // ((50 + 50) - (-100)) mod 200 + (-100) = -100
        let grid = material();
        assert_eq!(grid.vertex_z_at(50.0, true, 50.0), -100.0);
        assert_eq!(grid.vertex_z_at(50.0, true, 25.0), 75.0);
    }

    #[test]
    fn static_vertex_passes_through() {
        let grid = material();
        for t in [0.0, 1.5, 50.0, 1234.0] {
            assert_eq!(grid.vertex_z_at(-37.0, false, t), -37.0);
        }
    }

    #[test]
    fn moveable_vertices_stay_within_limits() {
        let grid = GridMaterial::new(-100.0, 100.0, 3.7).unwrap();
        for i in 0..=20 {
            let z = -100.0 + i as f32 * 10.0;
            for step in 0..2000 {
                let t = step as f32 * 0.37;
                let out = grid.vertex_z_at(z, true, t);
                assert!((-100.0..100.0).contains(&out), "z={z} t={t} -> {out}");
            }
        }
    }

    #[test]
    fn wrap_is_periodic() {
        let grid = GridMaterial::new(-100.0, 100.0, 2.0).unwrap();
        let period = 200.0 / 2.0;
        for t in [0.25, 3.5, 17.75, 40.0] {
            for z in [-95.0, -10.0, 0.0, 42.5] {
                let a = grid.vertex_z_at(z, true, t);
                let b = grid.vertex_z_at(z, true, t + period);
                assert!((a - b).abs() < 1e-3, "z={z} t={t}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn adapter_forwards_to_uniforms() {
        let mut grid = material();
        grid.set_time(2.5);
        grid.set_speed(4.0);
        assert_eq!(grid.time(), 2.5);
        assert_eq!(grid.speed(), 4.0);
        let block: &GridUniforms = bytemuck::from_bytes(grid.uniform_bytes());
        assert_eq!(block.time, 2.5);
        assert_eq!(block.speed, 4.0);
        assert_eq!(block.limits, [-100.0, 100.0]);
        assert_eq!(grid.vertex_z(0.0, true), 10.0);
    }

    #[test]
    fn program_declares_grid_uniforms() {
        let grid = material();
        for name in ["time", "speed", "limits"] {
            assert!(grid.program().has_uniform(name));
        }
        assert_eq!(std::mem::size_of::<GridUniforms>(), 16);
    }
}
