use crate::program::{ProgramError, ShaderProgram, ShaderStage, UniformKind, UniformSlot};
use crate::{MaterialAdapter, shaders};
use bytemuck::{Pod, Zeroable};

/// On-screen size in pixels of a star of base `size` at view depth `depth`.
pub fn star_point_size(size: f32, depth: f32, time: f32) -> f32 {
    size * (30.0 / depth.max(0.001)) * (3.0 + (time + 100.0).sin())
}

/// GPU layout of `StarParams`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct StarUniforms {
    pub time: f32,
    pub fade: f32,
    pub _pad: [f32; 2],
}

/// Twinkling billboard stars.
#[derive(Debug, Clone)]
pub struct StarfieldMaterial {
    program: ShaderProgram,
    uniforms: StarUniforms,
    speed: f32,
}

impl StarfieldMaterial {
    pub fn new(fade: bool) -> Result<Self, ProgramError> {
        let program = ShaderProgram::new(
            "starfield",
            ShaderStage::new(shaders::star_vertex(), "vs_stars"),
            ShaderStage::new(shaders::star_fragment(), "fs_stars"),
            vec![
                UniformSlot::new("time", UniformKind::Float),
                UniformSlot::new("fade", UniformKind::Float),
            ],
        )?;
        Ok(Self {
            program,
            uniforms: StarUniforms {
                time: 0.0,
                fade: if fade { 1.0 } else { 0.0 },
                _pad: [0.0; 2],
            },
            speed: 1.0,
        })
    }

    pub fn fade(&self) -> bool {
        self.uniforms.fade > 0.5
    }
}

impl MaterialAdapter for StarfieldMaterial {
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
        self.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn uniform_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.uniforms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_size_shrinks_with_depth() {
        let near = star_point_size(3.0, 10.0, 0.0);
        let far = star_point_size(3.0, 100.0, 0.0);
        assert!(near > far);
        assert!((near / far - 10.0).abs() < 1e-4);
    }

    #[test]
    fn twinkle_stays_within_two_to_four() {
        for i in 0..100 {
            let t = i as f32 * 0.3;
            let s = star_point_size(1.0, 30.0, t);
            assert!((2.0 - 1e-5..=4.0 + 1e-5).contains(&s));
        }
    }

    #[test]
    fn adapter_writes_time() {
        let mut stars = StarfieldMaterial::new(true).unwrap();
        assert!(stars.fade());
        stars.set_time(7.0);
        let block: &StarUniforms = bytemuck::from_bytes(stars.uniform_bytes());
        assert_eq!(block.time, 7.0);
        assert_eq!(block.fade, 1.0);
    }
}
