use crate::program::{ProgramError, ShaderProgram, ShaderStage, UniformKind, UniformSlot};
use crate::{MaterialAdapter, shaders};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

/// Seconds before the ground sketch starts fading in.
pub const RIPPLE_DELAY: f32 = 4.0;
/// Seconds the fade-in takes once it starts.
pub const RIPPLE_DURATION: f32 = 8.0;
/// Distance from the origin at which the sketch is fully transparent.
pub const RIPPLE_FADE_RADIUS: f32 = 512.0;

/// Vertical displacement added to a ground vertex at `(x, y)`.
pub fn ripple_height(x: f32, y: f32, time: f32) -> f32 {
    let s1 = ((x + y) * 0.2 + time * 0.5).sin();
    let s2 = ((x - y) * 0.4 + time * 2.0).sin();
    let s3 = ((x + y) * -0.6 + time).sin();
    s1 * 5.0 + s2 * 2.0 + s3 * 4.0
}

/// Opacity of the sketch at local position `position` and `time`.
///
/// Zero until [`RIPPLE_DELAY`], ramps linearly over [`RIPPLE_DURATION`],
/// then holds. Scaled by distance from the origin in the plane.
pub fn ripple_opacity(position: Vec2, time: f32) -> f32 {
    let now = ((time - RIPPLE_DELAY) / RIPPLE_DURATION).clamp(0.0, 1.0);
    let fade = 1.0 - position.length() / RIPPLE_FADE_RADIUS;
    (fade * 0.6 * now).max(0.0)
}

/// Sector-based HSV to RGB conversion; hue wraps, all inputs in `[0, 1]`.
pub fn hsv_to_rgb(hsv: Vec3) -> Vec3 {
    let k = [1.0, 2.0 / 3.0, 1.0 / 3.0];
    let channel = |offset: f32| {
        let h = hsv.x + offset;
        let p = ((h - h.floor()) * 6.0 - 3.0).abs();
        let c = (p - 1.0).clamp(0.0, 1.0);
        hsv.z * (1.0 + (c - 1.0) * hsv.y)
    };
    Vec3::new(channel(k[0]), channel(k[1]), channel(k[2]))
}

/// Colour of the sketch at local `position` and `time`; hue drifts with time.
pub fn ripple_color(position: Vec3, time: f32) -> Vec3 {
    let n = position.normalize_or_zero();
    let hue = 0.5 + (n.x + n.y + n.x) / 40.0 + time * 0.1;
    hsv_to_rgb(Vec3::new(hue, 0.4, 1.0))
}

/// GPU layout of `GroundParams`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GroundUniforms {
    pub model: [[f32; 4]; 4],
    pub time: f32,
    pub _pad: [f32; 3],
}

/// Rippling, colour-shifting ground sketch.
///
/// The program has no speed input; speed is kept on the adapter so the
/// update step can treat every material alike.
#[derive(Debug, Clone)]
pub struct GroundSketchMaterial {
    program: ShaderProgram,
    uniforms: GroundUniforms,
    speed: f32,
}

impl GroundSketchMaterial {
    /// `model` places the sketch plane (authored in XY, displaced along Z)
    /// into the world.
    pub fn new(model: Mat4) -> Result<Self, ProgramError> {
        let program = ShaderProgram::new(
            "ground_sketch",
            ShaderStage::new(shaders::ground_vertex(), "vs_ground"),
            ShaderStage::new(shaders::ground_fragment(), "fs_ground"),
            vec![
                UniformSlot::new("model", UniformKind::Mat4),
                UniformSlot::new("time", UniformKind::Float),
            ],
        )?;
        Ok(Self {
            program,
            uniforms: GroundUniforms {
                model: model.to_cols_array_2d(),
                time: 0.0,
                _pad: [0.0; 3],
            },
            speed: 1.0,
        })
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.uniforms.model)
    }

    pub fn opacity_at(&self, position: Vec2) -> f32 {
        ripple_opacity(position, self.uniforms.time)
    }

    pub fn height_at(&self, x: f32, y: f32) -> f32 {
        ripple_height(x, y, self.uniforms.time)
    }
}

impl MaterialAdapter for GroundSketchMaterial {
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
