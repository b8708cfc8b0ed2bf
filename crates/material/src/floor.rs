use crate::program::{ProgramError, ShaderProgram, ShaderStage, UniformKind, UniformSlot};
use crate::{MaterialAdapter, shaders};
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Cell size of the overlay lines in world units.
const LINE_CELL: f32 = 2.0;

/// Screen-space derivative stand-in for evaluating the overlay off the GPU.
const FIXED_LINE_GRADIENT: f32 = 0.05;

/// GPU layout of `FloorParams`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FloorUniforms {
    pub color: [f32; 4],
    pub road_color: [f32; 4],
    pub time: f32,
    pub speed: f32,
    /// 1.0 draws the scrolling line overlay, 0.0 draws the plain lit floor.
    pub line_overlay: f32,
    pub line_width: f32,
}

/// Flat-lit floor with an optional anti-aliased scrolling line overlay.
#[derive(Debug, Clone)]
pub struct FloorMaterial {
    program: ShaderProgram,
    uniforms: FloorUniforms,
}

impl FloorMaterial {
    /// `color` is linear rgb.
    pub fn new(color: [f32; 3], speed: f32, line_overlay: bool) -> Result<Self, ProgramError> {
        let program = ShaderProgram::new(
            "floor",
            ShaderStage::new(shaders::floor_vertex(), "vs_floor"),
            ShaderStage::new(shaders::floor_fragment(), "fs_floor"),
            vec![
                UniformSlot::new("color", UniformKind::Vec4),
                UniformSlot::new("road_color", UniformKind::Vec4),
                UniformSlot::new("time", UniformKind::Float),
                UniformSlot::new("speed", UniformKind::Float),
            ],
        )?;
        Ok(Self {
            program,
            uniforms: FloorUniforms {
                color: [color[0], color[1], color[2], 1.0],
                road_color: [0.0, 0.75, 0.0, 1.0],
                time: 0.0,
                speed,
                line_overlay: if line_overlay { 1.0 } else { 0.0 },
                line_width: 1.0,
            },
        })
    }

    pub fn line_overlay(&self) -> bool {
        self.uniforms.line_overlay > 0.5
    }

    pub fn set_line_overlay(&mut self, enabled: bool) {
        self.uniforms.line_overlay = if enabled { 1.0 } else { 0.0 };
    }

    /// Overlay mask at world position `position`: 0 on a line, 1 between.
    ///
    /// Uses a fixed gradient in place of `fwidth`, so lines have constant
    /// world-space width here instead of constant pixel width.
    pub fn line_mask(&self, position: Vec3) -> f32 {
        let mut coord = Vec2::new(position.x, position.z) / LINE_CELL;
        coord.y -= self.uniforms.time * self.uniforms.speed / 2.0;
        let shifted = coord - Vec2::splat(0.5);
        let frac = shifted - shifted.floor();
        let dist = (frac - Vec2::splat(0.5)).abs() / (FIXED_LINE_GRADIENT * self.uniforms.line_width);
        dist.x.min(dist.y).min(1.0)
    }
}

impl MaterialAdapter for FloorMaterial {
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

    #[test]
    fn overlay_flag_round_trips_through_block() {
        let mut floor = FloorMaterial::new([0.25, 0.0, 0.07], 6.0, false).unwrap();
        assert!(!floor.line_overlay());
        floor.set_line_overlay(true);
        let block: &FloorUniforms = bytemuck::from_bytes(floor.uniform_bytes());
        assert_eq!(block.line_overlay, 1.0);
        assert_eq!(block.speed, 6.0);
        assert_eq!(std::mem::size_of::<FloorUniforms>(), 48);
    }

    #[test]
    fn mask_is_zero_on_lines_and_one_between() {
        let floor = FloorMaterial::new([1.0; 3], 6.0, true).unwrap();
        // Lines sit on multiples of the cell size.
        assert_eq!(floor.line_mask(Vec3::new(4.0, 0.0, 0.5)), 0.0);
        assert_eq!(floor.line_mask(Vec3::new(1.0, 0.0, 1.0)), 1.0);
    }

    #[test]
    fn lines_scroll_with_time() {
        let mut floor = FloorMaterial::new([1.0; 3], 6.0, true).unwrap();
        let probe = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(floor.line_mask(probe), 0.0);
        // Half a cell of scroll: time * speed / 2 = 0.5.
        floor.set_time(1.0 / 6.0);
        assert!(floor.line_mask(probe) > 0.9);
    }
}
