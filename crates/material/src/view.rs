use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Per-frame view data bound at `@group(0) @binding(0)` for every pipeline.
///
/// Layout matches `View` in [`shaders::VIEW_BLOCK`](crate::shaders::VIEW_BLOCK).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ViewUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    /// Linear fog colour in rgb.
    pub fog_color: [f32; 4],
    /// `(near, far, enabled, 0)`.
    pub fog_range: [f32; 4],
    /// `(width, height, 1 / width, 1 / height)` in pixels.
    pub viewport: [f32; 4],
}

impl ViewUniforms {
    pub fn new(view: Mat4, proj: Mat4, eye: Vec3, width: u32, height: u32) -> Self {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
            fog_color: [0.0; 4],
            fog_range: [0.0; 4],
            viewport: [w, h, 1.0 / w, 1.0 / h],
        }
    }

    pub fn with_fog(mut self, color: [f32; 3], near: f32, far: f32) -> Self {
        self.fog_color = [color[0], color[1], color[2], 1.0];
        self.fog_range = [near, far, 1.0, 0.0];
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_sixteen_byte_aligned() {
        assert_eq!(std::mem::size_of::<ViewUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<ViewUniforms>(), 192);
    }

    #[test]
    fn fog_is_disabled_until_requested() {
        let v = ViewUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO, 800, 600);
        assert_eq!(v.fog_range[2], 0.0);
        let v = v.with_fog([0.1, 0.0, 0.1], 50.0, 120.0);
        assert_eq!(v.fog_range, [50.0, 120.0, 1.0, 0.0]);
        assert_eq!(v.viewport[0], 800.0);
    }
}
