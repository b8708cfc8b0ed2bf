use glam::{Mat4, Vec3};
use neoleon_common::{CameraConfig, FogConfig};
use neoleon_material::{MaterialAdapter, ViewUniforms, ripple_opacity};
use neoleon_scene::Scene;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self::from(&CameraConfig::default())
    }
}

impl From<&CameraConfig> for RenderView {
    fn from(camera: &CameraConfig) -> Self {
        Self {
            eye: camera.position,
            target: camera.target,
            fov_degrees: camera.fov_degrees,
            near: camera.near,
            far: camera.far,
        }
    }
}

impl RenderView {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    /// View block for a `width` x `height` viewport with `fog` applied.
    pub fn uniforms(&self, width: u32, height: u32, fog: &FogConfig) -> ViewUniforms {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        ViewUniforms::new(
            self.view_matrix(),
            self.projection(aspect),
            self.eye,
            width,
            height,
        )
        .with_fog(fog.color.to_linear(), fog.near, fog.far)
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads scene state and a view configuration, then produces
/// output. It never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &Scene, view: &RenderView) -> Self::Output;
}

/// Plain-text summary of a scene frame, for the CLI and for tests.
#[derive(Debug, Default)]
pub struct SummaryRenderer {
    /// Also list every city block.
    pub list_blocks: bool,
}

impl SummaryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blocks(mut self) -> Self {
        self.list_blocks = true;
        self
    }
}

impl Renderer for SummaryRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, view: &RenderView) -> String {
        tracing::debug!(frame = scene.clock().frames(), "summarising scene");
        let mut out = String::new();
        let clock = scene.clock();
        let config = scene.config();
        out.push_str(&format!(
            "=== Neoleon (frame={}, t={:.3}s) ===\n",
            clock.frames(),
            clock.elapsed()
        ));
        out.push_str(&format!(
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}\n",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z,
            view.fov_degrees
        ));

        let grid = scene.grid();
        let (lo, hi) = grid.limits();
        out.push_str(&format!(
            "Grid: limits=[{lo:.1}, {hi:.1}) speed={:.2} time={:.3} origin_z={:.2}\n",
            grid.speed(),
            grid.time(),
            grid.vertex_z(0.0, true)
        ));
        let floor = scene.floor();
        out.push_str(&format!(
            "Floor: color={} speed={:.2} overlay={}\n",
            config.floor.color,
            floor.speed(),
            if floor.line_overlay() { "on" } else { "off" }
        ));
        let ground = scene.ground();
        out.push_str(&format!(
            "Ground: enabled={} time={:.3} centre_opacity={:.3}\n",
            config.ground.enabled,
            ground.time(),
            ripple_opacity(glam::Vec2::ZERO, ground.time())
        ));
        out.push_str(&format!(
            "City: {} blocks, color={}\n",
            scene.instances().len(),
            config.city.color
        ));
        out.push_str(&format!("Stars: {}\n", scene.starfield().len()));
        match scene.terrain() {
            Some(terrain) => {
                out.push_str(&format!(
                    "Terrain: {} vertices, {} edges\n",
                    terrain.positions.len(),
                    terrain.edge_count()
                ));
            }
            None => out.push_str("Terrain: none\n"),
        }

        if self.list_blocks {
            for (slot, side, record) in scene.layout().iter_slots() {
                out.push_str(&format!(
                    "  [{slot:3}] {side:?} pos=({:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2})\n",
                    record.position.x,
                    record.position.z,
                    record.scale.x,
                    record.scale.y,
                    record.scale.z
                ));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neoleon_common::SceneConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn scene() -> Scene {
        Scene::build(SceneConfig::default(), &mut StdRng::seed_from_u64(1), None).unwrap()
    }

    #[test]
    fn summary_of_fresh_scene() {
        let output = SummaryRenderer::new().render(&scene(), &RenderView::default());
        assert!(output.contains("frame=0"));
        assert!(output.contains("City: 300 blocks"));
        assert!(output.contains("Terrain: none"));
        assert!(output.contains("overlay=off"));
    }

    #[test]
    fn summary_has_one_line_per_section() {
        let output = SummaryRenderer::new().render(&scene(), &RenderView::default());
        assert!(output.ends_with('\n'));
        let heads: Vec<_> = output
            .lines()
            .map(|l| l.split(':').next().unwrap_or_default())
            .collect();
        assert_eq!(
            heads[1..],
            ["Camera", "Grid", "Floor", "Ground", "City", "Stars", "Terrain"]
        );
    }

    #[test]
    fn summary_tracks_time() {
        let mut scene = scene();
        scene.tick(1.5);
        let output = SummaryRenderer::new().render(&scene, &RenderView::default());
        assert!(output.contains("frame=1"));
        assert!(output.contains("t=1.500s"));
    }

    #[test]
    fn block_listing_has_one_line_per_slot() {
        let output = SummaryRenderer::new()
            .with_blocks()
            .render(&scene(), &RenderView::default());
        assert_eq!(output.lines().filter(|l| l.contains("pos=(")).count(), 300);
        assert!(output.contains("[149] Left"));
        assert!(output.contains("[150] Right"));
    }

    #[test]
    fn render_view_follows_camera_config() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 60.0);
        assert_eq!(view.eye, Vec3::new(0.0, 30.0, 100.0));
        assert_eq!(view.target, Vec3::ZERO);
    }

    #[test]
    fn uniforms_carry_fog_and_viewport() {
        let view = RenderView::default();
        let u = view.uniforms(1280, 720, &FogConfig::default());
        assert_eq!(u.fog_range, [50.0, 120.0, 1.0, 0.0]);
        assert_eq!(u.viewport[0], 1280.0);
        let clip = Mat4::from_cols_array_2d(&u.proj) * Mat4::from_cols_array_2d(&u.view);
        let target = clip.project_point3(Vec3::ZERO);
        assert!(target.x.abs() < 1e-5 && target.y.abs() < 1e-5);
    }
}
