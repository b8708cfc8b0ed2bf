use crate::geometry::{self, GridVertex};
use crate::{CityLayout, FrameClock, InstanceBuffer, SceneError, StarField, TerrainMesh};
use glam::{Mat4, Vec3};
use neoleon_assets::ModelNodes;
use neoleon_common::SceneConfig;
use neoleon_material::{
    FloorMaterial, GridMaterial, GroundSketchMaterial, MaterialAdapter, StarfieldMaterial,
};
use rand::Rng;

/// The whole scene: configuration, live materials and generated content.
#[derive(Debug, Clone)]
pub struct Scene {
    config: SceneConfig,
    clock: FrameClock,
    grid: GridMaterial,
    floor: FloorMaterial,
    ground: GroundSketchMaterial,
    stars: StarfieldMaterial,
    layout: CityLayout,
    instances: InstanceBuffer,
    starfield: StarField,
    terrain: Option<TerrainMesh>,
}

impl Scene {
    /// Validate `config`, compile every material, and generate the city and
    /// stars from `rng`.
    ///
    /// `model` is optional; without it the scene has no terrain. With it,
    /// the configured terrain node must be present.
    pub fn build<R: Rng + ?Sized>(
        config: SceneConfig,
        rng: &mut R,
        model: Option<&ModelNodes>,
    ) -> Result<Self, SceneError> {
        config.validate()?;

        let boundary = config.boundary;
        let grid = GridMaterial::new(-boundary, boundary, config.grid.speed)?;
        let floor = FloorMaterial::new(
            config.floor.color.to_linear(),
            config.floor.speed,
            config.floor.line_overlay,
        )?;
        let ground = GroundSketchMaterial::new(ground_transform(config.ground.elevation))?;
        let stars = StarfieldMaterial::new(config.stars.fade)?;

        let layout = CityLayout::generate(rng, boundary)?;
        let instances = InstanceBuffer::from_layout(&layout);
        let starfield = if config.stars.enabled {
            StarField::generate(rng, &config.stars)
        } else {
            StarField::default()
        };
        let terrain = model
            .map(|nodes| TerrainMesh::from_model(nodes, &config.terrain))
            .transpose()?;

        tracing::info!(
            "scene built: boundary {boundary}, {} blocks, {} stars, terrain {}",
            instances.len(),
            starfield.len(),
            if terrain.is_some() { "loaded" } else { "absent" }
        );

        Ok(Self {
            config,
            clock: FrameClock::new(),
            grid,
            floor,
            ground,
            stars,
            layout,
            instances,
            starfield,
            terrain,
        })
    }

    /// Advance every material by one frame of `delta_seconds`.
    pub fn tick(&mut self, delta_seconds: f32) {
        let delta = self.clock.advance(delta_seconds);
        crate::advance_frame(delta, &mut self.adapters_mut());
    }

    pub fn adapters_mut(&mut self) -> [&mut dyn MaterialAdapter; 4] {
        [
            &mut self.grid,
            &mut self.floor,
            &mut self.ground,
            &mut self.stars,
        ]
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn grid(&self) -> &GridMaterial {
        &self.grid
    }

    pub fn floor(&self) -> &FloorMaterial {
        &self.floor
    }

    pub fn ground(&self) -> &GroundSketchMaterial {
        &self.ground
    }

    pub fn stars(&self) -> &StarfieldMaterial {
        &self.stars
    }

    pub fn layout(&self) -> &CityLayout {
        &self.layout
    }

    pub fn instances(&self) -> &InstanceBuffer {
        &self.instances
    }

    pub fn starfield(&self) -> &StarField {
        &self.starfield
    }

    pub fn terrain(&self) -> Option<&TerrainMesh> {
        self.terrain.as_ref()
    }

    /// Grid line vertices spanning `[-boundary, boundary]`.
    pub fn grid_vertices(&self) -> Vec<GridVertex> {
        geometry::grid_lines(
            2.0 * self.config.boundary,
            self.config.grid.division,
            self.config.grid.center_color.to_linear_rgba(1.0),
            self.config.grid.line_color.to_linear_rgba(1.0),
        )
    }
}

/// Lay the XY ground plane flat, displacement pointing up, at `elevation`.
fn ground_transform(elevation: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, elevation, 0.0))
        * Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use neoleon_assets::MeshData;
    use neoleon_common::ConfigError;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build(config: SceneConfig, model: Option<&ModelNodes>) -> Result<Scene, SceneError> {
        Scene::build(config, &mut StdRng::seed_from_u64(2025), model)
    }

    #[test]
    fn default_scene_builds() {
        let scene = build(SceneConfig::default(), None).unwrap();
        assert_eq!(scene.instances().len(), 300);
        assert_eq!(scene.starfield().len(), 5000);
        assert!(scene.terrain().is_none());
        assert_eq!(scene.grid().limits(), (-100.0, 100.0));
        assert_eq!(scene.grid_vertices().len(), 21 * 4);
    }

    #[test]
    fn tick_advances_all_materials_together() {
        let mut scene = build(SceneConfig::default(), None).unwrap();
        scene.tick(0.5);
        scene.tick(0.25);
        for adapter in scene.adapters_mut() {
            assert_eq!(adapter.time(), 0.75);
        }
        assert_eq!(scene.clock().frames(), 2);
    }

    #[test]
    fn invalid_config_fails_before_generation() {
        let config = SceneConfig {
            boundary: 5.0,
            ..SceneConfig::default()
        };
        assert!(matches!(
            build(config, None),
            Err(SceneError::Config(ConfigError::Invalid { field: "boundary", .. }))
        ));
    }

    #[test]
    fn missing_terrain_node_fails() {
        let mut nodes = ModelNodes::new();
        nodes.insert(
            "Plane",
            MeshData {
                positions: vec![[0.0; 3]; 3],
                indices: vec![0, 1, 2],
                transform: Mat4::IDENTITY,
            },
        );
        assert!(matches!(
            build(SceneConfig::default(), Some(&nodes)),
            Err(SceneError::AssetShapeMismatch { .. })
        ));
    }

    #[test]
    fn ground_plane_lies_flat_below_the_floor() {
        let scene = build(SceneConfig::default(), None).unwrap();
        let model = scene.ground().model();
        let up = model.transform_vector3(Vec3::Z);
        assert!((up - Vec3::Y).length() < 1e-6);
        assert_eq!(model.transform_point3(Vec3::ZERO).y, -20.0);
    }

    #[test]
    fn stars_can_be_disabled() {
        let mut config = SceneConfig::default();
        config.stars.enabled = false;
        assert!(build(config, None).unwrap().starfield().is_empty());
    }
}
