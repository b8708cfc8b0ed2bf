use crate::HexColor;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating a scene configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

fn non_negative(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Top-level scene configuration.
///
/// Every field has a default matching the reference look, so an empty YAML
/// document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Half-extent of the ground plane. The grid wraps within
    /// `[-boundary, boundary]` and the city fills the band inside it.
    pub boundary: f32,
    pub clear_color: HexColor,
    pub grid: GridConfig,
    pub floor: FloorConfig,
    pub ground: GroundConfig,
    pub city: CityConfig,
    pub stars: StarsConfig,
    pub terrain: TerrainConfig,
    pub fog: FogConfig,
    pub camera: CameraConfig,
    pub post: PostConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            boundary: 100.0,
            clear_color: HexColor::from_u32(0x17001a),
            grid: GridConfig::default(),
            floor: FloorConfig::default(),
            ground: GroundConfig::default(),
            city: CityConfig::default(),
            stars: StarsConfig::default(),
            terrain: TerrainConfig::default(),
            fog: FogConfig::default(),
            camera: CameraConfig::default(),
            post: PostConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of cells along each side.
    pub division: u32,
    /// World units per second the moving lines scroll.
    pub speed: f32,
    pub center_color: HexColor,
    pub line_color: HexColor,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            division: 20,
            speed: 1.0,
            center_color: HexColor::from_u32(0x00eece),
            line_color: HexColor::from_u32(0x00eece),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    pub color: HexColor,
    pub speed: f32,
    /// Draw the anti-aliased scrolling line overlay on the floor.
    pub line_overlay: bool,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            color: HexColor::from_u32(0x880e4f),
            speed: 6.0,
            line_overlay: false,
        }
    }
}

/// Upper bound on `ground.segments`; keeps the plane's `u32` indices in range.
pub const MAX_GROUND_SEGMENTS: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub enabled: bool,
    /// Side length of the rippling sketch plane.
    pub size: f32,
    /// Subdivisions per side.
    pub segments: u32,
    /// Height of the plane below the floor.
    pub elevation: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 1024.0,
            segments: 128,
            elevation: -20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityConfig {
    pub color: HexColor,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            color: HexColor::from_u32(0x880e4f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarsConfig {
    pub enabled: bool,
    /// Radius of the inner sphere.
    pub radius: f32,
    /// Depth of the shell the stars are scattered in.
    pub depth: f32,
    pub count: u32,
    /// Size factor.
    pub factor: f32,
    pub saturation: f32,
    /// Soft circular falloff instead of hard squares.
    pub fade: bool,
}

impl Default for StarsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 100.0,
            depth: 50.0,
            count: 5000,
            factor: 6.0,
            saturation: 0.0,
            fade: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Name of the node in the loaded model that holds the terrain mesh.
    pub node: String,
    pub position: Vec3,
    pub scale: f32,
    /// Euler rotation in degrees, applied X then Y then Z.
    pub rotation_degrees: Vec3,
    pub color: HexColor,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            node: "EXPORT_GOOGLE_SAT_WM".into(),
            position: Vec3::new(40.0, -74.0, -300.0),
            scale: 50.0,
            rotation_degrees: Vec3::new(-2.0, 110.0, 0.0),
            color: HexColor::from_u32(0x448aff),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    pub color: HexColor,
    pub near: f32,
    pub far: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: HexColor::from_u32(0x17001a),
            near: 50.0,
            far: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 30.0, 100.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Static bloom and film-grain parameters for the composite pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    pub enabled: bool,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub bloom_threshold: f32,
    pub film_noise: f32,
    pub film_scanlines: f32,
    pub film_scanline_count: f32,
    pub film_grayscale: bool,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bloom_strength: 2.9,
            bloom_radius: 0.0,
            bloom_threshold: 0.24,
            film_noise: 0.25,
            film_scanlines: 0.4,
            film_scanline_count: 640.0,
            film_grayscale: false,
        }
    }
}

impl SceneConfig {
    /// Parse a YAML document. Missing fields fall back to defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&data)?;
        tracing::debug!("loaded scene config from {}", path.display());
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values that would make scene construction ill-defined.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.boundary.is_finite() || self.boundary <= 30.0 {
            return Err(invalid(
                "boundary",
                format!("must be finite and greater than 30, got {}", self.boundary),
            ));
        }
        if self.grid.division == 0 {
            return Err(invalid("grid.division", "must be at least 1"));
        }
        if !self.grid.speed.is_finite() {
            return Err(invalid("grid.speed", "must be finite"));
        }
        if !self.floor.speed.is_finite() {
            return Err(invalid("floor.speed", "must be finite"));
        }
        if !positive(self.ground.size) {
            return Err(invalid("ground.size", "must be positive"));
        }
        if !(1..=MAX_GROUND_SEGMENTS).contains(&self.ground.segments) {
            return Err(invalid(
                "ground.segments",
                format!(
                    "must lie in [1, {MAX_GROUND_SEGMENTS}], got {}",
                    self.ground.segments
                ),
            ));
        }
        let stars = &self.stars;
        if !non_negative(stars.radius) || !non_negative(stars.depth) || !positive(stars.factor) {
            return Err(invalid(
                "stars",
                "radius and depth must be non-negative and factor positive",
            ));
        }
        if !(0.0..=1.0).contains(&stars.saturation) {
            return Err(invalid("stars.saturation", "must lie in [0, 1]"));
        }
        if !positive(self.terrain.scale) {
            return Err(invalid("terrain.scale", "must be positive"));
        }
        if !self.fog.near.is_finite() || !self.fog.far.is_finite() || self.fog.near >= self.fog.far {
            return Err(invalid("fog", "near must be less than far"));
        }
        let cam = &self.camera;
        if !positive(cam.fov_degrees) || cam.fov_degrees >= 180.0 {
            return Err(invalid("camera.fov_degrees", "must lie in (0, 180)"));
        }
        if !positive(cam.near) || !cam.far.is_finite() || cam.near >= cam.far {
            return Err(invalid("camera", "near must be positive and less than far"));
        }
        if cam.position == cam.target {
            return Err(invalid("camera", "position and target must differ"));
        }
        let post = &self.post;
        let post_values = [
            post.bloom_strength,
            post.bloom_radius,
            post.bloom_threshold,
            post.film_noise,
            post.film_scanlines,
            post.film_scanline_count,
        ];
        if !post_values.into_iter().all(non_negative) {
            return Err(invalid("post", "parameters must be finite and non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SceneConfig::default();
        config.validate().unwrap();
        assert_eq!(config.boundary, 100.0);
        assert_eq!(config.grid.division, 20);
        assert_eq!(config.floor.speed, 6.0);
        assert!(!config.floor.line_overlay);
    }

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = SceneConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn partial_yaml_overrides_fields() {
        let yaml = "boundary: 150\ngrid:\n  speed: 2.5\nfog:\n  color: '#000000'\n";
        let config = SceneConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.boundary, 150.0);
        assert_eq!(config.grid.speed, 2.5);
        assert_eq!(config.grid.division, 20);
        assert_eq!(config.fog.color, HexColor::from_u32(0));
    }

    #[test]
    fn rejects_small_boundary() {
        let err = SceneConfig::from_yaml_str("boundary: 20").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "boundary", .. }));
    }

    #[test]
    fn rejects_huge_ground_segments() {
        let err = SceneConfig::from_yaml_str("ground:\n  segments: 70000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "ground.segments", .. }));

        let config = SceneConfig::from_yaml_str(&format!(
            "ground:\n  segments: {MAX_GROUND_SEGMENTS}\n"
        ))
        .unwrap();
        assert_eq!(config.ground.segments, MAX_GROUND_SEGMENTS);
    }

    #[test]
    fn rejects_bad_colour() {
        let err = SceneConfig::from_yaml_str("clear_color: 'purple'").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn rejects_inverted_fog() {
        let config = SceneConfig {
            fog: FogConfig {
                near: 10.0,
                far: 5.0,
                ..FogConfig::default()
            },
            ..SceneConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_round_trip_through_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let config = SceneConfig {
            boundary: 80.0,
            ..SceneConfig::default()
        };
        std::fs::write(tmp.path(), config.to_yaml_string().unwrap()).unwrap();
        let loaded = SceneConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
