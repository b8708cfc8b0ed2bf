//! Shared types for the neoleon scene: configuration and colours.
//!
//! # Invariants
//! - A `SceneConfig` that passed `validate` never produces a degenerate grid
//!   wrap interval or an empty city band.
//! - Colours are stored as sRGB bytes and converted to linear on demand.

mod color;
mod config;

pub use color::HexColor;
pub use config::{
    CameraConfig, CityConfig, ConfigError, FloorConfig, FogConfig, GridConfig, GroundConfig,
    MAX_GROUND_SEGMENTS, PostConfig, SceneConfig, StarsConfig, TerrainConfig,
};
