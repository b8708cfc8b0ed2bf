//! Scene state for the neoleon synthwave scene.
//!
//! Owns every material adapter and all procedurally generated data. The
//! renderer reads from a [`Scene`] and never mutates it.
//!
//! # Invariants
//! - Material time only moves forward within a scene; a new scene starts at 0.
//! - City layout, instance transforms and stars are generated once, at build.
//! - Construction fails before any frame is produced if the configuration or
//!   the loaded model does not fit.

mod city;
mod error;
mod frame;
pub mod geometry;
mod scene;
mod stars;
mod terrain;

pub use city::{
    BUILDINGS_PER_SIDE, CityLayout, INSTANCE_CAPACITY, InstanceBuffer, PlacementRecord, Side,
    symmetric_jitter,
};
pub use error::SceneError;
pub use frame::{FrameClock, advance_frame};
pub use scene::Scene;
pub use stars::{Star, StarField};
pub use terrain::TerrainMesh;
