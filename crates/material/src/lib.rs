//! Procedural shader programs and the material adapters that drive them.
//!
//! Each material is a plain struct composed of a [`ShaderProgram`] (WGSL
//! vertex and fragment sources plus the uniform slots they read) and a
//! `#[repr(C)]` uniform block. The renderer never reaches into a material's
//! internals: it asks the [`MaterialAdapter`] for its uniform bytes once per
//! frame and uploads them.
//!
//! Every shader here has a CPU reference function computing the same value
//! as the GPU stage, so the animation math is testable without a device.
//!
//! # Binding contract
//! - `@group(0) @binding(0)`: [`ViewUniforms`], shared by every pipeline.
//! - `@group(1) @binding(0)`: the material's own uniform block.

mod adapter;
mod floor;
mod grid;
mod ground;
mod program;
pub mod shaders;
mod stars;
mod view;

pub use adapter::MaterialAdapter;
pub use floor::{FloorMaterial, FloorUniforms};
pub use grid::{GridMaterial, GridUniforms};
pub use ground::{
    GroundSketchMaterial, GroundUniforms, RIPPLE_DELAY, RIPPLE_DURATION, RIPPLE_FADE_RADIUS,
    hsv_to_rgb, ripple_color, ripple_height, ripple_opacity,
};
pub use program::{ProgramError, ShaderProgram, ShaderStage, UniformKind, UniformSlot};
pub use stars::{StarUniforms, StarfieldMaterial, star_point_size};
pub use view::ViewUniforms;
