//! wgpu render backend for the neoleon scene.
//!
//! Draws the floor, scrolling grid, instanced city blocks, terrain
//! wireframe, ground sketch and stars into an HDR target, then composites
//! bloom and film grain onto the surface. The camera orbits a target point.
//!
//! # Invariants
//! - The renderer never mutates the scene; material uniforms are re-uploaded
//!   from the adapters every frame.
//! - Every pipeline binds the view block at group 0 and its material block
//!   at group 1.
//! - A shader that fails to compile aborts construction with
//!   [`RenderError::ShaderCompile`]; no partial renderer is returned.

mod camera;
mod error;
mod gpu;
mod post;
mod shaders;

pub use camera::OrbitCamera;
pub use error::RenderError;
pub use gpu::SceneRenderer;
pub use post::{HDR_FORMAT, PostUniforms};
