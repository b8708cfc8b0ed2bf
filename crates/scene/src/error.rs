use neoleon_common::ConfigError;
use neoleon_material::ProgramError;

/// Errors that abort scene construction.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("asset shape mismatch: no mesh node named {node:?} (available: {available:?})")]
    AssetShapeMismatch { node: String, available: Vec<String> },
    #[error("city boundary {0} leaves no room for buildings (must exceed 30)")]
    InvalidBoundary(f32),
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
