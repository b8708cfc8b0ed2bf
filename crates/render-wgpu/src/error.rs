/// Errors raised while building GPU resources.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("shader {label} failed to compile: {message}")]
    ShaderCompile { label: String, message: String },
}
