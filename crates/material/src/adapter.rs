use crate::ShaderProgram;

/// Per-surface handle over a shader program's animated parameters.
///
/// The per-frame update step drives every live adapter through this trait;
/// the renderer reads [`uniform_bytes`](Self::uniform_bytes) after the update
/// and uploads them to the material's uniform buffer.
pub trait MaterialAdapter {
    fn program(&self) -> &ShaderProgram;

    /// Elapsed animation time in seconds.
    fn time(&self) -> f32;

    fn set_time(&mut self, time: f32);

    fn speed(&self) -> f32;

    fn set_speed(&mut self, speed: f32);

    /// The uniform block exactly as the GPU expects it.
    fn uniform_bytes(&self) -> &[u8];
}
