use std::fmt;

/// Errors raised while assembling a shader program or its parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProgramError {
    #[error("degenerate wrap interval: limits ({lo}, {hi}) must satisfy lo < hi")]
    DegenerateWrapInterval { lo: f32, hi: f32 },
    #[error("{stage} stage of {label} has an empty entry point")]
    MissingEntryPoint { label: &'static str, stage: &'static str },
}

/// Type of a value in a material's uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec4,
    Mat4,
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Float => "f32",
            Self::Vec2 => "vec2<f32>",
            Self::Vec4 => "vec4<f32>",
            Self::Mat4 => "mat4x4<f32>",
        };
        f.write_str(name)
    }
}

/// A named input in the material's uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: &'static str,
    pub kind: UniformKind,
}

impl UniformSlot {
    pub const fn new(name: &'static str, kind: UniformKind) -> Self {
        Self { name, kind }
    }
}

/// One pipeline stage: a self-contained WGSL module and its entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStage {
    pub source: String,
    pub entry_point: &'static str,
}

impl ShaderStage {
    pub fn new(source: impl Into<String>, entry_point: &'static str) -> Self {
        Self {
            source: source.into(),
            entry_point,
        }
    }
}

/// Vertex and fragment sources plus the uniform slots they read.
///
/// Immutable after construction. Only the values in the owning material's
/// uniform block change between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderProgram {
    label: &'static str,
    vertex: ShaderStage,
    fragment: ShaderStage,
    uniforms: Vec<UniformSlot>,
}

impl ShaderProgram {
    pub fn new(
        label: &'static str,
        vertex: ShaderStage,
        fragment: ShaderStage,
        uniforms: Vec<UniformSlot>,
    ) -> Result<Self, ProgramError> {
        if vertex.entry_point.is_empty() {
            return Err(ProgramError::MissingEntryPoint {
                label,
                stage: "vertex",
            });
        }
        if fragment.entry_point.is_empty() {
            return Err(ProgramError::MissingEntryPoint {
                label,
                stage: "fragment",
            });
        }
        tracing::debug!(label, uniforms = uniforms.len(), "shader program assembled");
        Ok(Self {
            label,
            vertex,
            fragment,
            uniforms,
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn vertex(&self) -> &ShaderStage {
        &self.vertex
    }

    pub fn fragment(&self) -> &ShaderStage {
        &self.fragment
    }

    pub fn uniforms(&self) -> &[UniformSlot] {
        &self.uniforms
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.iter().any(|u| u.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(entry: &'static str) -> ShaderStage {
        ShaderStage::new("@vertex fn main() {}", entry)
    }

    #[test]
    fn program_exposes_slots() {
        let program = ShaderProgram::new(
            "test",
            stage("vs"),
            stage("fs"),
            vec![UniformSlot::new("time", UniformKind::Float)],
        )
        .unwrap();
        assert_eq!(program.label(), "test");
        assert!(program.has_uniform("time"));
        assert!(!program.has_uniform("speed"));
        assert_eq!(program.vertex().entry_point, "vs");
    }

    #[test]
    fn empty_entry_point_rejected() {
        let err = ShaderProgram::new("test", stage("vs"), stage(""), Vec::new()).unwrap_err();
        assert_eq!(
            err,
            ProgramError::MissingEntryPoint {
                label: "test",
                stage: "fragment"
            }
        );
    }

    #[test]
    fn uniform_kind_display_is_wgsl() {
        assert_eq!(UniformKind::Vec2.to_string(), "vec2<f32>");
        assert_eq!(UniformKind::Mat4.to_string(), "mat4x4<f32>");
    }
}
