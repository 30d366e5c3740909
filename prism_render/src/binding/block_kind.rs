/// Shader block kinds and their GL buffer targets

use crate::error::{Error, Result};

/// `GL_UNIFORM_BUFFER`
pub const GL_UNIFORM_BUFFER: u32 = 0x8A11;
/// `GL_SHADER_STORAGE_BUFFER`
pub const GL_SHADER_STORAGE_BUFFER: u32 = 0x90D2;

/// Uniform (UBO) or Storage (SSBO)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Uniform,
    Storage,
}

impl BlockKind {
    /// Resolve a raw GL buffer target
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedKind` for any target other than the uniform or
    /// shader storage buffer targets.
    pub fn from_gl_target(target: u32) -> Result<Self> {
        match target {
            GL_UNIFORM_BUFFER => Ok(BlockKind::Uniform),
            GL_SHADER_STORAGE_BUFFER => Ok(BlockKind::Storage),
            _ => Err(Error::UnsupportedKind { target }),
        }
    }

    /// Raw GL buffer target for this kind
    pub fn gl_target(&self) -> u32 {
        match self {
            BlockKind::Uniform => GL_UNIFORM_BUFFER,
            BlockKind::Storage => GL_SHADER_STORAGE_BUFFER,
        }
    }
}

#[cfg(test)]
#[path = "block_kind_tests.rs"]
mod tests;
