//! Shader program module
//!
//! Registry of active programs and the persistent block-binding directives
//! broadcast to them.

mod program_registry;

pub use program_registry::{
    ProgramKey, ShaderProgram, BlockDirective,
    GlobalDirectives, ShaderProgramRegistry,
};
