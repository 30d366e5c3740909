//! Block binding module
//!
//! Shader block identity, kinds, and the binding-point allocator.

mod block_kind;
mod shader_block;
mod binding_state;
pub mod mock_binding;

pub use block_kind::{BlockKind, GL_UNIFORM_BUFFER, GL_SHADER_STORAGE_BUFFER};
pub use shader_block::{BlockId, ShaderBlock};
pub use binding_state::BlockBindingState;
