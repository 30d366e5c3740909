/// ShaderBlock trait: a buffer object that can occupy a binding slot

use std::sync::atomic::{AtomicU64, Ordering};
use crate::error::Result;

static NEXT_BLOCK_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a shader block
///
/// The binding state keys its assignment table by this id, so two handles
/// to the same block must report the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

impl BlockId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        Self(NEXT_BLOCK_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Buffer object resource trait
///
/// Implemented by driver-level uniform and storage buffers. The binding
/// state never owns the GPU resource; it only records which slot the block
/// occupies and calls `bind`/`unbind` on the driver side.
pub trait ShaderBlock: Send + Sync {
    /// Stable identity used as the assignment key
    fn id(&self) -> BlockId;

    /// Raw GL buffer target (`GL_UNIFORM_BUFFER` or `GL_SHADER_STORAGE_BUFFER`)
    ///
    /// Any other value is rejected with `Error::UnsupportedKind`.
    fn gl_target(&self) -> u32;

    /// Attach the buffer to the indexed binding point `binding`
    fn bind(&self, binding: u32) -> Result<()>;

    /// Detach the buffer from the indexed binding point `binding`
    fn unbind(&self, binding: u32);
}
