/// Mock blocks and programs for unit tests (no GL context required)
///
/// Every driver-level call is recorded so tests can assert on the exact
/// sequence of binds, unbinds and block-binding updates.

#[cfg(test)]
use std::sync::{Arc, Mutex};
#[cfg(test)]
use crate::binding::{BlockId, BlockKind, ShaderBlock};
#[cfg(test)]
use crate::shader::{BlockDirective, GlobalDirectives, ShaderProgram};
#[cfg(test)]
use crate::error::Result;
#[cfg(test)]
use crate::engine_bail;

// ============================================================================
// Mock Block
// ============================================================================

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCall {
    Bind(u32),
    Unbind(u32),
}

#[cfg(test)]
#[derive(Debug)]
pub struct MockBlock {
    pub id: BlockId,
    pub target: u32,
    pub fail_bind: bool,
    calls: Mutex<Vec<BlockCall>>,
}

#[cfg(test)]
impl MockBlock {
    pub fn with_target(target: u32) -> Arc<Self> {
        Arc::new(Self {
            id: BlockId::next(),
            target,
            fail_bind: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn uniform() -> Arc<Self> {
        Self::with_target(BlockKind::Uniform.gl_target())
    }

    pub fn storage() -> Arc<Self> {
        Self::with_target(BlockKind::Storage.gl_target())
    }

    /// A uniform block whose driver bind always fails
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            id: BlockId::next(),
            target: BlockKind::Uniform.gl_target(),
            fail_bind: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Shared handle as the trait object the binding state stores
    pub fn as_block(self: &Arc<Self>) -> Arc<dyn ShaderBlock> {
        self.clone()
    }

    pub fn calls(&self) -> Vec<BlockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn bind_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, BlockCall::Bind(_))).count()
    }

    pub fn unbind_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, BlockCall::Unbind(_))).count()
    }
}

#[cfg(test)]
impl ShaderBlock for MockBlock {
    fn id(&self) -> BlockId {
        self.id
    }

    fn gl_target(&self) -> u32 {
        self.target
    }

    fn bind(&self, binding: u32) -> Result<()> {
        if self.fail_bind {
            engine_bail!("prism::mock", "Simulated bind failure at binding {}", binding);
        }
        self.calls.lock().unwrap().push(BlockCall::Bind(binding));
        Ok(())
    }

    fn unbind(&self, binding: u32) {
        self.calls.lock().unwrap().push(BlockCall::Unbind(binding));
    }
}

// ============================================================================
// Mock Program
// ============================================================================

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramCall {
    pub kind: BlockKind,
    pub name: String,
    pub binding: u32,
}

#[cfg(test)]
pub type ProgramLog = Arc<Mutex<Vec<ProgramCall>>>;

#[cfg(test)]
pub struct MockProgram {
    pub name: String,
    pub uniform_blocks: Vec<String>,
    pub storage_blocks: Vec<String>,
    log: ProgramLog,
}

#[cfg(test)]
impl MockProgram {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            uniform_blocks: Vec::new(),
            storage_blocks: Vec::new(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_uniform(mut self, block: &str) -> Self {
        self.uniform_blocks.push(block.to_string());
        self
    }

    pub fn with_storage(mut self, block: &str) -> Self {
        self.storage_blocks.push(block.to_string());
        self
    }

    /// Handle to the call log (stays valid after the program is boxed)
    pub fn log(&self) -> ProgramLog {
        self.log.clone()
    }

    /// Box the program, returning the log handle alongside
    pub fn boxed(self) -> (Box<dyn ShaderProgram>, ProgramLog) {
        let log = self.log();
        (Box::new(self), log)
    }
}

#[cfg(test)]
impl ShaderProgram for MockProgram {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_block(&self, kind: BlockKind, name: &str) -> bool {
        match kind {
            BlockKind::Uniform => self.uniform_blocks.iter().any(|b| b == name),
            BlockKind::Storage => self.storage_blocks.iter().any(|b| b == name),
        }
    }

    fn set_uniform_block(&mut self, name: &str, binding: u32) {
        self.log.lock().unwrap().push(ProgramCall {
            kind: BlockKind::Uniform,
            name: name.to_string(),
            binding,
        });
    }

    fn set_storage_block(&mut self, name: &str, binding: u32) {
        self.log.lock().unwrap().push(ProgramCall {
            kind: BlockKind::Storage,
            name: name.to_string(),
            binding,
        });
    }
}

// ============================================================================
// Recording directive sink
// ============================================================================

#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingDirectives {
    pub directives: Vec<BlockDirective>,
}

#[cfg(test)]
impl RecordingDirectives {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl GlobalDirectives for RecordingDirectives {
    fn set_global(&mut self, directive: BlockDirective) {
        self.directives.push(directive);
    }
}
