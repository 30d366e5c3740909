//! Driver limit query

/// Source of the driver's binding-point limit
///
/// Backed by `glGetIntegerv(GL_MAX_UNIFORM_BUFFER_BINDINGS)` (or the storage
/// equivalent) on a real context. Queried when a `RenderContext` is created
/// and again on `RenderContext::refresh_limits`.
pub trait BindingLimits {
    /// Maximum number of simultaneously bound shader blocks
    fn max_block_bindings(&self) -> u32;
}

/// Fixed limit, for headless contexts and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBindingLimits(pub u32);

impl BindingLimits for FixedBindingLimits {
    fn max_block_bindings(&self) -> u32 {
        self.0
    }
}

/// GL 4.3 core guarantees at least this many uniform buffer bindings
pub const MIN_GUARANTEED_BINDINGS: u32 = 36;
