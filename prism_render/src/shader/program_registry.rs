/// Shader program registry and persistent block-binding directives
///
/// A directive says "every program declaring block `name` must read it from
/// binding `n`". Directives are stored, not just pushed: a program registered
/// after the directive was issued receives it on registration, and a program
/// swapped in by a hot reload receives it again.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::binding::BlockKind;

new_key_type! {
    /// Handle to a program inside a `ShaderProgramRegistry`
    pub struct ProgramKey;
}

/// Linked shader program trait
///
/// Implemented by the host's program objects. Compilation and linking happen
/// elsewhere; the registry only needs to query declared blocks and set their
/// binding indices.
pub trait ShaderProgram: Send {
    /// Debug name of the program
    fn name(&self) -> &str;

    /// Whether the program declares a block of `kind` named `name`
    fn has_block(&self, kind: BlockKind, name: &str) -> bool;

    /// Set the binding of uniform block `name` (`glUniformBlockBinding`)
    fn set_uniform_block(&mut self, name: &str, binding: u32);

    /// Set the binding of storage block `name` (`glShaderStorageBlockBinding`)
    fn set_storage_block(&mut self, name: &str, binding: u32);
}

/// "Bind block `name` of `kind` to `binding`" for all current and future programs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDirective {
    pub kind: BlockKind,
    pub name: String,
    pub binding: u32,
}

impl BlockDirective {
    pub fn new(kind: BlockKind, name: impl Into<String>, binding: u32) -> Self {
        Self { kind, name: name.into(), binding }
    }

    /// Apply to a single program if it declares the block
    ///
    /// Returns true when the program was updated.
    pub fn apply(&self, program: &mut dyn ShaderProgram) -> bool {
        if !program.has_block(self.kind, &self.name) {
            return false;
        }
        match self.kind {
            BlockKind::Uniform => program.set_uniform_block(&self.name, self.binding),
            BlockKind::Storage => program.set_storage_block(&self.name, self.binding),
        }
        true
    }
}

/// Sink for persistent block directives
///
/// The binding state emits directives through this trait, which keeps it
/// independent of where programs actually live.
pub trait GlobalDirectives {
    /// Install `directive` on every current program and remember it for later ones
    fn set_global(&mut self, directive: BlockDirective);
}

/// Owns the active shader programs and the persistent directive table
pub struct ShaderProgramRegistry {
    programs: SlotMap<ProgramKey, Box<dyn ShaderProgram>>,
    /// Latest binding per (kind, block name)
    globals: FxHashMap<(BlockKind, String), u32>,
}

impl ShaderProgramRegistry {
    pub fn new() -> Self {
        Self {
            programs: SlotMap::with_key(),
            globals: FxHashMap::default(),
        }
    }

    /// Register a program and install every stored directive on it
    pub fn register(&mut self, mut program: Box<dyn ShaderProgram>) -> ProgramKey {
        self.apply_globals(program.as_mut());
        crate::engine_debug!("prism::ShaderProgramRegistry",
            "Registered program '{}' ({} global bindings)", program.name(), self.globals.len());
        self.programs.insert(program)
    }

    /// Remove a program, returning it if the key was live
    pub fn unregister(&mut self, key: ProgramKey) -> Option<Box<dyn ShaderProgram>> {
        self.programs.remove(key)
    }

    /// Swap in a rebuilt program under the same key
    ///
    /// The new program receives every stored directive. Returns the previous
    /// program, or gives `program` back unchanged if the key is stale.
    pub fn replace(
        &mut self,
        key: ProgramKey,
        mut program: Box<dyn ShaderProgram>,
    ) -> Result<Box<dyn ShaderProgram>, Box<dyn ShaderProgram>> {
        if !self.programs.contains_key(key) {
            return Err(program);
        }
        self.apply_globals(program.as_mut());
        match self.programs.get_mut(key) {
            Some(slot) => Ok(std::mem::replace(slot, program)),
            None => Err(program),
        }
    }

    pub fn get(&self, key: ProgramKey) -> Option<&dyn ShaderProgram> {
        self.programs.get(key).map(|p| p.as_ref())
    }

    pub fn get_mut(&mut self, key: ProgramKey) -> Option<&mut (dyn ShaderProgram + 'static)> {
        self.programs.get_mut(key).map(|p| p.as_mut())
    }

    /// Iterate registered program keys
    pub fn keys(&self) -> impl Iterator<Item = ProgramKey> + '_ {
        self.programs.keys()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Binding currently stored for block `name` of `kind`
    pub fn global_binding(&self, kind: BlockKind, name: &str) -> Option<u32> {
        self.globals.get(&(kind, name.to_string())).copied()
    }

    /// Number of stored directives
    pub fn global_count(&self) -> usize {
        self.globals.len()
    }

    /// Forget every stored directive (installed bindings are left as they are)
    pub fn clear_globals(&mut self) {
        self.globals.clear();
    }

    fn apply_globals(&self, program: &mut dyn ShaderProgram) {
        for ((kind, name), binding) in &self.globals {
            BlockDirective::new(*kind, name.as_str(), *binding).apply(program);
        }
    }
}

impl GlobalDirectives for ShaderProgramRegistry {
    fn set_global(&mut self, directive: BlockDirective) {
        let mut updated = 0usize;
        for program in self.programs.values_mut() {
            if directive.apply(program.as_mut()) {
                updated += 1;
            }
        }
        crate::engine_trace!("prism::ShaderProgramRegistry",
            "{:?} block '{}' -> binding {} ({} programs updated)",
            directive.kind, directive.name, directive.binding, updated);
        self.globals.insert((directive.kind, directive.name), directive.binding);
    }
}

impl Default for ShaderProgramRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "program_registry_tests.rs"]
mod tests;
