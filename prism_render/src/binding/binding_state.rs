//! Binding-point allocator for uniform and storage blocks.
//!
//! The driver exposes a small number of indexed binding points, far fewer
//! than the number of blocks a frame may touch over time. `BlockBindingState`
//! hands slots out lazily, remembers which shader-visible block name is wired
//! to each slot, and reclaims a slot that was not used this frame when the
//! pool runs dry.
//!
//! Frame protocol:
//! - `bind` / `bind_named` any number of times while recording draws
//! - `clear` exactly once at the frame boundary
//!
//! # Example
//!
//! ```ignore
//! let mut state = BlockBindingState::new(limits.max_block_bindings());
//! let slot = state.bind(&camera_block, &mut programs)?;
//! state.bind_named("CameraMatrices", &camera_block, &mut programs)?;
//! // ... draws ...
//! state.clear();
//! ```

use std::sync::Arc;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::binding::{BlockId, BlockKind, ShaderBlock};
use crate::error::{Error, Result};
use crate::shader::{BlockDirective, GlobalDirectives};

/// One held slot
struct BoundBlock {
    block: Arc<dyn ShaderBlock>,
    kind: BlockKind,
    binding: u32,
}

pub struct BlockBindingState {
    /// Assignment table in insertion order (removal keeps the rest in order)
    bound_blocks: Vec<BoundBlock>,
    /// Last block name wired to each slot
    shader_bindings: FxHashMap<u32, String>,
    /// Slots touched since the last `clear`
    used_bindings: FxHashSet<u32>,
    /// Lowest slot believed free, re-validated before use
    next_binding: u32,
    max_bindings: u32,
}

impl BlockBindingState {
    /// Create an empty state for a driver exposing `max_bindings` binding points
    pub fn new(max_bindings: u32) -> Self {
        Self {
            bound_blocks: Vec::new(),
            shader_bindings: FxHashMap::default(),
            used_bindings: FxHashSet::default(),
            next_binding: 0,
            max_bindings,
        }
    }

    // ===== BINDING =====

    /// Bind `block` and return the slot it occupies
    ///
    /// A block that already holds a slot keeps it. The driver-level bind is
    /// issued on every call and the slot is marked used for this frame.
    ///
    /// # Errors
    ///
    /// - `Error::UnsupportedKind` if the block reports an unknown buffer target
    /// - `Error::BindingsExhausted` if every slot was used this frame
    /// - any error returned by the block's driver-level bind, in which case a
    ///   slot assigned by this call is released again
    pub fn bind<D>(&mut self, block: &Arc<dyn ShaderBlock>, directives: &mut D) -> Result<u32>
    where
        D: GlobalDirectives + ?Sized,
    {
        let kind = BlockKind::from_gl_target(block.gl_target())?;

        let (binding, assigned) = match self.binding_of(block.id()) {
            Some(binding) => (binding, false),
            None => {
                if self.next_binding >= self.max_bindings {
                    self.free_binding(directives)?;
                }

                let binding = self.next_binding;
                self.bound_blocks.push(BoundBlock {
                    block: block.clone(),
                    kind,
                    binding,
                });

                // Find the next open binding
                while self.is_held(self.next_binding) {
                    self.next_binding += 1;
                }

                crate::engine_trace!("prism::BlockBindingState",
                    "{:?} block {} assigned binding {}", kind, block.id().raw(), binding);
                (binding, true)
            }
        };

        if let Err(error) = block.bind(binding) {
            // A new assignment is rolled back, an existing one is kept
            if assigned {
                self.bound_blocks.pop();
                if binding < self.next_binding {
                    self.next_binding = binding;
                }
            }
            return Err(error);
        }
        self.used_bindings.insert(binding);
        Ok(binding)
    }

    /// Bind `block` and wire shader block `name` to its slot in every program
    ///
    /// The directive is only emitted when the name recorded for the slot
    /// changes, so rebinding the same block under the same name every frame
    /// costs nothing on the program side.
    pub fn bind_named<D>(
        &mut self,
        name: &str,
        block: &Arc<dyn ShaderBlock>,
        directives: &mut D,
    ) -> Result<()>
    where
        D: GlobalDirectives + ?Sized,
    {
        let kind = BlockKind::from_gl_target(block.gl_target())?;
        let binding = self.bind(block, directives)?;

        if self.shader_bindings.get(&binding).map(String::as_str) != Some(name) {
            self.shader_bindings.insert(binding, name.to_string());
            directives.set_global(BlockDirective::new(kind, name, binding));
        }
        Ok(())
    }

    /// Release the slot held by `block`, if any
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedKind` if the block reports an unknown buffer target.
    pub fn unbind<D>(&mut self, block: &Arc<dyn ShaderBlock>, directives: &mut D) -> Result<()>
    where
        D: GlobalDirectives + ?Sized,
    {
        BlockKind::from_gl_target(block.gl_target())?;

        let id = block.id();
        if let Some(index) = self.bound_blocks.iter().position(|b| b.block.id() == id) {
            let entry = self.bound_blocks.remove(index);
            self.used_bindings.remove(&entry.binding);
            self.release(entry, directives);
        }
        Ok(())
    }

    /// Force every named binding to be re-sent on its next `bind_named`
    ///
    /// Slot assignments are kept. Call after the set of programs changed
    /// wholesale and installed bindings can no longer be trusted.
    pub fn queue_upload(&mut self) {
        crate::engine_debug!("prism::BlockBindingState",
            "Queued upload of {} named bindings", self.shader_bindings.len());
        self.shader_bindings.clear();
    }

    /// End of frame: every slot becomes reclaimable until bound again
    pub fn clear(&mut self) {
        self.used_bindings.clear();
    }

    // ===== ACCESSORS =====

    /// Slot currently held by the block with `id`
    pub fn binding_of(&self, id: BlockId) -> Option<u32> {
        self.bound_blocks.iter().find(|b| b.block.id() == id).map(|b| b.binding)
    }

    /// Block name last wired to `binding`
    pub fn bound_name(&self, binding: u32) -> Option<&str> {
        self.shader_bindings.get(&binding).map(String::as_str)
    }

    /// Whether `binding` was touched since the last `clear`
    pub fn is_used(&self, binding: u32) -> bool {
        self.used_bindings.contains(&binding)
    }

    /// Number of blocks holding a slot
    pub fn bound_count(&self) -> usize {
        self.bound_blocks.len()
    }

    pub fn max_bindings(&self) -> u32 {
        self.max_bindings
    }

    /// Cursor for the next new assignment
    pub fn next_binding(&self) -> u32 {
        self.next_binding
    }

    /// Apply a re-queried driver limit
    ///
    /// Blocks holding a slot at or above a lowered limit are unbound with
    /// the same side effects as `unbind`, so every held slot stays below the
    /// limit.
    pub fn set_max_bindings<D>(&mut self, max_bindings: u32, directives: &mut D)
    where
        D: GlobalDirectives + ?Sized,
    {
        if max_bindings == self.max_bindings {
            return;
        }
        crate::engine_debug!("prism::BlockBindingState",
            "Binding limit changed from {} to {}", self.max_bindings, max_bindings);
        self.max_bindings = max_bindings;

        while let Some(index) = self.bound_blocks.iter().position(|b| b.binding >= max_bindings) {
            let entry = self.bound_blocks.remove(index);
            crate::engine_debug!("prism::BlockBindingState",
                "Evicting {:?} block {} from binding {} above the limit",
                entry.kind, entry.block.id().raw(), entry.binding);
            self.used_bindings.remove(&entry.binding);
            self.release(entry, directives);
        }
    }

    // ===== INTERNAL =====

    fn is_held(&self, binding: u32) -> bool {
        self.bound_blocks.iter().any(|b| b.binding == binding)
    }

    /// Evict the first block not used this frame and move the cursor to its slot
    fn free_binding<D>(&mut self, directives: &mut D) -> Result<()>
    where
        D: GlobalDirectives + ?Sized,
    {
        let stale = self.bound_blocks.iter()
            .position(|b| b.binding < self.max_bindings && !self.used_bindings.contains(&b.binding));

        let Some(index) = stale else {
            let error = Error::BindingsExhausted {
                max_bindings: self.max_bindings,
                requested: self.bound_blocks.len() + 1,
            };
            crate::engine_error!("prism::BlockBindingState", "{}", error);
            return Err(error);
        };

        let entry = self.bound_blocks.remove(index);
        let binding = entry.binding;
        crate::engine_debug!("prism::BlockBindingState",
            "Reclaiming binding {} from {:?} block {}", binding, entry.kind, entry.block.id().raw());
        self.release(entry, directives);

        self.next_binding = binding;
        Ok(())
    }

    /// Driver unbind, clear the slot's name and pull the cursor back
    fn release<D>(&mut self, entry: BoundBlock, directives: &mut D)
    where
        D: GlobalDirectives + ?Sized,
    {
        entry.block.unbind(entry.binding);

        if let Some(name) = self.shader_bindings.remove(&entry.binding) {
            directives.set_global(BlockDirective::new(entry.kind, name, 0));
        }

        // Fill the gap since the spot is open now
        if entry.binding < self.next_binding {
            self.next_binding = entry.binding;
        }
    }
}

#[cfg(test)]
#[path = "binding_state_tests.rs"]
mod tests;
