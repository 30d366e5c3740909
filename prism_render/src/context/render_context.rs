/// Per-context rendering state
///
/// One `RenderContext` exists per graphics context and lives as long as it.
/// It owns the block binding state and the shader program registry, and
/// routes binding directives from one to the other.

use std::sync::Arc;
use crate::binding::{BlockBindingState, ShaderBlock};
use crate::context::{BindingLimits, MIN_GUARANTEED_BINDINGS};
use crate::error::{Error, Result};
use crate::shader::{ProgramKey, ShaderProgram, ShaderProgramRegistry};

/// Configuration for a `RenderContext`
#[derive(Debug, Clone, Default)]
pub struct RenderContextDesc {
    /// Cap applied on top of the driver limit (`None` uses the driver value)
    pub max_block_bindings: Option<u32>,
}

pub struct RenderContext {
    limits: Box<dyn BindingLimits>,
    desc: RenderContextDesc,
    bindings: BlockBindingState,
    programs: ShaderProgramRegistry,
    frame_index: u64,
}

impl RenderContext {
    /// Create a context, querying the driver limit once
    ///
    /// # Errors
    ///
    /// `Error::InitializationFailed` if the resulting binding limit is zero.
    pub fn new(limits: Box<dyn BindingLimits>, desc: RenderContextDesc) -> Result<Self> {
        let max_bindings = Self::resolve_limit(limits.as_ref(), &desc)?;
        crate::engine_info!("prism::RenderContext",
            "Render context created with {} block bindings", max_bindings);

        Ok(Self {
            limits,
            desc,
            bindings: BlockBindingState::new(max_bindings),
            programs: ShaderProgramRegistry::new(),
            frame_index: 0,
        })
    }

    fn resolve_limit(limits: &dyn BindingLimits, desc: &RenderContextDesc) -> Result<u32> {
        let driver = limits.max_block_bindings();
        if driver < MIN_GUARANTEED_BINDINGS {
            crate::engine_warn!("prism::RenderContext",
                "Driver reports {} block bindings, below the GL minimum of {}",
                driver, MIN_GUARANTEED_BINDINGS);
        }

        let limit = match desc.max_block_bindings {
            Some(cap) => driver.min(cap),
            None => driver,
        };
        if limit == 0 {
            let error = Error::InitializationFailed(format!(
                "No block bindings available (driver: {}, cap: {:?})",
                driver, desc.max_block_bindings
            ));
            crate::engine_error!("prism::RenderContext", "{}", error);
            return Err(error);
        }
        Ok(limit)
    }

    // ===== BLOCKS =====

    /// Bind a block, returning its slot
    pub fn bind_block(&mut self, block: &Arc<dyn ShaderBlock>) -> Result<u32> {
        self.bindings.bind(block, &mut self.programs)
    }

    /// Bind a block and wire shader block `name` to it in every program
    pub fn bind_named_block(&mut self, name: &str, block: &Arc<dyn ShaderBlock>) -> Result<()> {
        self.bindings.bind_named(name, block, &mut self.programs)
    }

    /// Release the block's slot
    pub fn unbind_block(&mut self, block: &Arc<dyn ShaderBlock>) -> Result<()> {
        self.bindings.unbind(block, &mut self.programs)
    }

    // ===== PROGRAMS =====

    pub fn register_program(&mut self, program: Box<dyn ShaderProgram>) -> ProgramKey {
        self.programs.register(program)
    }

    pub fn unregister_program(&mut self, key: ProgramKey) -> Option<Box<dyn ShaderProgram>> {
        self.programs.unregister(key)
    }

    /// Swap in a recompiled program and resend named bindings on next use
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if `key` no longer refers to a program.
    pub fn reload_program(
        &mut self,
        key: ProgramKey,
        program: Box<dyn ShaderProgram>,
    ) -> Result<Box<dyn ShaderProgram>> {
        let previous = self.programs.replace(key, program).map_err(|rejected| {
            let error = Error::InvalidResource(format!(
                "Cannot reload '{}': program is no longer registered", rejected.name()
            ));
            crate::engine_error!("prism::RenderContext", "{}", error);
            error
        })?;
        self.bindings.queue_upload();
        Ok(previous)
    }

    /// Every program was rebuilt outside the registry (global shader reload)
    pub fn reload_all_programs(&mut self) {
        crate::engine_info!("prism::RenderContext",
            "Shader reload: resending bindings to {} programs", self.programs.len());
        self.bindings.queue_upload();
    }

    // ===== FRAME =====

    /// Frame boundary: all slots become reclaimable
    pub fn end_frame(&mut self) {
        self.bindings.clear();
        self.frame_index += 1;
    }

    /// Re-query the driver limit (e.g. after a context loss)
    pub fn refresh_limits(&mut self) -> Result<()> {
        let max_bindings = Self::resolve_limit(self.limits.as_ref(), &self.desc)?;
        self.bindings.set_max_bindings(max_bindings, &mut self.programs);
        Ok(())
    }

    // ===== ACCESSORS =====

    pub fn binding_state(&self) -> &BlockBindingState {
        &self.bindings
    }

    pub fn programs(&self) -> &ShaderProgramRegistry {
        &self.programs
    }

    pub fn programs_mut(&mut self) -> &mut ShaderProgramRegistry {
        &mut self.programs
    }

    /// Number of completed frames
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn desc(&self) -> &RenderContextDesc {
        &self.desc
    }
}

#[cfg(test)]
#[path = "render_context_tests.rs"]
mod tests;
