/*!
# Prism Render

Shader block binding for a host engine's fixed rendering pipeline.

The host owns shader compilation, buffers and the draw loop. This crate
decides which indexed binding point each uniform or storage block occupies,
keeps every shader program's block bindings in sync with those decisions,
and reclaims binding points when a frame needs more blocks than the driver
exposes.

## Architecture

- **BlockBindingState**: binding-point allocator with per-frame reclamation
- **ShaderProgramRegistry**: active programs plus persistent binding directives
- **RenderContext**: per-context owner of both, configured by `RenderContextDesc`
- **DataBlock**: staged, dirty-tracked block data uploaded at bind time

Backends implement `ShaderBlock`, `ShaderProgram`, `BlockBuffer` and
`BindingLimits` on top of their graphics API.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod binding;
pub mod shader;
pub mod context;
pub mod resource;

// Main prism namespace module
pub mod prism {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine facade (logger)
    pub use crate::engine::Engine;

    // Per-context state
    pub use crate::context::{RenderContext, RenderContextDesc};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Binding sub-module
    pub mod binding {
        pub use crate::binding::*;
    }

    // Shader program sub-module
    pub mod shader {
        pub use crate::shader::*;
    }

    // Context sub-module
    pub mod context {
        pub use crate::context::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }
}

// Re-export math library at crate root
pub use glam;
