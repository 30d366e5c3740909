//! Render context module
//!
//! Driver limits, context configuration, and the per-context owner of
//! binding state and shader programs.

mod binding_limits;
mod render_context;

pub use binding_limits::{BindingLimits, FixedBindingLimits, MIN_GUARANTEED_BINDINGS};
pub use render_context::{RenderContext, RenderContextDesc};
