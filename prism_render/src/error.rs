//! Error types for Prism
//!
//! This module defines the error types used throughout the crate,
//! including block binding, shader program broadcast, and resource layout.

use std::fmt;

/// Result type for Prism operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prism errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (driver call failed, buffer upload failed, etc.)
    BackendError(String),

    /// The block reports a buffer target the binding state cannot dispatch on
    UnsupportedKind {
        /// Raw GL buffer target reported by the block
        target: u32,
    },

    /// Every binding slot was used this frame, nothing can be reclaimed
    BindingsExhausted {
        /// Driver (or configured) binding limit
        max_bindings: u32,
        /// Number of blocks that needed a slot when the limit was hit
        requested: usize,
    },

    /// Invalid resource (layout, field, data block)
    InvalidResource(String),

    /// Initialization failed (limits, render context)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::UnsupportedKind { target } => {
                write!(f, "Unsupported shader block target: 0x{:X}", target)
            }
            Error::BindingsExhausted { max_bindings, requested } => write!(
                f,
                "Too many shader blocks bound: {} blocks need a binding but only {} are available",
                requested, max_bindings
            ),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR and build an `Error::BackendError` from the same message
///
/// # Example
///
/// ```ignore
/// let field = layout.field(name)
///     .ok_or_else(|| engine_err!("prism::DataBlock", "Unknown field '{}'", name))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::prism::Error::BackendError(message)
    }};
}

/// Log an ERROR and return early with an `Error::BackendError`
///
/// # Example
///
/// ```ignore
/// if data.len() > size {
///     engine_bail!("prism::DataBlock", "Data size {} exceeds block size {}", data.len(), size);
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
