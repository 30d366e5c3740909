//! Resource module
//!
//! Block layouts and data-backed shader blocks.

mod block_layout;
mod data_block;

pub use block_layout::{BlockLayout, FieldDesc, FieldType};
pub use data_block::{BlockBuffer, DataBlock, DataBlockDesc};
