/// Shader block backed by CPU-side staging data.
///
/// Writes land in a staging copy and mark the block dirty; the next time the
/// block is bound to a slot, pending data is uploaded to the driver buffer
/// first. A block written every frame but bound once uploads once.

use std::sync::Mutex;
use glam::{Mat3, Mat4, Vec4};
use crate::binding::{BlockId, BlockKind, ShaderBlock};
use crate::error::{Error, Result};
use crate::resource::{BlockLayout, FieldDesc, FieldType};

/// Driver buffer object behind a `DataBlock`
pub trait BlockBuffer: Send + Sync {
    /// Replace the buffer contents (`glBufferSubData`)
    fn upload(&self, data: &[u8]) -> Result<()>;

    /// Attach to indexed binding `binding` of `kind`'s target (`glBindBufferBase`)
    fn bind(&self, kind: BlockKind, binding: u32);

    /// Detach from indexed binding `binding`
    fn unbind(&self, kind: BlockKind, binding: u32);
}

/// Descriptor for creating a DataBlock
pub struct DataBlockDesc {
    pub kind: BlockKind,
    pub fields: Vec<FieldDesc>,
    pub count: u32,
    pub buffer: Box<dyn BlockBuffer>,
}

struct Staging {
    bytes: Vec<u8>,
    dirty: bool,
}

pub struct DataBlock {
    id: BlockId,
    layout: BlockLayout,
    buffer: Box<dyn BlockBuffer>,
    staging: Mutex<Staging>,
}

impl DataBlock {
    /// Create a zero-filled block; the zeros are uploaded on first bind
    pub fn from_desc(desc: DataBlockDesc) -> Result<Self> {
        let layout = BlockLayout::new(desc.kind, desc.fields, desc.count)?;
        let bytes = vec![0u8; layout.size() as usize];

        Ok(Self {
            id: BlockId::next(),
            layout,
            buffer: desc.buffer,
            staging: Mutex::new(Staging { bytes, dirty: true }),
        })
    }

    pub fn kind(&self) -> BlockKind {
        self.layout.kind()
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    /// Whether staged data is waiting for upload
    pub fn is_dirty(&self) -> bool {
        self.staging.lock().map(|s| s.dirty).unwrap_or(true)
    }

    /// Copy of the staged bytes
    pub fn staged_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.lock_staging()?.bytes.clone())
    }

    // ===== WRITES =====

    /// Write raw bytes for `field` of element `index`
    ///
    /// `data` must be exactly the field's size.
    pub fn set_field(&self, index: u32, field: &str, data: &[u8]) -> Result<()> {
        let (offset, field_type) = self.layout.locate(index, field)?;
        if data.len() as u64 != field_type.size_bytes() {
            crate::engine_bail!("prism::DataBlock",
                "Data size {} doesn't match size {} of field '{}'",
                data.len(), field_type.size_bytes(), field);
        }
        self.write_raw(offset, data)
    }

    pub fn set_f32(&self, index: u32, field: &str, value: f32) -> Result<()> {
        self.write_typed(index, field, FieldType::Float, bytemuck::bytes_of(&value))
    }

    pub fn set_i32(&self, index: u32, field: &str, value: i32) -> Result<()> {
        self.write_typed(index, field, FieldType::Int, bytemuck::bytes_of(&value))
    }

    pub fn set_u32(&self, index: u32, field: &str, value: u32) -> Result<()> {
        self.write_typed(index, field, FieldType::UInt, bytemuck::bytes_of(&value))
    }

    pub fn set_vec4(&self, index: u32, field: &str, value: Vec4) -> Result<()> {
        self.write_typed(index, field, FieldType::Vec4, bytemuck::bytes_of(&value))
    }

    /// Columns are padded to vec4 as the block layout requires
    pub fn set_mat3(&self, index: u32, field: &str, value: Mat3) -> Result<()> {
        let columns = [
            value.x_axis.extend(0.0),
            value.y_axis.extend(0.0),
            value.z_axis.extend(0.0),
        ];
        self.write_typed(index, field, FieldType::Mat3, bytemuck::cast_slice(&columns))
    }

    pub fn set_mat4(&self, index: u32, field: &str, value: Mat4) -> Result<()> {
        self.write_typed(index, field, FieldType::Mat4, bytemuck::bytes_of(&value))
    }

    /// Write bytes at an arbitrary offset
    pub fn write_raw(&self, offset: u64, data: &[u8]) -> Result<()> {
        let size = self.layout.size();
        let in_bounds = offset.checked_add(data.len() as u64).is_some_and(|end| end <= size);
        if !in_bounds {
            crate::engine_bail!("prism::DataBlock",
                "Write at offset {} with size {} exceeds block size {}",
                offset, data.len(), size);
        }
        let mut staging = self.lock_staging()?;
        let start = offset as usize;
        staging.bytes[start..start + data.len()].copy_from_slice(data);
        staging.dirty = true;
        Ok(())
    }

    /// Upload staged data if anything changed since the last upload
    pub fn flush(&self) -> Result<()> {
        let mut staging = self.lock_staging()?;
        if staging.dirty {
            self.buffer.upload(&staging.bytes)?;
            staging.dirty = false;
        }
        Ok(())
    }

    // ===== INTERNAL =====

    fn write_typed(&self, index: u32, field: &str, expected: FieldType, data: &[u8]) -> Result<()> {
        let (offset, field_type) = self.layout.locate(index, field)?;
        if field_type != expected {
            let message = format!(
                "Field '{}' is {:?}, cannot write {:?}", field, field_type, expected
            );
            crate::engine_error!("prism::DataBlock", "{}", message);
            return Err(Error::InvalidResource(message));
        }
        self.write_raw(offset, data)
    }

    fn lock_staging(&self) -> Result<std::sync::MutexGuard<'_, Staging>> {
        self.staging.lock()
            .map_err(|_| crate::engine_err!("prism::DataBlock", "Staging lock poisoned"))
    }
}

impl ShaderBlock for DataBlock {
    fn id(&self) -> BlockId {
        self.id
    }

    fn gl_target(&self) -> u32 {
        self.layout.kind().gl_target()
    }

    fn bind(&self, binding: u32) -> Result<()> {
        self.flush()?;
        self.buffer.bind(self.layout.kind(), binding);
        Ok(())
    }

    fn unbind(&self, binding: u32) {
        self.buffer.unbind(self.layout.kind(), binding);
    }
}

#[cfg(test)]
#[path = "data_block_tests.rs"]
mod tests;
