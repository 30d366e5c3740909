/// Memory layout of a shader block.
///
/// A block is an array of `count` structures made of named typed fields.
/// Offsets follow the GLSL block layout rules for the block kind:
/// - Uniform → std140: structure alignment rounded up to 16
/// - Storage → std430: natural structure alignment (max of field alignments)

use rustc_hash::FxHashMap;
use crate::binding::BlockKind;
use crate::error::{Error, Result};

// ===== FIELD TYPE =====

/// Data type for a field within the block structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    Int,
    UInt,
}

impl FieldType {
    /// Size in bytes
    pub fn size_bytes(&self) -> u64 {
        match self {
            FieldType::Float => 4,
            FieldType::Vec2  => 8,
            FieldType::Vec3  => 12,
            FieldType::Vec4  => 16,
            FieldType::Mat3  => 48, // 3 columns padded to vec4
            FieldType::Mat4  => 64,
            FieldType::Int   => 4,
            FieldType::UInt  => 4,
        }
    }

    /// Base alignment in bytes
    pub fn alignment(&self) -> u64 {
        match self {
            FieldType::Float => 4,
            FieldType::Vec2  => 8,
            FieldType::Vec3  => 16,
            FieldType::Vec4  => 16,
            FieldType::Mat3  => 16,
            FieldType::Mat4  => 16,
            FieldType::Int   => 4,
            FieldType::UInt  => 4,
        }
    }
}

// ===== FIELD DESC =====

/// A named field in the block structure
#[derive(Debug, Clone)]
pub struct FieldDesc {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDesc {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self { name: name.to_string(), field_type }
    }
}

// ===== BLOCK LAYOUT =====

#[derive(Debug, Clone)]
pub struct BlockLayout {
    kind: BlockKind,
    fields: Vec<FieldDesc>,
    field_names: FxHashMap<String, usize>,
    field_offsets: Vec<u64>,
    stride: u64,
    count: u32,
    size: u64,
}

fn align_up(value: u64, align: u64) -> u64 {
    (value + align - 1) & !(align - 1)
}

fn invalid(message: String) -> Error {
    crate::engine_error!("prism::BlockLayout", "{}", message);
    Error::InvalidResource(message)
}

impl BlockLayout {
    /// Compute the layout of `count` structures made of `fields`
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if there are no fields, `count` is zero, or
    /// two fields share a name.
    pub fn new(kind: BlockKind, fields: Vec<FieldDesc>, count: u32) -> Result<Self> {
        if fields.is_empty() {
            return Err(invalid("Block must have at least one field".to_string()));
        }
        if count == 0 {
            return Err(invalid("Block must have at least one element".to_string()));
        }

        let mut field_names = FxHashMap::default();
        let mut field_offsets = Vec::with_capacity(fields.len());
        let mut current_offset: u64 = 0;

        for (index, field) in fields.iter().enumerate() {
            if field_names.insert(field.name.clone(), index).is_some() {
                return Err(invalid(format!("Duplicate field name '{}'", field.name)));
            }
            current_offset = align_up(current_offset, field.field_type.alignment());
            field_offsets.push(current_offset);
            current_offset += field.field_type.size_bytes();
        }

        let max_field_align = fields.iter()
            .map(|f| f.field_type.alignment())
            .max()
            .unwrap_or(4);

        let struct_align = match kind {
            BlockKind::Uniform => max_field_align.max(16),
            BlockKind::Storage => max_field_align,
        };

        let stride = align_up(current_offset, struct_align);

        Ok(Self {
            kind,
            fields,
            field_names,
            field_offsets,
            stride,
            count,
            size: stride * count as u64,
        })
    }

    // ===== ACCESSORS =====

    pub fn kind(&self) -> BlockKind { self.kind }

    /// Size of one element in bytes, aligned
    pub fn stride(&self) -> u64 { self.stride }

    /// Number of elements
    pub fn count(&self) -> u32 { self.count }

    /// Total size in bytes
    pub fn size(&self) -> u64 { self.size }

    pub fn fields(&self) -> &[FieldDesc] { &self.fields }

    /// Field index by name
    pub fn field_id(&self, name: &str) -> Option<usize> {
        self.field_names.get(name).copied()
    }

    /// Field offset within one element
    pub fn field_offset(&self, field_index: usize) -> Option<u64> {
        self.field_offsets.get(field_index).copied()
    }

    /// Absolute byte offset of `field` in element `index`
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` for an unknown field or out-of-range index.
    pub fn locate(&self, index: u32, field: &str) -> Result<(u64, FieldType)> {
        if index >= self.count {
            return Err(invalid(format!(
                "Element index {} out of bounds (count: {})", index, self.count
            )));
        }
        let field_index = self.field_id(field)
            .ok_or_else(|| invalid(format!("Unknown field '{}'", field)))?;
        let offset = self.stride * index as u64 + self.field_offsets[field_index];
        Ok((offset, self.fields[field_index].field_type))
    }
}

#[cfg(test)]
#[path = "block_layout_tests.rs"]
mod tests;
