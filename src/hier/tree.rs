//! The hierarchical container tree: named groups and typed datasets.
//!
//! This is the in-memory form of the binary format. A group holds named
//! children in insertion order; a dataset holds a typed flat buffer
//! plus a shape. A scalar is a dataset with an empty shape (rank 0,
//! exactly one element).

use crate::error::{ScribeError, ScribeResult};
use crate::schema::NumType;
use crate::tome::Complex;

/// Element type of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    Bool,
    String,
    Num(NumType),
}

impl Dtype {
    pub fn name(&self) -> &'static str {
        match self {
            Dtype::Bool => "bool",
            Dtype::String => "string",
            Dtype::Num(t) => t.name(),
        }
    }
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Typed flat storage of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    Bool(Vec<bool>),
    String(Vec<String>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
    Uint64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Complex64(Vec<Complex<f32>>),
    Complex128(Vec<Complex<f64>>),
}

impl Buffer {
    pub fn len(&self) -> usize {
        match self {
            Buffer::Bool(v) => v.len(),
            Buffer::String(v) => v.len(),
            Buffer::Int8(v) => v.len(),
            Buffer::Int16(v) => v.len(),
            Buffer::Int32(v) => v.len(),
            Buffer::Int64(v) => v.len(),
            Buffer::Uint8(v) => v.len(),
            Buffer::Uint16(v) => v.len(),
            Buffer::Uint32(v) => v.len(),
            Buffer::Uint64(v) => v.len(),
            Buffer::Float32(v) => v.len(),
            Buffer::Float64(v) => v.len(),
            Buffer::Complex64(v) => v.len(),
            Buffer::Complex128(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> Dtype {
        match self {
            Buffer::Bool(_) => Dtype::Bool,
            Buffer::String(_) => Dtype::String,
            Buffer::Int8(_) => Dtype::Num(NumType::Int8),
            Buffer::Int16(_) => Dtype::Num(NumType::Int16),
            Buffer::Int32(_) => Dtype::Num(NumType::Int32),
            Buffer::Int64(_) => Dtype::Num(NumType::Int64),
            Buffer::Uint8(_) => Dtype::Num(NumType::Uint8),
            Buffer::Uint16(_) => Dtype::Num(NumType::Uint16),
            Buffer::Uint32(_) => Dtype::Num(NumType::Uint32),
            Buffer::Uint64(_) => Dtype::Num(NumType::Uint64),
            Buffer::Float32(_) => Dtype::Num(NumType::Float32),
            Buffer::Float64(_) => Dtype::Num(NumType::Float64),
            Buffer::Complex64(_) => Dtype::Num(NumType::Complex64),
            Buffer::Complex128(_) => Dtype::Num(NumType::Complex128),
        }
    }
}

/// A typed buffer with a shape. An empty shape marks a scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    shape: Vec<usize>,
    buffer: Buffer,
}

impl Dataset {
    /// Dataset from a buffer and shape; element count must match.
    pub fn new(buffer: Buffer, shape: Vec<usize>) -> ScribeResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != buffer.len() {
            return Err(ScribeError::type_error(format!(
                "dataset size mismatch: {} elements for shape {:?}",
                buffer.len(),
                shape
            )));
        }
        Ok(Self { shape, buffer })
    }

    /// Single-element scalar dataset.
    pub fn scalar(buffer: Buffer) -> ScribeResult<Self> {
        if buffer.len() != 1 {
            return Err(ScribeError::type_error(format!(
                "scalar dataset needs exactly one element, got {}",
                buffer.len()
            )));
        }
        Ok(Self {
            shape: Vec::new(),
            buffer,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    pub fn dtype(&self) -> Dtype {
        self.buffer.dtype()
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
}

/// Named children in insertion order; keys are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    entries: Vec<(String, HierNode)>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&HierNode> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert a child, replacing in place if the key already exists.
    pub fn insert(&mut self, key: impl Into<String>, node: HierNode) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = node,
            None => self.entries.push((key, node)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HierNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// One node of the container tree.
#[derive(Debug, Clone, PartialEq)]
pub enum HierNode {
    Group(Group),
    Dataset(Dataset),
}

impl HierNode {
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            HierNode::Group(g) => Some(g),
            HierNode::Dataset(_) => None,
        }
    }

    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            HierNode::Dataset(d) => Some(d),
            HierNode::Group(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            HierNode::Group(_) => "group",
            HierNode::Dataset(_) => "dataset",
        }
    }
}
