//! Schema type definitions.
//!
//! A `Schema` is an immutable, reference-counted description of the
//! permissible shape of a Tome. Sub-schemas may be shared between
//! parents, so schemas form a DAG rather than a tree; cloning a handle
//! is cheap and never deep-copies.
//!
//! Variants:
//! - none: nothing is valid
//! - any: every Tome is valid
//! - bool: boolean scalar
//! - number: one of the 12 numeric kinds, range-checked
//! - string: optional length bounds
//! - array: element schema plus optional shape (-1 = wildcard dim)
//! - record: ordered items of (key, schema, optional)

use std::sync::{Arc, OnceLock};

/// The closed set of atomic numeric kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl NumType {
    /// All twelve kinds, in canonical order.
    pub const ALL: [NumType; 12] = [
        NumType::Int8,
        NumType::Int16,
        NumType::Int32,
        NumType::Int64,
        NumType::Uint8,
        NumType::Uint16,
        NumType::Uint32,
        NumType::Uint64,
        NumType::Float32,
        NumType::Float64,
        NumType::Complex64,
        NumType::Complex128,
    ];

    /// Canonical lowercase name used in schema documents.
    pub fn name(&self) -> &'static str {
        match self {
            NumType::Int8 => "int8",
            NumType::Int16 => "int16",
            NumType::Int32 => "int32",
            NumType::Int64 => "int64",
            NumType::Uint8 => "uint8",
            NumType::Uint16 => "uint16",
            NumType::Uint32 => "uint32",
            NumType::Uint64 => "uint64",
            NumType::Float32 => "float32",
            NumType::Float64 => "float64",
            NumType::Complex64 => "complex64",
            NumType::Complex128 => "complex128",
        }
    }

    /// Parse a canonical name back into a kind.
    pub fn from_name(name: &str) -> Option<NumType> {
        NumType::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            NumType::Int8
                | NumType::Int16
                | NumType::Int32
                | NumType::Int64
                | NumType::Uint8
                | NumType::Uint16
                | NumType::Uint32
                | NumType::Uint64
        )
    }

    pub fn is_real(&self) -> bool {
        matches!(self, NumType::Float32 | NumType::Float64)
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, NumType::Complex64 | NumType::Complex128)
    }
}

impl std::fmt::Display for NumType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Optional, purely informational schema metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMetadata {
    /// Identifier for the schema; empty if absent.
    pub name: String,
    /// Human-readable description; empty if absent.
    pub description: String,
}

/// Numeric schema: kind plus (future) range bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberSchema {
    pub num_type: NumType,
}

impl NumberSchema {
    pub fn new(num_type: NumType) -> Self {
        Self { num_type }
    }

    pub fn is_integer(&self) -> bool {
        self.num_type.is_integer()
    }

    pub fn is_real(&self) -> bool {
        self.num_type.is_real()
    }

    pub fn is_complex(&self) -> bool {
        self.num_type.is_complex()
    }

    /// Validate a signed integer against the kind's range. Floating and
    /// complex kinds accept any integer.
    pub fn validate_i64(&self, value: i64) -> bool {
        match self.num_type {
            NumType::Int8 => i8::try_from(value).is_ok(),
            NumType::Int16 => i16::try_from(value).is_ok(),
            NumType::Int32 => i32::try_from(value).is_ok(),
            NumType::Int64 => true,
            NumType::Uint8 => u8::try_from(value).is_ok(),
            NumType::Uint16 => u16::try_from(value).is_ok(),
            NumType::Uint32 => u32::try_from(value).is_ok(),
            NumType::Uint64 => value >= 0,
            NumType::Float32
            | NumType::Float64
            | NumType::Complex64
            | NumType::Complex128 => true,
        }
    }

    /// Validate an unsigned integer against the kind's range.
    pub fn validate_u64(&self, value: u64) -> bool {
        match self.num_type {
            NumType::Int8 => i8::try_from(value).is_ok(),
            NumType::Int16 => i16::try_from(value).is_ok(),
            NumType::Int32 => i32::try_from(value).is_ok(),
            NumType::Int64 => i64::try_from(value).is_ok(),
            NumType::Uint8 => u8::try_from(value).is_ok(),
            NumType::Uint16 => u16::try_from(value).is_ok(),
            NumType::Uint32 => u32::try_from(value).is_ok(),
            NumType::Uint64 => true,
            NumType::Float32
            | NumType::Float64
            | NumType::Complex64
            | NumType::Complex128 => true,
        }
    }

    /// Validate a real value. Integer kinds reject floats outright:
    /// a float that happens to be integral does not satisfy an integer
    /// schema, the tagging in the document is part of the contract.
    pub fn validate_f64(&self, _value: f64) -> bool {
        !self.is_integer()
    }

    /// Validate a complex value. Only complex kinds accept one.
    pub fn validate_complex(&self, _re: f64, _im: f64) -> bool {
        self.is_complex()
    }
}

/// String schema with optional length bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringSchema {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

impl StringSchema {
    /// Validate a string's length against the bounds.
    pub fn validate(&self, value: &str) -> bool {
        let len = value.chars().count() as u64;
        if let Some(min) = self.min_length {
            if len < min {
                return false;
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return false;
            }
        }
        true
    }
}

/// Array schema: element schema plus optional declared shape.
///
/// A shape entry of -1 is a wildcard matching any observed size.
#[derive(Debug, Clone)]
pub struct ArraySchema {
    pub elements: Schema,
    pub shape: Option<Vec<i64>>,
}

impl ArraySchema {
    /// Validate an observed shape against the declared one. Rank must
    /// match exactly; non-wildcard dims must match exactly. Without a
    /// declared shape every observed shape is acceptable.
    pub fn validate_shape(&self, observed: &[usize]) -> bool {
        let Some(declared) = &self.shape else {
            return true;
        };
        if declared.len() != observed.len() {
            return false;
        }
        declared
            .iter()
            .zip(observed)
            .all(|(&want, &got)| want == -1 || want == got as i64)
    }
}

/// One declared item of a record schema.
#[derive(Debug, Clone)]
pub struct ItemSchema {
    pub key: String,
    pub schema: Schema,
    pub optional: bool,
}

impl ItemSchema {
    pub fn required(key: impl Into<String>, schema: Schema) -> Self {
        Self {
            key: key.into(),
            schema,
            optional: false,
        }
    }

    pub fn optional(key: impl Into<String>, schema: Schema) -> Self {
        Self {
            key: key.into(),
            schema,
            optional: true,
        }
    }
}

/// Record schema: ordered items with unique keys.
#[derive(Debug, Clone, Default)]
pub struct RecordSchema {
    pub items: Vec<ItemSchema>,
}

impl RecordSchema {
    fn find_key(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|item| item.key == key)
    }

    /// Match a list of observed keys against the declared items.
    ///
    /// Every observed key must name some item, and every non-optional
    /// item must appear among the observed keys. On success returns the
    /// matched sub-schemas in observed-key order. On failure returns a
    /// message naming the offending key; the caller attaches the path.
    pub fn validate(&self, keys: &[String]) -> Result<Vec<Schema>, String> {
        let mut found = vec![false; self.items.len()];
        let mut schemas = Vec::with_capacity(keys.len());

        for key in keys {
            match self.find_key(key) {
                Some(i) => {
                    found[i] = true;
                    schemas.push(self.items[i].schema.clone());
                }
                None => return Err(format!("unexpected key '{}'", key)),
            }
        }

        for (i, item) in self.items.iter().enumerate() {
            if !item.optional && !found[i] {
                return Err(format!("missing key '{}'", item.key));
            }
        }

        Ok(schemas)
    }

    /// Sub-schema declared for `key`, if any.
    pub fn schema_for(&self, key: &str) -> Option<&Schema> {
        self.find_key(key).map(|i| &self.items[i].schema)
    }
}

/// The algebraic schema node.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    None,
    Any,
    Bool,
    Number(NumberSchema),
    String(StringSchema),
    Array(ArraySchema),
    Record(RecordSchema),
}

#[derive(Debug)]
struct SchemaData {
    node: SchemaNode,
    metadata: SchemaMetadata,
}

/// Shared immutable handle to a schema node.
///
/// Value-typed and cheap to clone; the pointee is never mutated after
/// construction. The default schema is the interned `any` sentinel, so
/// default construction allocates nothing.
#[derive(Debug, Clone)]
pub struct Schema {
    inner: Arc<SchemaData>,
}

fn any_sentinel() -> &'static Schema {
    static ANY: OnceLock<Schema> = OnceLock::new();
    ANY.get_or_init(|| {
        Schema {
            inner: Arc::new(SchemaData {
                node: SchemaNode::Any,
                metadata: SchemaMetadata::default(),
            }),
        }
    })
}

impl Default for Schema {
    fn default() -> Self {
        any_sentinel().clone()
    }
}

impl Schema {
    /// Wrap a node with empty metadata.
    pub fn new(node: SchemaNode) -> Self {
        Self::with_metadata(node, SchemaMetadata::default())
    }

    /// Wrap a node with the given metadata.
    pub fn with_metadata(node: SchemaNode, metadata: SchemaMetadata) -> Self {
        Self {
            inner: Arc::new(SchemaData { node, metadata }),
        }
    }

    // Shorthands for simple schemas.

    pub fn none() -> Self {
        Self::new(SchemaNode::None)
    }

    pub fn any() -> Self {
        any_sentinel().clone()
    }

    pub fn boolean() -> Self {
        Self::new(SchemaNode::Bool)
    }

    pub fn number(num_type: NumType) -> Self {
        Self::new(SchemaNode::Number(NumberSchema::new(num_type)))
    }

    pub fn string() -> Self {
        Self::new(SchemaNode::String(StringSchema::default()))
    }

    pub fn array(elements: Schema, shape: Option<Vec<i64>>) -> Self {
        Self::new(SchemaNode::Array(ArraySchema { elements, shape }))
    }

    pub fn record(items: Vec<ItemSchema>) -> Self {
        Self::new(SchemaNode::Record(RecordSchema { items }))
    }

    /// The underlying node; the single dispatch point for all drivers.
    pub fn node(&self) -> &SchemaNode {
        &self.inner.node
    }

    pub fn metadata(&self) -> &SchemaMetadata {
        &self.inner.metadata
    }

    pub fn name(&self) -> &str {
        &self.inner.metadata.name
    }

    pub fn description(&self) -> &str {
        &self.inner.metadata.description
    }

    /// The `type` string this schema serializes under.
    pub fn type_name(&self) -> &'static str {
        match self.node() {
            SchemaNode::None => "none",
            SchemaNode::Any => "any",
            SchemaNode::Bool => "bool",
            SchemaNode::Number(n) => n.num_type.name(),
            SchemaNode::String(_) => "string",
            SchemaNode::Array(_) => "array",
            SchemaNode::Record(_) => "record",
        }
    }

    /// Identity comparison (handle, not structure). Shared sub-schemas
    /// compare equal through any parent that reuses them.
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stable identity key, usable for deduplication maps.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}
