//! Schema-directed driver for the hierarchical container.
//!
//! The same single recursion as the text driver, over groups and
//! datasets instead of JSON values: a record schema maps to a group
//! named after its items, an array schema to a dataset of matching
//! kind and shape, a scalar schema to a single-element dataset.
//! Complex values live in the container as paired floats, so no
//! bracket level is consumed for them.

use crate::error::{ScribeError, ScribeResult};
use crate::path::{PathPart, PathStack};
use crate::schema::{
    ArraySchema, NumType, NumberSchema, RecordSchema, Schema, SchemaNode, StringSchema,
};
use crate::tome::{NdArray, Record, Tome};

use super::tree::{Buffer, Dataset, Group, HierNode};

/// Validate `node` against `schema` and, if `dest` is given,
/// materialize the corresponding Tome into it.
pub fn read(dest: Option<&mut Tome>, node: &HierNode, schema: &Schema) -> ScribeResult<()> {
    Driver::new().read(dest, node, schema)
}

/// Validation-only entry point; no Tome is built.
pub fn validate(node: &HierNode, schema: &Schema) -> ScribeResult<()> {
    Driver::new().read(None, node, schema)
}

/// Emit a container tree from `tome` under `schema`.
pub fn write(tome: &Tome, schema: &Schema) -> ScribeResult<HierNode> {
    Driver::new().write(tome, schema)
}

struct Driver {
    path: PathStack,
}

impl Driver {
    fn new() -> Self {
        Self {
            path: PathStack::new(),
        }
    }

    fn scoped<T>(
        &mut self,
        part: PathPart,
        f: impl FnOnce(&mut Self) -> ScribeResult<T>,
    ) -> ScribeResult<T> {
        self.path.push(part);
        let result = f(self);
        self.path.pop();
        result
    }

    fn validation(&self, msg: impl std::fmt::Display) -> ScribeError {
        ScribeError::validation(format!("{} at {}", msg, self.path))
    }

    fn read_fault(&self, msg: impl std::fmt::Display) -> ScribeError {
        ScribeError::read(format!("{} at {}", msg, self.path))
    }

    fn write_fault(&self, msg: impl std::fmt::Display) -> ScribeError {
        ScribeError::write(format!("{} at {}", msg, self.path))
    }

    // ---- reading -------------------------------------------------------

    fn read(
        &mut self,
        dest: Option<&mut Tome>,
        node: &HierNode,
        schema: &Schema,
    ) -> ScribeResult<()> {
        match schema.node() {
            SchemaNode::None => Err(self.validation("the 'none' schema is never valid")),
            SchemaNode::Any => self.read_any(dest, node),
            SchemaNode::Bool => {
                let ds = self.expect_scalar(node, "boolean")?;
                match ds.buffer() {
                    Buffer::Bool(v) => {
                        store(dest, Tome::Bool(v[0]));
                        Ok(())
                    }
                    _ => Err(self.validation("expected boolean")),
                }
            }
            SchemaNode::Number(n) => {
                let ds = self.expect_scalar(node, "number")?;
                let atom = dataset_atoms(ds).remove(0);
                let cast = self.checked_number_cast(&atom, n)?;
                store(dest, cast);
                Ok(())
            }
            SchemaNode::String(s) => {
                let ds = self.expect_scalar(node, "string")?;
                match ds.buffer() {
                    Buffer::String(v) => {
                        self.check_string(&v[0], s)?;
                        store(dest, Tome::String(v[0].clone()));
                        Ok(())
                    }
                    _ => Err(self.validation("expected string")),
                }
            }
            SchemaNode::Array(a) => self.read_array(dest, node, a),
            SchemaNode::Record(r) => self.read_record(dest, node, r),
        }
    }

    fn expect_scalar<'a>(&self, node: &'a HierNode, what: &str) -> ScribeResult<&'a Dataset> {
        let ds = node
            .as_dataset()
            .ok_or_else(|| self.validation(format!("expected {}, found a group", what)))?;
        if ds.size() != 1 {
            return Err(self.validation(format!(
                "expected a single-element dataset for a {} scalar",
                what
            )));
        }
        Ok(ds)
    }

    fn check_string(&self, value: &str, schema: &StringSchema) -> ScribeResult<()> {
        if !schema.validate(value) {
            return Err(self.validation(format!(
                "string of length {} violates the declared bounds",
                value.chars().count()
            )));
        }
        Ok(())
    }

    /// Range-check an atom against a number schema and cast it to the
    /// schema's exact kind. Shared by the reader and the writer.
    fn checked_number_cast(&self, atom: &Tome, schema: &NumberSchema) -> ScribeResult<Tome> {
        let num_type = schema.num_type;
        if let Ok(v) = atom.integer_value() {
            let in_range = match i64::try_from(v) {
                Ok(i) => schema.validate_i64(i),
                Err(_) => schema.validate_u64(v as u64),
            };
            if !in_range {
                return Err(self.validation(format!("value {} out of range for {}", v, num_type)));
            }
            Ok(match i64::try_from(v) {
                Ok(i) => Tome::from_i64_unchecked(i, num_type),
                Err(_) => Tome::from_u64_unchecked(v as u64, num_type),
            })
        } else if let Ok(v) = atom.real_value() {
            if !schema.validate_f64(v) {
                return Err(self.validation(format!("expected {}, found a real value", num_type)));
            }
            Ok(Tome::from_f64_unchecked(v, num_type))
        } else if let Ok((re, im)) = atom.complex_value() {
            if !schema.validate_complex(re, im) {
                return Err(self.validation(format!(
                    "expected {}, found a complex value",
                    num_type
                )));
            }
            Ok(Tome::from_complex_unchecked(re, im, num_type))
        } else {
            Err(self.validation("expected number"))
        }
    }

    /// Under `any` the Tome mirrors the container's own structure:
    /// groups become records, scalar datasets become atoms, shaped
    /// datasets become arrays of their stored kind.
    fn read_any(&mut self, dest: Option<&mut Tome>, node: &HierNode) -> ScribeResult<()> {
        match node {
            HierNode::Group(group) => match dest {
                Some(out) => {
                    let mut record = Record::new();
                    for (key, child) in group.iter() {
                        let value = self.scoped(PathPart::Key(key.to_string()), |s| {
                            let mut child_tome = Tome::default();
                            s.read_any(Some(&mut child_tome), child)?;
                            Ok(child_tome)
                        })?;
                        record.insert(key.to_string(), value);
                    }
                    *out = Tome::Record(record);
                    Ok(())
                }
                None => {
                    for (key, child) in group.iter() {
                        self.scoped(PathPart::Key(key.to_string()), |s| s.read_any(None, child))?;
                    }
                    Ok(())
                }
            },
            HierNode::Dataset(ds) => {
                if dest.is_some() {
                    let mirrored = self.mirror_dataset(ds)?;
                    store(dest, mirrored);
                }
                Ok(())
            }
        }
    }

    fn mirror_dataset(&self, ds: &Dataset) -> ScribeResult<Tome> {
        if ds.is_scalar() {
            return Ok(dataset_atoms(ds).remove(0));
        }
        let shape = ds.shape().to_vec();
        Ok(match ds.buffer().clone() {
            Buffer::Bool(v) => Tome::Array(NdArray::from_flat(
                v.into_iter().map(Tome::Bool).collect(),
                shape,
            )?),
            Buffer::String(v) => Tome::Array(NdArray::from_flat(
                v.into_iter().map(Tome::String).collect(),
                shape,
            )?),
            Buffer::Int8(v) => Tome::Int8Array(NdArray::from_flat(v, shape)?),
            Buffer::Int16(v) => Tome::Int16Array(NdArray::from_flat(v, shape)?),
            Buffer::Int32(v) => Tome::Int32Array(NdArray::from_flat(v, shape)?),
            Buffer::Int64(v) => Tome::Int64Array(NdArray::from_flat(v, shape)?),
            Buffer::Uint8(v) => Tome::Uint8Array(NdArray::from_flat(v, shape)?),
            Buffer::Uint16(v) => Tome::Uint16Array(NdArray::from_flat(v, shape)?),
            Buffer::Uint32(v) => Tome::Uint32Array(NdArray::from_flat(v, shape)?),
            Buffer::Uint64(v) => Tome::Uint64Array(NdArray::from_flat(v, shape)?),
            Buffer::Float32(v) => Tome::Float32Array(NdArray::from_flat(v, shape)?),
            Buffer::Float64(v) => Tome::Float64Array(NdArray::from_flat(v, shape)?),
            Buffer::Complex64(v) => Tome::Complex64Array(NdArray::from_flat(v, shape)?),
            Buffer::Complex128(v) => Tome::Complex128Array(NdArray::from_flat(v, shape)?),
        })
    }

    fn read_array(
        &mut self,
        dest: Option<&mut Tome>,
        node: &HierNode,
        schema: &ArraySchema,
    ) -> ScribeResult<()> {
        let ds = node
            .as_dataset()
            .ok_or_else(|| self.validation("expected array, found a group"))?;
        if ds.is_scalar() {
            return Err(self.validation("expected array, found a scalar dataset"));
        }
        if !schema.validate_shape(ds.shape()) {
            return Err(self.validation(format!(
                "dataset shape {:?} does not match the declared shape {:?}",
                ds.shape(),
                schema.shape.as_deref().unwrap_or_default()
            )));
        }

        let shape = ds.shape().to_vec();
        match schema.elements.node() {
            SchemaNode::None => Err(self.validation("the 'none' schema is never valid")),
            SchemaNode::Any => {
                if dest.is_some() {
                    let mirrored = self.mirror_dataset(ds)?;
                    store(dest, mirrored);
                }
                Ok(())
            }
            SchemaNode::Number(n) => {
                let mut cast = Vec::with_capacity(ds.size());
                for (i, atom) in dataset_atoms(ds).into_iter().enumerate() {
                    let value = self.scoped(PathPart::Index(i), |s| {
                        s.checked_number_cast(&atom, n)
                    })?;
                    cast.push(value);
                }
                if dest.is_some() {
                    store(dest, collect_numeric(cast, shape, n.num_type)?);
                }
                Ok(())
            }
            SchemaNode::Bool => match ds.buffer() {
                Buffer::Bool(v) => {
                    if dest.is_some() {
                        let elems = v.iter().map(|&b| Tome::Bool(b)).collect();
                        store(dest, Tome::Array(NdArray::from_flat(elems, shape)?));
                    }
                    Ok(())
                }
                _ => Err(self.validation("expected boolean elements")),
            },
            SchemaNode::String(s) => match ds.buffer() {
                Buffer::String(v) => {
                    for (i, value) in v.iter().enumerate() {
                        self.scoped(PathPart::Index(i), |d| d.check_string(value, s))?;
                    }
                    if dest.is_some() {
                        let elems = v.iter().cloned().map(Tome::String).collect();
                        store(dest, Tome::Array(NdArray::from_flat(elems, shape)?));
                    }
                    Ok(())
                }
                _ => Err(self.validation("expected string elements")),
            },
            SchemaNode::Array(_) | SchemaNode::Record(_) => Err(self.read_fault(
                "datasets hold flat typed buffers; compound array elements are not representable",
            )),
        }
    }

    fn read_record(
        &mut self,
        dest: Option<&mut Tome>,
        node: &HierNode,
        schema: &RecordSchema,
    ) -> ScribeResult<()> {
        let group = node
            .as_group()
            .ok_or_else(|| self.validation("expected record, found a dataset"))?;

        let keys: Vec<String> = group.keys().map(str::to_string).collect();
        let schemas = schema
            .validate(&keys)
            .map_err(|msg| self.validation(msg))?;

        match dest {
            Some(out) => {
                let mut record = Record::new();
                for ((key, child), item_schema) in group.iter().zip(&schemas) {
                    let value = self.scoped(PathPart::Key(key.to_string()), |s| {
                        let mut child_tome = Tome::default();
                        s.read(Some(&mut child_tome), child, item_schema)?;
                        Ok(child_tome)
                    })?;
                    record.insert(key.to_string(), value);
                }
                *out = Tome::Record(record);
                Ok(())
            }
            None => {
                for ((key, child), item_schema) in group.iter().zip(&schemas) {
                    self.scoped(PathPart::Key(key.to_string()), |s| {
                        s.read(None, child, item_schema)
                    })?;
                }
                Ok(())
            }
        }
    }

    // ---- writing -------------------------------------------------------

    fn write(&mut self, tome: &Tome, schema: &Schema) -> ScribeResult<HierNode> {
        match schema.node() {
            SchemaNode::None => Err(self.validation("the 'none' schema is never valid")),
            SchemaNode::Any => self.write_any(tome),
            SchemaNode::Bool => {
                let value = tome
                    .as_bool()
                    .map_err(|_| self.validation("expected boolean"))?;
                Ok(HierNode::Dataset(Dataset::scalar(Buffer::Bool(vec![value]))?))
            }
            SchemaNode::Number(n) => {
                let cast = self.checked_number_cast(tome, n)?;
                let buffer = numeric_buffer(&[cast], n.num_type);
                Ok(HierNode::Dataset(Dataset::scalar(buffer)?))
            }
            SchemaNode::String(s) => {
                let value = tome
                    .as_str()
                    .map_err(|_| self.validation("expected string"))?;
                self.check_string(value, s)?;
                Ok(HierNode::Dataset(Dataset::scalar(Buffer::String(vec![
                    value.to_string(),
                ]))?))
            }
            SchemaNode::Array(a) => self.write_array(tome, a),
            SchemaNode::Record(r) => self.write_record(tome, r),
        }
    }

    fn write_any(&mut self, tome: &Tome) -> ScribeResult<HierNode> {
        match tome {
            Tome::Record(r) => {
                let mut group = Group::new();
                for (key, value) in r.iter() {
                    let child = self.scoped(PathPart::Key(key.to_string()), |s| {
                        s.write_any(value)
                    })?;
                    group.insert(key.to_string(), child);
                }
                Ok(HierNode::Group(group))
            }
            Tome::Array(a) => {
                let buffer = self.homogeneous_buffer(a.flat())?;
                Ok(HierNode::Dataset(Dataset::new(buffer, a.shape().to_vec())?))
            }
            other if other.is_numeric_array() => {
                let shape = other.shape()?;
                let num_type = other.num_type().expect("numeric arrays carry a kind");
                let buffer = numeric_buffer(&other.numeric_atoms()?, num_type);
                Ok(HierNode::Dataset(Dataset::new(buffer, shape)?))
            }
            Tome::Bool(b) => Ok(HierNode::Dataset(Dataset::scalar(Buffer::Bool(vec![*b]))?)),
            Tome::String(s) => Ok(HierNode::Dataset(Dataset::scalar(Buffer::String(vec![
                s.clone(),
            ]))?)),
            atom => {
                let num_type = atom
                    .num_type()
                    .expect("remaining variants are numeric atoms");
                let buffer = numeric_buffer(std::slice::from_ref(atom), num_type);
                Ok(HierNode::Dataset(Dataset::scalar(buffer)?))
            }
        }
    }

    /// Datasets are homogeneous; a heterogeneous Tome array fits only
    /// when every element shares one scalar kind.
    fn homogeneous_buffer(&self, elems: &[Tome]) -> ScribeResult<Buffer> {
        if elems.is_empty() {
            return Ok(Buffer::Float64(Vec::new()));
        }
        if elems.iter().all(|e| e.is_boolean()) {
            return Ok(Buffer::Bool(
                elems.iter().map(|e| e.as_bool().unwrap_or_default()).collect(),
            ));
        }
        if elems.iter().all(|e| e.is_string()) {
            return Ok(Buffer::String(
                elems
                    .iter()
                    .map(|e| e.as_str().unwrap_or_default().to_string())
                    .collect(),
            ));
        }
        let first_kind = elems[0].num_type();
        if let Some(num_type) = first_kind {
            if elems[0].is_number() && elems.iter().all(|e| e.num_type() == first_kind && e.is_number())
            {
                return Ok(numeric_buffer(elems, num_type));
            }
        }
        Err(self.write_fault(
            "mixed-kind array elements are not representable in the container format",
        ))
    }

    fn write_array(&mut self, tome: &Tome, schema: &ArraySchema) -> ScribeResult<HierNode> {
        if !tome.is_array() {
            return Err(self.validation("expected array"));
        }
        let shape = tome.shape()?;
        if !schema.validate_shape(&shape) {
            return Err(self.validation(format!(
                "array shape {:?} does not match the declared shape {:?}",
                shape,
                schema.shape.as_deref().unwrap_or_default()
            )));
        }

        let elems = match tome {
            Tome::Array(a) => a.flat().to_vec(),
            other => other.numeric_atoms()?,
        };

        match schema.elements.node() {
            SchemaNode::None => Err(self.validation("the 'none' schema is never valid")),
            SchemaNode::Any => {
                let buffer = self.homogeneous_buffer(&elems)?;
                Ok(HierNode::Dataset(Dataset::new(buffer, shape)?))
            }
            SchemaNode::Number(n) => {
                let mut cast = Vec::with_capacity(elems.len());
                for (i, elem) in elems.iter().enumerate() {
                    let value =
                        self.scoped(PathPart::Index(i), |s| s.checked_number_cast(elem, n))?;
                    cast.push(value);
                }
                let buffer = numeric_buffer(&cast, n.num_type);
                Ok(HierNode::Dataset(Dataset::new(buffer, shape)?))
            }
            SchemaNode::Bool => {
                let mut values = Vec::with_capacity(elems.len());
                for (i, elem) in elems.iter().enumerate() {
                    let value = self.scoped(PathPart::Index(i), |s| {
                        elem.as_bool().map_err(|_| s.validation("expected boolean"))
                    })?;
                    values.push(value);
                }
                Ok(HierNode::Dataset(Dataset::new(Buffer::Bool(values), shape)?))
            }
            SchemaNode::String(s) => {
                let mut values = Vec::with_capacity(elems.len());
                for (i, elem) in elems.iter().enumerate() {
                    let value = self.scoped(PathPart::Index(i), |d| {
                        let v = elem.as_str().map_err(|_| d.validation("expected string"))?;
                        d.check_string(v, s)?;
                        Ok(v.to_string())
                    })?;
                    values.push(value);
                }
                Ok(HierNode::Dataset(Dataset::new(
                    Buffer::String(values),
                    shape,
                )?))
            }
            SchemaNode::Array(_) | SchemaNode::Record(_) => Err(self.write_fault(
                "datasets hold flat typed buffers; compound array elements are not representable",
            )),
        }
    }

    fn write_record(&mut self, tome: &Tome, schema: &RecordSchema) -> ScribeResult<HierNode> {
        let record = tome
            .as_record()
            .map_err(|_| self.validation("expected record"))?;

        let mut group = Group::new();
        for item in &schema.items {
            match record.get(&item.key) {
                Some(value) => {
                    let child = self.scoped(PathPart::Key(item.key.clone()), |s| {
                        s.write(value, &item.schema)
                    })?;
                    group.insert(item.key.clone(), child);
                }
                None => {
                    if !item.optional {
                        return Err(self.validation(format!("missing key '{}'", item.key)));
                    }
                }
            }
        }
        Ok(HierNode::Group(group))
    }
}

fn store(dest: Option<&mut Tome>, value: Tome) {
    if let Some(out) = dest {
        *out = value;
    }
}

/// Atom view of every dataset element, row-major.
fn dataset_atoms(ds: &Dataset) -> Vec<Tome> {
    match ds.buffer() {
        Buffer::Bool(v) => v.iter().map(|&b| Tome::Bool(b)).collect(),
        Buffer::String(v) => v.iter().cloned().map(Tome::String).collect(),
        Buffer::Int8(v) => v.iter().map(|&x| Tome::Int8(x)).collect(),
        Buffer::Int16(v) => v.iter().map(|&x| Tome::Int16(x)).collect(),
        Buffer::Int32(v) => v.iter().map(|&x| Tome::Int32(x)).collect(),
        Buffer::Int64(v) => v.iter().map(|&x| Tome::Int64(x)).collect(),
        Buffer::Uint8(v) => v.iter().map(|&x| Tome::Uint8(x)).collect(),
        Buffer::Uint16(v) => v.iter().map(|&x| Tome::Uint16(x)).collect(),
        Buffer::Uint32(v) => v.iter().map(|&x| Tome::Uint32(x)).collect(),
        Buffer::Uint64(v) => v.iter().map(|&x| Tome::Uint64(x)).collect(),
        Buffer::Float32(v) => v.iter().map(|&x| Tome::Float32(x)).collect(),
        Buffer::Float64(v) => v.iter().map(|&x| Tome::Float64(x)).collect(),
        Buffer::Complex64(v) => v.iter().map(|&x| Tome::Complex64(x)).collect(),
        Buffer::Complex128(v) => v.iter().map(|&x| Tome::Complex128(x)).collect(),
    }
}

/// Pack atoms of one numeric kind into a compact Tome array.
fn collect_numeric(elems: Vec<Tome>, shape: Vec<usize>, num_type: NumType) -> ScribeResult<Tome> {
    macro_rules! collect {
        ($atom:ident, $array:ident) => {{
            let data = elems
                .iter()
                .map(|t| match t {
                    Tome::$atom(v) => *v,
                    other => unreachable!(
                        "cast produced {} under a numeric schema",
                        other.kind_name()
                    ),
                })
                .collect();
            Tome::$array(NdArray::from_flat(data, shape)?)
        }};
    }

    Ok(match num_type {
        NumType::Int8 => collect!(Int8, Int8Array),
        NumType::Int16 => collect!(Int16, Int16Array),
        NumType::Int32 => collect!(Int32, Int32Array),
        NumType::Int64 => collect!(Int64, Int64Array),
        NumType::Uint8 => collect!(Uint8, Uint8Array),
        NumType::Uint16 => collect!(Uint16, Uint16Array),
        NumType::Uint32 => collect!(Uint32, Uint32Array),
        NumType::Uint64 => collect!(Uint64, Uint64Array),
        NumType::Float32 => collect!(Float32, Float32Array),
        NumType::Float64 => collect!(Float64, Float64Array),
        NumType::Complex64 => collect!(Complex64, Complex64Array),
        NumType::Complex128 => collect!(Complex128, Complex128Array),
    })
}

/// Pack atoms of one numeric kind into a typed dataset buffer.
/// Callers pass atoms already cast to `num_type`.
fn numeric_buffer(elems: &[Tome], num_type: NumType) -> Buffer {
    macro_rules! pack {
        ($atom:ident, $buf:ident) => {
            Buffer::$buf(
                elems
                    .iter()
                    .map(|t| match t {
                        Tome::$atom(v) => *v,
                        other => unreachable!(
                            "cast produced {} for a {} buffer",
                            other.kind_name(),
                            num_type
                        ),
                    })
                    .collect(),
            )
        };
    }

    match num_type {
        NumType::Int8 => pack!(Int8, Int8),
        NumType::Int16 => pack!(Int16, Int16),
        NumType::Int32 => pack!(Int32, Int32),
        NumType::Int64 => pack!(Int64, Int64),
        NumType::Uint8 => pack!(Uint8, Uint8),
        NumType::Uint16 => pack!(Uint16, Uint16),
        NumType::Uint32 => pack!(Uint32, Uint32),
        NumType::Uint64 => pack!(Uint64, Uint64),
        NumType::Float32 => pack!(Float32, Float32),
        NumType::Float64 => pack!(Float64, Float64),
        NumType::Complex64 => pack!(Complex64, Complex64),
        NumType::Complex128 => pack!(Complex128, Complex128),
    }
}
