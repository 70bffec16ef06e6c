//! Schema-directed driver for the text tree format.
//!
//! One recursion over schema nodes does three jobs: validate the
//! document, optionally materialize a Tome (reading), and emit a
//! document from a Tome (writing). Passing `None` as the destination
//! runs validation only; the outcome is identical to a full read minus
//! the allocation of the result.
//!
//! The driver tracks a lexical path and stamps it onto every error.

use serde_json::{Map, Value};

use crate::error::{ScribeError, ScribeResult};
use crate::path::{PathPart, PathStack};
use crate::schema::{ArraySchema, NumType, NumberSchema, RecordSchema, Schema, SchemaNode, StringSchema};
use crate::tome::{Complex, NdArray, Record, Tome};

/// Validate `doc` against `schema` and, if `dest` is given, materialize
/// the corresponding Tome into it.
pub fn read(dest: Option<&mut Tome>, doc: &Value, schema: &Schema) -> ScribeResult<()> {
    Driver::new().read(dest, doc, schema)
}

/// Validation-only entry point; no Tome is built.
pub fn validate(doc: &Value, schema: &Schema) -> ScribeResult<()> {
    Driver::new().read(None, doc, schema)
}

/// Emit a document from `tome` under `schema`.
pub fn write(tome: &Tome, schema: &Schema) -> ScribeResult<Value> {
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

    // ---- reading -------------------------------------------------------

    fn read(&mut self, dest: Option<&mut Tome>, doc: &Value, schema: &Schema) -> ScribeResult<()> {
        match schema.node() {
            SchemaNode::None => Err(self.validation("the 'none' schema is never valid")),
            SchemaNode::Any => self.read_any(dest, doc),
            SchemaNode::Bool => {
                let value = doc
                    .as_bool()
                    .ok_or_else(|| self.validation("expected boolean"))?;
                store(dest, Tome::Bool(value));
                Ok(())
            }
            SchemaNode::Number(n) => self.read_number(dest, doc, n),
            SchemaNode::String(s) => self.read_string(dest, doc, s),
            SchemaNode::Array(a) => self.read_array(dest, doc, a),
            SchemaNode::Record(r) => self.read_record(dest, doc, r),
        }
    }

    /// Under `any` the Tome mirrors the document's primitive kinds.
    /// Null has no Tome counterpart and fails.
    fn read_any(&mut self, dest: Option<&mut Tome>, doc: &Value) -> ScribeResult<()> {
        match doc {
            Value::Null => Err(self.validation("null is not representable")),
            Value::Bool(b) => {
                store(dest, Tome::Bool(*b));
                Ok(())
            }
            Value::Number(n) => {
                let tome = if let Some(i) = n.as_i64() {
                    Tome::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Tome::Uint64(u)
                } else {
                    Tome::Float64(n.as_f64().expect("JSON number is i64, u64 or f64"))
                };
                store(dest, tome);
                Ok(())
            }
            Value::String(s) => {
                store(dest, Tome::String(s.clone()));
                Ok(())
            }
            Value::Array(items) => match dest {
                Some(out) => {
                    let mut elems = Vec::with_capacity(items.len());
                    for (i, item) in items.iter().enumerate() {
                        let elem = self.scoped(PathPart::Index(i), |s| {
                            let mut child = Tome::default();
                            s.read_any(Some(&mut child), item)?;
                            Ok(child)
                        })?;
                        elems.push(elem);
                    }
                    *out = Tome::array(elems);
                    Ok(())
                }
                None => {
                    for (i, item) in items.iter().enumerate() {
                        self.scoped(PathPart::Index(i), |s| s.read_any(None, item))?;
                    }
                    Ok(())
                }
            },
            Value::Object(map) => match dest {
                Some(out) => {
                    let mut record = Record::new();
                    for (key, value) in map {
                        let child = self.scoped(PathPart::Key(key.clone()), |s| {
                            let mut child = Tome::default();
                            s.read_any(Some(&mut child), value)?;
                            Ok(child)
                        })?;
                        record.insert(key.clone(), child);
                    }
                    *out = Tome::Record(record);
                    Ok(())
                }
                None => {
                    for (key, value) in map {
                        self.scoped(PathPart::Key(key.clone()), |s| s.read_any(None, value))?;
                    }
                    Ok(())
                }
            },
        }
    }

    fn read_number(
        &mut self,
        dest: Option<&mut Tome>,
        doc: &Value,
        schema: &NumberSchema,
    ) -> ScribeResult<()> {
        let num_type = schema.num_type;

        if schema.is_integer() {
            let Value::Number(n) = doc else {
                return Err(self.validation("expected integer"));
            };
            if let Some(u) = n.as_u64() {
                if !schema.validate_u64(u) {
                    return Err(self.validation(format!("value {} out of range for {}", u, num_type)));
                }
                store(dest, Tome::from_u64_unchecked(u, num_type));
            } else if let Some(i) = n.as_i64() {
                if !schema.validate_i64(i) {
                    return Err(self.validation(format!("value {} out of range for {}", i, num_type)));
                }
                store(dest, Tome::from_i64_unchecked(i, num_type));
            } else {
                // a float primitive never satisfies an integer schema
                return Err(self.validation("expected integer"));
            }
            Ok(())
        } else if schema.is_real() {
            let Value::Number(n) = doc else {
                return Err(self.validation("expected real number"));
            };
            // integer primitives are acceptable for real kinds
            let value = n.as_f64().expect("JSON number converts to f64");
            if !schema.validate_f64(value) {
                return Err(self.validation(format!("value {} out of range for {}", value, num_type)));
            }
            store(dest, Tome::from_f64_unchecked(value, num_type));
            Ok(())
        } else {
            let (re, im) = self
                .complex_parts(doc)
                .ok_or_else(|| self.validation("expected complex number"))?;
            if !schema.validate_complex(re, im) {
                return Err(self.validation(format!("complex value out of range for {}", num_type)));
            }
            store(dest, Tome::from_complex_unchecked(re, im, num_type));
            Ok(())
        }
    }

    /// A complex number in the text format is a two-element array of
    /// numbers `[re, im]`.
    fn complex_parts(&self, doc: &Value) -> Option<(f64, f64)> {
        let items = doc.as_array()?;
        if items.len() != 2 {
            return None;
        }
        let re = items[0].as_f64()?;
        let im = items[1].as_f64()?;
        Some((re, im))
    }

    fn read_string(
        &mut self,
        dest: Option<&mut Tome>,
        doc: &Value,
        schema: &StringSchema,
    ) -> ScribeResult<()> {
        let value = doc
            .as_str()
            .ok_or_else(|| self.validation("expected string"))?;
        if !schema.validate(value) {
            return Err(self.validation(format!(
                "string of length {} violates the declared bounds",
                value.chars().count()
            )));
        }
        store(dest, Tome::String(value.to_string()));
        Ok(())
    }

    fn read_array(
        &mut self,
        dest: Option<&mut Tome>,
        doc: &Value,
        schema: &ArraySchema,
    ) -> ScribeResult<()> {
        // with no declared shape the rank is inferred from the document
        // and every dim becomes a wildcard
        let mut shape: Vec<i64> = match &schema.shape {
            Some(declared) => declared.clone(),
            None => vec![-1; infer_rank(doc, &schema.elements)],
        };

        match dest {
            Some(out) => {
                let mut elems = Vec::new();
                self.read_elements(Some(&mut elems), doc, &schema.elements, 0, &mut shape)?;
                let resolved: Vec<usize> = shape
                    .iter()
                    .map(|&d| if d < 0 { 0 } else { d as usize })
                    .collect();
                *out = build_array(elems, resolved, &schema.elements)?;
                Ok(())
            }
            None => self.read_elements(None, doc, &schema.elements, 0, &mut shape),
        }
    }

    /// Walk one document level per dimension. Non-final depths must be
    /// arrays of the expected size; wildcards resolve to the first
    /// observed size and bind for all siblings. The final depth
    /// delegates to the element schema.
    fn read_elements(
        &mut self,
        mut sink: Option<&mut Vec<Tome>>,
        doc: &Value,
        elements: &Schema,
        dim: usize,
        shape: &mut Vec<i64>,
    ) -> ScribeResult<()> {
        if dim == shape.len() {
            return match sink {
                Some(elems) => {
                    let mut child = Tome::default();
                    self.read(Some(&mut child), doc, elements)?;
                    elems.push(child);
                    Ok(())
                }
                None => self.read(None, doc, elements),
            };
        }

        let Value::Array(items) = doc else {
            return Err(self.validation("expected array"));
        };
        if shape[dim] == -1 {
            shape[dim] = items.len() as i64;
        }
        if items.len() as i64 != shape[dim] {
            return Err(self.validation(format!("expected array of size {}", shape[dim])));
        }

        for (i, item) in items.iter().enumerate() {
            let child_sink = sink.as_mut().map(|v| &mut **v);
            let shape = &mut *shape;
            self.scoped(PathPart::Index(i), |s| {
                s.read_elements(child_sink, item, elements, dim + 1, shape)
            })?;
        }
        Ok(())
    }

    fn read_record(
        &mut self,
        dest: Option<&mut Tome>,
        doc: &Value,
        schema: &RecordSchema,
    ) -> ScribeResult<()> {
        let Value::Object(map) = doc else {
            return Err(self.validation("expected record"));
        };

        let keys: Vec<String> = map.keys().cloned().collect();
        let schemas = schema
            .validate(&keys)
            .map_err(|msg| self.validation(msg))?;

        match dest {
            Some(out) => {
                let mut record = Record::new();
                for ((key, value), item_schema) in map.iter().zip(&schemas) {
                    let child = self.scoped(PathPart::Key(key.clone()), |s| {
                        let mut child = Tome::default();
                        s.read(Some(&mut child), value, item_schema)?;
                        Ok(child)
                    })?;
                    record.insert(key.clone(), child);
                }
                *out = Tome::Record(record);
                Ok(())
            }
            None => {
                for ((key, value), item_schema) in map.iter().zip(&schemas) {
                    self.scoped(PathPart::Key(key.clone()), |s| {
                        s.read(None, value, item_schema)
                    })?;
                }
                Ok(())
            }
        }
    }

    // ---- writing -------------------------------------------------------

    fn write(&mut self, tome: &Tome, schema: &Schema) -> ScribeResult<Value> {
        match schema.node() {
            SchemaNode::None => Err(self.validation("the 'none' schema is never valid")),
            SchemaNode::Any => self.write_any(tome),
            SchemaNode::Bool => {
                let value = tome
                    .as_bool()
                    .map_err(|_| self.validation("expected boolean"))?;
                Ok(Value::Bool(value))
            }
            SchemaNode::Number(n) => self.write_number(tome, n),
            SchemaNode::String(s) => {
                let value = tome
                    .as_str()
                    .map_err(|_| self.validation("expected string"))?;
                if !s.validate(value) {
                    return Err(self.validation(format!(
                        "string of length {} violates the declared bounds",
                        value.chars().count()
                    )));
                }
                Ok(Value::String(value.to_string()))
            }
            SchemaNode::Array(a) => self.write_array(tome, a),
            SchemaNode::Record(r) => self.write_record(tome, r),
        }
    }

    /// Serialize any Tome variant: scalars as primitives, complex
    /// values as `[re, im]`, records as objects, arrays as nested
    /// document arrays.
    fn write_any(&mut self, tome: &Tome) -> ScribeResult<Value> {
        match tome {
            Tome::Bool(b) => Ok(Value::Bool(*b)),
            Tome::String(s) => Ok(Value::String(s.clone())),
            Tome::Int8(v) => Ok(json_int(*v as i64)),
            Tome::Int16(v) => Ok(json_int(*v as i64)),
            Tome::Int32(v) => Ok(json_int(*v as i64)),
            Tome::Int64(v) => Ok(json_int(*v)),
            Tome::Uint8(v) => Ok(json_uint(*v as u64)),
            Tome::Uint16(v) => Ok(json_uint(*v as u64)),
            Tome::Uint32(v) => Ok(json_uint(*v as u64)),
            Tome::Uint64(v) => Ok(json_uint(*v)),
            Tome::Float32(v) => self.json_float(*v as f64),
            Tome::Float64(v) => self.json_float(*v),
            Tome::Complex64(c) => self.json_complex(c.re as f64, c.im as f64),
            Tome::Complex128(c) => self.json_complex(c.re, c.im),
            Tome::Int8Array(a) => self.nested(a.shape(), a.flat(), &mut |_, v| Ok(json_int(*v as i64))),
            Tome::Int16Array(a) => self.nested(a.shape(), a.flat(), &mut |_, v| Ok(json_int(*v as i64))),
            Tome::Int32Array(a) => self.nested(a.shape(), a.flat(), &mut |_, v| Ok(json_int(*v as i64))),
            Tome::Int64Array(a) => self.nested(a.shape(), a.flat(), &mut |_, v| Ok(json_int(*v))),
            Tome::Uint8Array(a) => self.nested(a.shape(), a.flat(), &mut |_, v| Ok(json_uint(*v as u64))),
            Tome::Uint16Array(a) => self.nested(a.shape(), a.flat(), &mut |_, v| Ok(json_uint(*v as u64))),
            Tome::Uint32Array(a) => self.nested(a.shape(), a.flat(), &mut |_, v| Ok(json_uint(*v as u64))),
            Tome::Uint64Array(a) => self.nested(a.shape(), a.flat(), &mut |_, v| Ok(json_uint(*v))),
            Tome::Float32Array(a) => {
                self.nested(a.shape(), a.flat(), &mut |s, v| s.json_float(*v as f64))
            }
            Tome::Float64Array(a) => self.nested(a.shape(), a.flat(), &mut |s, v| s.json_float(*v)),
            Tome::Complex64Array(a) => self.nested(a.shape(), a.flat(), &mut |s, c| {
                s.json_complex(c.re as f64, c.im as f64)
            }),
            Tome::Complex128Array(a) => {
                self.nested(a.shape(), a.flat(), &mut |s, c| s.json_complex(c.re, c.im))
            }
            Tome::Array(a) => self.nested(a.shape(), a.flat(), &mut |s, elem| s.write_any(elem)),
            Tome::Record(r) => {
                let mut map = Map::new();
                for (key, value) in r.iter() {
                    let emitted = self.scoped(PathPart::Key(key.to_string()), |s| {
                        s.write_any(value)
                    })?;
                    map.insert(key.to_string(), emitted);
                }
                Ok(Value::Object(map))
            }
        }
    }

    fn write_number(&mut self, tome: &Tome, schema: &NumberSchema) -> ScribeResult<Value> {
        if let Ok(v) = tome.integer_value() {
            let in_range = match i64::try_from(v) {
                Ok(i) => schema.validate_i64(i),
                Err(_) => schema.validate_u64(v as u64),
            };
            if !in_range {
                return Err(self.validation(format!(
                    "value {} out of range for {}",
                    v, schema.num_type
                )));
            }
            if schema.is_complex() {
                return self.json_complex(v as f64, 0.0);
            }
            Ok(if v < 0 {
                json_int(v as i64)
            } else {
                json_uint(v as u64)
            })
        } else if let Ok(v) = tome.real_value() {
            if !schema.validate_f64(v) {
                return Err(self.validation(format!("expected {}, got a real value", schema.num_type)));
            }
            if schema.is_complex() {
                return self.json_complex(v, 0.0);
            }
            self.json_float(v)
        } else if let Ok((re, im)) = tome.complex_value() {
            if !schema.validate_complex(re, im) {
                return Err(self.validation(format!(
                    "expected {}, got a complex value",
                    schema.num_type
                )));
            }
            self.json_complex(re, im)
        } else {
            Err(self.validation("expected number"))
        }
    }

    fn json_float(&self, value: f64) -> ScribeResult<Value> {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| {
                ScribeError::write(format!(
                    "non-finite value {} is not representable in the text format at {}",
                    value, self.path
                ))
            })
    }

    fn json_complex(&self, re: f64, im: f64) -> ScribeResult<Value> {
        Ok(Value::Array(vec![self.json_float(re)?, self.json_float(im)?]))
    }

    /// Emit a flat buffer as nested document arrays, row-major.
    fn nested<T>(
        &mut self,
        shape: &[usize],
        flat: &[T],
        to_value: &mut impl FnMut(&mut Self, &T) -> ScribeResult<Value>,
    ) -> ScribeResult<Value> {
        let mut offset = 0;
        self.nested_at(shape, flat, &mut offset, to_value)
    }

    fn nested_at<T>(
        &mut self,
        shape: &[usize],
        flat: &[T],
        offset: &mut usize,
        to_value: &mut impl FnMut(&mut Self, &T) -> ScribeResult<Value>,
    ) -> ScribeResult<Value> {
        if shape.is_empty() {
            let value = to_value(self, &flat[*offset])?;
            *offset += 1;
            return Ok(value);
        }
        let mut out = Vec::with_capacity(shape[0]);
        for i in 0..shape[0] {
            let offset = &mut *offset;
            let to_value = &mut *to_value;
            let value = self.scoped(PathPart::Index(i), |s| {
                s.nested_at(&shape[1..], flat, offset, to_value)
            })?;
            out.push(value);
        }
        Ok(Value::Array(out))
    }

    fn write_array(&mut self, tome: &Tome, schema: &ArraySchema) -> ScribeResult<Value> {
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

        match tome {
            Tome::Array(a) => {
                let elements = schema.elements.clone();
                self.nested(a.shape(), a.flat(), &mut |s, elem| s.write(elem, &elements))
            }
            _ => {
                // compact numeric buffers go through per-atom emission so
                // the element schema still validates every value
                let elems = tome.numeric_atoms()?;
                let elements = schema.elements.clone();
                self.nested(&shape, &elems, &mut |s, elem| s.write(elem, &elements))
            }
        }
    }

    fn write_record(&mut self, tome: &Tome, schema: &RecordSchema) -> ScribeResult<Value> {
        let record = tome
            .as_record()
            .map_err(|_| self.validation("expected record"))?;

        // schema-declared order keeps output deterministic
        let mut map = Map::new();
        for item in &schema.items {
            match record.get(&item.key) {
                Some(value) => {
                    let emitted = self.scoped(PathPart::Key(item.key.clone()), |s| {
                        s.write(value, &item.schema)
                    })?;
                    map.insert(item.key.clone(), emitted);
                }
                None => {
                    if !item.optional {
                        return Err(self.validation(format!("missing key '{}'", item.key)));
                    }
                }
            }
        }
        Ok(Value::Object(map))
    }
}

fn store(dest: Option<&mut Tome>, value: Tome) {
    if let Some(out) = dest {
        *out = value;
    }
}

fn json_int(v: i64) -> Value {
    Value::Number(serde_json::Number::from(v))
}

fn json_uint(v: u64) -> Value {
    Value::Number(serde_json::Number::from(v))
}

/// Probe the rank of a shape-less array by descending first elements.
/// Descent stops when the child is not an array or already satisfies
/// the element schema itself (complex atoms and nested array schemas
/// claim their own bracket levels). At least one level is an array.
fn infer_rank(doc: &Value, elements: &Schema) -> usize {
    let mut rank = 1;
    let mut current = doc;
    loop {
        let Value::Array(items) = current else { break };
        let Some(first) = items.first() else { break };
        if !first.is_array() {
            break;
        }
        if Driver::new().read(None, first, elements).is_ok() {
            break;
        }
        rank += 1;
        current = first;
    }
    rank
}

/// Assemble the final Tome from read elements. Homogeneous numeric
/// element schemas produce a compact typed buffer of the exact kind;
/// everything else stays a heterogeneous array.
fn build_array(elems: Vec<Tome>, shape: Vec<usize>, elements: &Schema) -> ScribeResult<Tome> {
    let SchemaNode::Number(n) = elements.node() else {
        return Ok(Tome::Array(NdArray::from_flat(elems, shape)?));
    };

    macro_rules! collect {
        ($atom:ident, $array:ident, $ty:ty) => {{
            let data: Vec<$ty> = elems
                .iter()
                .map(|t| match t {
                    Tome::$atom(v) => *v,
                    other => unreachable!(
                        "reader produced {} under a numeric schema",
                        other.kind_name()
                    ),
                })
                .collect();
            Tome::$array(NdArray::from_flat(data, shape)?)
        }};
    }

    Ok(match n.num_type {
        NumType::Int8 => collect!(Int8, Int8Array, i8),
        NumType::Int16 => collect!(Int16, Int16Array, i16),
        NumType::Int32 => collect!(Int32, Int32Array, i32),
        NumType::Int64 => collect!(Int64, Int64Array, i64),
        NumType::Uint8 => collect!(Uint8, Uint8Array, u8),
        NumType::Uint16 => collect!(Uint16, Uint16Array, u16),
        NumType::Uint32 => collect!(Uint32, Uint32Array, u32),
        NumType::Uint64 => collect!(Uint64, Uint64Array, u64),
        NumType::Float32 => collect!(Float32, Float32Array, f32),
        NumType::Float64 => collect!(Float64, Float64Array, f64),
        NumType::Complex64 => collect!(Complex64, Complex64Array, Complex<f32>),
        NumType::Complex128 => collect!(Complex128, Complex128Array, Complex<f64>),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(doc: serde_json::Value) -> Schema {
        Schema::from_value(&doc).unwrap()
    }

    fn read_tome(doc: &Value, schema: &Schema) -> ScribeResult<Tome> {
        let mut tome = Tome::default();
        read(Some(&mut tome), doc, schema)?;
        Ok(tome)
    }

    #[test]
    fn test_none_never_valid() {
        let err = validate(&json!(true), &Schema::none()).unwrap_err();
        assert!(matches!(err, ScribeError::Validation(_)));
    }

    #[test]
    fn test_bool_read() {
        let tome = read_tome(&json!(true), &Schema::boolean()).unwrap();
        assert_eq!(tome, Tome::Bool(true));
        assert!(validate(&json!(1), &Schema::boolean()).is_err());
    }

    #[test]
    fn test_integer_read_uses_exact_kind() {
        let tome = read_tome(&json!(42), &Schema::number(NumType::Int8)).unwrap();
        assert_eq!(tome, Tome::Int8(42));
        let tome = read_tome(&json!(42), &Schema::number(NumType::Uint32)).unwrap();
        assert_eq!(tome, Tome::Uint32(42));
    }

    #[test]
    fn test_integer_range_boundaries() {
        let int8 = Schema::number(NumType::Int8);
        assert!(validate(&json!(-128), &int8).is_ok());
        assert!(validate(&json!(-129), &int8).is_err());

        let uint64 = Schema::number(NumType::Uint64);
        assert!(validate(&json!(u64::MAX), &uint64).is_ok());
        assert!(validate(&json!(-1), &uint64).is_err());
    }

    #[test]
    fn test_integer_schema_rejects_float_primitive() {
        let err = validate(&json!(3.0), &Schema::number(NumType::Int32)).unwrap_err();
        assert!(err.to_string().contains("expected integer"));
    }

    #[test]
    fn test_real_schema_accepts_integer_primitive() {
        let tome = read_tome(&json!(7), &Schema::number(NumType::Float32)).unwrap();
        assert_eq!(tome, Tome::Float32(7.0));
        let tome = read_tome(&json!(2.5), &Schema::number(NumType::Float64)).unwrap();
        assert_eq!(tome, Tome::Float64(2.5));
    }

    #[test]
    fn test_complex_scalar_read() {
        let tome = read_tome(&json!([1.0, 2.0]), &Schema::number(NumType::Complex64)).unwrap();
        assert_eq!(tome, Tome::Complex64(Complex::new(1.0, 2.0)));
        assert!(validate(&json!([1.0]), &Schema::number(NumType::Complex64)).is_err());
        assert!(validate(&json!(1.0), &Schema::number(NumType::Complex64)).is_err());
    }

    #[test]
    fn test_any_mirrors_primitive_kinds() {
        let doc = json!({"flag": true, "n": -3, "big": u64::MAX, "x": 1.5, "s": "hi",
                         "seq": [1, "two"]});
        let tome = read_tome(&doc, &Schema::any()).unwrap();
        assert_eq!(tome["flag"], Tome::Bool(true));
        assert_eq!(tome["n"], Tome::Int64(-3));
        assert_eq!(tome["big"], Tome::Uint64(u64::MAX));
        assert_eq!(tome["x"], Tome::Float64(1.5));
        assert_eq!(tome["s"], Tome::string("hi"));
        assert_eq!(tome["seq"][1], Tome::string("two"));
    }

    #[test]
    fn test_any_rejects_null() {
        let err = validate(&json!({"a": null}), &Schema::any()).unwrap_err();
        assert!(err.to_string().contains("/a"));
    }

    #[test]
    fn test_nested_record_path_in_error() {
        let s = schema(json!({
            "type": "record",
            "items": [{"key": "foo", "type": "record",
                       "items": [{"key": "bar", "type": "int32"}]}]
        }));
        let err = validate(&json!({"foo": {"bar": "42"}}), &s).unwrap_err();
        assert!(err.to_string().contains("expected integer at /foo/bar"));
    }

    #[test]
    fn test_wildcard_binds_to_first_sibling() {
        let s = schema(json!({
            "type": "array", "shape": [2, -1], "elements": {"type": "int32"}
        }));
        let tome = read_tome(&json!([[1, 2, 3], [4, 5, 6]]), &s).unwrap();
        assert_eq!(tome.shape().unwrap(), vec![2, 3]);

        let err = validate(&json!([[1, 2, 3], [4, 5]]), &s).unwrap_err();
        assert!(err.to_string().contains("expected array of size 3 at /[1]"));
    }

    #[test]
    fn test_numeric_element_schema_builds_compact_buffer() {
        let s = schema(json!({
            "type": "array", "shape": [2, 2], "elements": {"type": "uint16"}
        }));
        let tome = read_tome(&json!([[1, 2], [3, 4]]), &s).unwrap();
        let Tome::Uint16Array(a) = &tome else {
            panic!("expected a compact uint16 buffer, got {}", tome.kind_name());
        };
        assert_eq!(a.flat(), &[1, 2, 3, 4]);
        assert_eq!(a.shape(), &[2, 2]);
    }

    #[test]
    fn test_complex_element_array() {
        let s = schema(json!({
            "type": "array", "shape": [2], "elements": {"type": "complex128"}
        }));
        let tome = read_tome(&json!([[1.0, 2.0], [3.0, 4.0]]), &s).unwrap();
        let Tome::Complex128Array(a) = &tome else {
            panic!("expected complex buffer");
        };
        assert_eq!(a.flat()[1], Complex::new(3.0, 4.0));
    }

    #[test]
    fn test_shapeless_array_infers_rank() {
        let s = schema(json!({"type": "array", "elements": {"type": "int32"}}));
        let tome = read_tome(&json!([[1, 2], [3, 4], [5, 6]]), &s).unwrap();
        assert_eq!(tome.shape().unwrap(), vec![3, 2]);

        let flat = read_tome(&json!([1, 2, 3]), &s).unwrap();
        assert_eq!(flat.shape().unwrap(), vec![3]);
    }

    #[test]
    fn test_shapeless_complex_array_keeps_pair_level() {
        let s = schema(json!({"type": "array", "elements": {"type": "complex64"}}));
        let tome = read_tome(&json!([[1.0, 2.0], [3.0, 4.0]]), &s).unwrap();
        assert_eq!(tome.shape().unwrap(), vec![2]);
    }

    #[test]
    fn test_empty_record_under_empty_schema() {
        let s = schema(json!({"type": "record", "items": []}));
        assert!(validate(&json!({}), &s).is_ok());
        assert!(validate(&json!({"extra": 1}), &s).is_err());
    }

    #[test]
    fn test_validate_matches_read_outcome() {
        let s = schema(json!({
            "type": "record",
            "items": [
                {"key": "ok", "type": "bool"},
                {"key": "xs", "type": "array", "shape": [-1], "elements": {"type": "float64"}}
            ]
        }));
        let good = json!({"ok": true, "xs": [1.0, 2.0]});
        let bad = json!({"ok": true, "xs": [1.0, "nope"]});

        for doc in [&good, &bad] {
            let validated = validate(doc, &s).is_ok();
            let mut tome = Tome::default();
            let read_back = read(Some(&mut tome), doc, &s).is_ok();
            assert_eq!(validated, read_back);
        }
    }

    #[test]
    fn test_write_record_in_schema_order_skipping_optionals() {
        let s = schema(json!({
            "type": "record",
            "items": [
                {"key": "a", "type": "int32"},
                {"key": "b", "optional": true, "type": "string"},
                {"key": "c", "type": "bool"}
            ]
        }));
        let mut tome = Tome::record();
        tome.insert("c", Tome::Bool(false)).unwrap();
        tome.insert("a", Tome::Int32(1)).unwrap();
        let doc = write(&tome, &s).unwrap();
        assert_eq!(doc, json!({"a": 1, "c": false}));
    }

    #[test]
    fn test_write_missing_required_key_fails() {
        let s = schema(json!({
            "type": "record", "items": [{"key": "a", "type": "int32"}]
        }));
        let err = write(&Tome::record(), &s).unwrap_err();
        assert!(err.to_string().contains("missing key 'a'"));
    }

    #[test]
    fn test_write_declared_shape_mismatch_fails() {
        let s = schema(json!({
            "type": "array", "shape": [3], "elements": {"type": "int32"}
        }));
        let tome = Tome::Int32Array(NdArray::from_vec(vec![1, 2]));
        let err = write(&tome, &s).unwrap_err();
        assert!(matches!(err, ScribeError::Validation(_)));
    }

    #[test]
    fn test_write_any_serializes_every_variant() {
        let mut tome = Tome::record();
        tome.insert("b", Tome::Bool(true)).unwrap();
        tome.insert("c", Tome::Complex128(Complex::new(1.0, -1.0)))
            .unwrap();
        tome.insert("m", Tome::Int16Array(NdArray::from_flat(vec![1, 2, 3, 4], vec![2, 2]).unwrap()))
            .unwrap();
        tome.insert("h", Tome::array(vec![Tome::string("x"), Tome::Int64(9)]))
            .unwrap();
        let doc = write(&tome, &Schema::any()).unwrap();
        assert_eq!(
            doc,
            json!({"b": true, "c": [1.0, -1.0], "m": [[1, 2], [3, 4]], "h": ["x", 9]})
        );
    }

    #[test]
    fn test_write_non_finite_real_is_write_error() {
        let err = write(&Tome::Float64(f64::NAN), &Schema::number(NumType::Float64)).unwrap_err();
        assert!(matches!(err, ScribeError::Write(_)));
    }

    #[test]
    fn test_roundtrip_preserves_value() {
        let s = schema(json!({
            "type": "record",
            "items": [
                {"key": "name", "type": "string"},
                {"key": "grid", "type": "array", "shape": [2, -1],
                 "elements": {"type": "float64"}},
                {"key": "meta", "type": "record", "items": [
                    {"key": "seed", "type": "uint64"}
                ]}
            ]
        }));
        let doc = json!({
            "name": "run-7",
            "grid": [[1.0, 2.0], [3.0, 4.0]],
            "meta": {"seed": 12345}
        });
        let tome = read_tome(&doc, &s).unwrap();
        let emitted = write(&tome, &s).unwrap();
        let reread = read_tome(&emitted, &s).unwrap();
        assert_eq!(tome, reread);
    }

    #[test]
    fn test_key_order_not_load_bearing() {
        let s = schema(json!({
            "type": "record",
            "items": [{"key": "a", "type": "int32"}, {"key": "b", "type": "bool"}]
        }));
        let forward: Value = serde_json::from_str(r#"{"a": 1, "b": true}"#).unwrap();
        let reversed: Value = serde_json::from_str(r#"{"b": true, "a": 1}"#).unwrap();
        assert_eq!(read_tome(&forward, &s).unwrap(), read_tome(&reversed, &s).unwrap());
    }
}
