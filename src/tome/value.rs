//! The Tome: a dynamically tagged value.
//!
//! A Tome holds exactly one of: a bool or string scalar, one of the 12
//! numeric atoms, one of the 12 homogeneous numeric n-arrays, a
//! heterogeneous n-array of Tomes, or a string-keyed record of Tomes.
//! Tomes have value semantics; clones mutate independently. The
//! default-constructed Tome is the empty record.

use std::fmt;

use crate::error::{ScribeError, ScribeResult};
use crate::schema::NumType;

use super::array::NdArray;

/// Complex number stored as a re/im pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    pub fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

impl<T: fmt::Display> fmt::Display for Complex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.re, self.im)
    }
}

/// String-keyed record of Tomes, preserving insertion order.
///
/// Keys are unique; inserting under an existing key replaces the value
/// in place without moving it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    entries: Vec<(String, Tome)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Tome> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Tome> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert a value, replacing in place if the key already exists.
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Tome>) -> Option<Tome> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Tome> {
        let i = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(i).1)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tome)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Tome)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Tome)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// The tagged value.
#[derive(Debug, Clone, PartialEq)]
pub enum Tome {
    Bool(bool),
    String(String),

    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    Complex64(Complex<f32>),
    Complex128(Complex<f64>),

    Int8Array(NdArray<i8>),
    Int16Array(NdArray<i16>),
    Int32Array(NdArray<i32>),
    Int64Array(NdArray<i64>),
    Uint8Array(NdArray<u8>),
    Uint16Array(NdArray<u16>),
    Uint32Array(NdArray<u32>),
    Uint64Array(NdArray<u64>),
    Float32Array(NdArray<f32>),
    Float64Array(NdArray<f64>),
    Complex64Array(NdArray<Complex<f32>>),
    Complex128Array(NdArray<Complex<f64>>),

    /// Heterogeneous n-array.
    Array(NdArray<Tome>),
    /// String-keyed record.
    Record(Record),
}

impl Default for Tome {
    fn default() -> Self {
        Tome::Record(Record::new())
    }
}

impl Tome {
    // ---- pseudo-constructors -------------------------------------------

    pub fn boolean(value: bool) -> Self {
        Tome::Bool(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Tome::String(value.into())
    }

    /// Empty record.
    pub fn record() -> Self {
        Tome::Record(Record::new())
    }

    /// 1-D heterogeneous array.
    pub fn array(elements: Vec<Tome>) -> Self {
        Tome::Array(NdArray::from_vec(elements))
    }

    /// Heterogeneous array with an explicit shape.
    pub fn array_with_shape(elements: Vec<Tome>, shape: Vec<usize>) -> ScribeResult<Self> {
        Ok(Tome::Array(NdArray::from_flat(elements, shape)?))
    }

    /// Cast an i64 to the atom of the requested kind, without range
    /// checks. Backend helper, used after validation.
    pub fn from_i64_unchecked(value: i64, num_type: NumType) -> Self {
        match num_type {
            NumType::Int8 => Tome::Int8(value as i8),
            NumType::Int16 => Tome::Int16(value as i16),
            NumType::Int32 => Tome::Int32(value as i32),
            NumType::Int64 => Tome::Int64(value),
            NumType::Uint8 => Tome::Uint8(value as u8),
            NumType::Uint16 => Tome::Uint16(value as u16),
            NumType::Uint32 => Tome::Uint32(value as u32),
            NumType::Uint64 => Tome::Uint64(value as u64),
            NumType::Float32 => Tome::Float32(value as f32),
            NumType::Float64 => Tome::Float64(value as f64),
            NumType::Complex64 => Tome::Complex64(Complex::new(value as f32, 0.0)),
            NumType::Complex128 => Tome::Complex128(Complex::new(value as f64, 0.0)),
        }
    }

    /// Cast a u64 to the atom of the requested kind, without range checks.
    pub fn from_u64_unchecked(value: u64, num_type: NumType) -> Self {
        match num_type {
            NumType::Int8 => Tome::Int8(value as i8),
            NumType::Int16 => Tome::Int16(value as i16),
            NumType::Int32 => Tome::Int32(value as i32),
            NumType::Int64 => Tome::Int64(value as i64),
            NumType::Uint8 => Tome::Uint8(value as u8),
            NumType::Uint16 => Tome::Uint16(value as u16),
            NumType::Uint32 => Tome::Uint32(value as u32),
            NumType::Uint64 => Tome::Uint64(value),
            NumType::Float32 => Tome::Float32(value as f32),
            NumType::Float64 => Tome::Float64(value as f64),
            NumType::Complex64 => Tome::Complex64(Complex::new(value as f32, 0.0)),
            NumType::Complex128 => Tome::Complex128(Complex::new(value as f64, 0.0)),
        }
    }

    /// Cast an f64 to the atom of the requested kind, without range checks.
    pub fn from_f64_unchecked(value: f64, num_type: NumType) -> Self {
        match num_type {
            NumType::Int8 => Tome::Int8(value as i8),
            NumType::Int16 => Tome::Int16(value as i16),
            NumType::Int32 => Tome::Int32(value as i32),
            NumType::Int64 => Tome::Int64(value as i64),
            NumType::Uint8 => Tome::Uint8(value as u8),
            NumType::Uint16 => Tome::Uint16(value as u16),
            NumType::Uint32 => Tome::Uint32(value as u32),
            NumType::Uint64 => Tome::Uint64(value as u64),
            NumType::Float32 => Tome::Float32(value as f32),
            NumType::Float64 => Tome::Float64(value),
            NumType::Complex64 => Tome::Complex64(Complex::new(value as f32, 0.0)),
            NumType::Complex128 => Tome::Complex128(Complex::new(value, 0.0)),
        }
    }

    /// Build a complex atom of the requested kind. Panics on a
    /// non-complex kind; that is a programming fault, not input error.
    pub fn from_complex_unchecked(re: f64, im: f64, num_type: NumType) -> Self {
        match num_type {
            NumType::Complex64 => Tome::Complex64(Complex::new(re as f32, im as f32)),
            NumType::Complex128 => Tome::Complex128(Complex::new(re, im)),
            other => panic!("from_complex_unchecked called with {}", other),
        }
    }

    // ---- kind checks ---------------------------------------------------

    /// Short kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Tome::Bool(_) => "bool",
            Tome::String(_) => "string",
            Tome::Int8(_) => "int8",
            Tome::Int16(_) => "int16",
            Tome::Int32(_) => "int32",
            Tome::Int64(_) => "int64",
            Tome::Uint8(_) => "uint8",
            Tome::Uint16(_) => "uint16",
            Tome::Uint32(_) => "uint32",
            Tome::Uint64(_) => "uint64",
            Tome::Float32(_) => "float32",
            Tome::Float64(_) => "float64",
            Tome::Complex64(_) => "complex64",
            Tome::Complex128(_) => "complex128",
            Tome::Int8Array(_) => "int8 array",
            Tome::Int16Array(_) => "int16 array",
            Tome::Int32Array(_) => "int32 array",
            Tome::Int64Array(_) => "int64 array",
            Tome::Uint8Array(_) => "uint8 array",
            Tome::Uint16Array(_) => "uint16 array",
            Tome::Uint32Array(_) => "uint32 array",
            Tome::Uint64Array(_) => "uint64 array",
            Tome::Float32Array(_) => "float32 array",
            Tome::Float64Array(_) => "float64 array",
            Tome::Complex64Array(_) => "complex64 array",
            Tome::Complex128Array(_) => "complex128 array",
            Tome::Array(_) => "array",
            Tome::Record(_) => "record",
        }
    }

    /// Numeric kind of an atom or homogeneous array, if it has one.
    pub fn num_type(&self) -> Option<NumType> {
        match self {
            Tome::Int8(_) | Tome::Int8Array(_) => Some(NumType::Int8),
            Tome::Int16(_) | Tome::Int16Array(_) => Some(NumType::Int16),
            Tome::Int32(_) | Tome::Int32Array(_) => Some(NumType::Int32),
            Tome::Int64(_) | Tome::Int64Array(_) => Some(NumType::Int64),
            Tome::Uint8(_) | Tome::Uint8Array(_) => Some(NumType::Uint8),
            Tome::Uint16(_) | Tome::Uint16Array(_) => Some(NumType::Uint16),
            Tome::Uint32(_) | Tome::Uint32Array(_) => Some(NumType::Uint32),
            Tome::Uint64(_) | Tome::Uint64Array(_) => Some(NumType::Uint64),
            Tome::Float32(_) | Tome::Float32Array(_) => Some(NumType::Float32),
            Tome::Float64(_) | Tome::Float64Array(_) => Some(NumType::Float64),
            Tome::Complex64(_) | Tome::Complex64Array(_) => Some(NumType::Complex64),
            Tome::Complex128(_) | Tome::Complex128Array(_) => Some(NumType::Complex128),
            _ => None,
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Tome::Bool(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Tome::String(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.num_type(), Some(t) if t.is_integer()) && !self.is_numeric_array()
    }

    pub fn is_real(&self) -> bool {
        matches!(self.num_type(), Some(t) if t.is_real()) && !self.is_numeric_array()
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.num_type(), Some(t) if t.is_complex()) && !self.is_numeric_array()
    }

    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_real() || self.is_complex()
    }

    pub fn is_atomic(&self) -> bool {
        self.is_boolean() || self.is_string() || self.is_number()
    }

    pub fn is_numeric_array(&self) -> bool {
        matches!(
            self,
            Tome::Int8Array(_)
                | Tome::Int16Array(_)
                | Tome::Int32Array(_)
                | Tome::Int64Array(_)
                | Tome::Uint8Array(_)
                | Tome::Uint16Array(_)
                | Tome::Uint32Array(_)
                | Tome::Uint64Array(_)
                | Tome::Float32Array(_)
                | Tome::Float64Array(_)
                | Tome::Complex64Array(_)
                | Tome::Complex128Array(_)
        )
    }

    /// Heterogeneous array check.
    pub fn is_generic_array(&self) -> bool {
        matches!(self, Tome::Array(_))
    }

    pub fn is_array(&self) -> bool {
        self.is_numeric_array() || self.is_generic_array()
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Tome::Record(_))
    }

    pub fn is_compound(&self) -> bool {
        self.is_array() || self.is_record()
    }

    // ---- checked accessors ---------------------------------------------

    fn wrong_kind(&self, expected: &str) -> ScribeError {
        ScribeError::type_error(format!(
            "Tome is a {}, not a {}",
            self.kind_name(),
            expected
        ))
    }

    pub fn as_bool(&self) -> ScribeResult<bool> {
        match self {
            Tome::Bool(b) => Ok(*b),
            other => Err(other.wrong_kind("bool")),
        }
    }

    pub fn as_str(&self) -> ScribeResult<&str> {
        match self {
            Tome::String(s) => Ok(s),
            other => Err(other.wrong_kind("string")),
        }
    }

    pub fn as_record(&self) -> ScribeResult<&Record> {
        match self {
            Tome::Record(r) => Ok(r),
            other => Err(other.wrong_kind("record")),
        }
    }

    pub fn as_record_mut(&mut self) -> ScribeResult<&mut Record> {
        match self {
            Tome::Record(r) => Ok(r),
            other => Err(other.wrong_kind("record")),
        }
    }

    pub fn as_generic_array(&self) -> ScribeResult<&NdArray<Tome>> {
        match self {
            Tome::Array(a) => Ok(a),
            other => Err(other.wrong_kind("array")),
        }
    }

    pub fn as_generic_array_mut(&mut self) -> ScribeResult<&mut NdArray<Tome>> {
        match self {
            Tome::Array(a) => Ok(a),
            other => Err(other.wrong_kind("array")),
        }
    }

    /// Any integer atom, widened. i128 also covers uint64.
    pub fn integer_value(&self) -> ScribeResult<i128> {
        match self {
            Tome::Int8(v) => Ok(*v as i128),
            Tome::Int16(v) => Ok(*v as i128),
            Tome::Int32(v) => Ok(*v as i128),
            Tome::Int64(v) => Ok(*v as i128),
            Tome::Uint8(v) => Ok(*v as i128),
            Tome::Uint16(v) => Ok(*v as i128),
            Tome::Uint32(v) => Ok(*v as i128),
            Tome::Uint64(v) => Ok(*v as i128),
            other => Err(other.wrong_kind("integer")),
        }
    }

    /// Any real atom, widened to f64.
    pub fn real_value(&self) -> ScribeResult<f64> {
        match self {
            Tome::Float32(v) => Ok(*v as f64),
            Tome::Float64(v) => Ok(*v),
            other => Err(other.wrong_kind("real number")),
        }
    }

    /// Any complex atom, widened to (f64, f64).
    pub fn complex_value(&self) -> ScribeResult<(f64, f64)> {
        match self {
            Tome::Complex64(c) => Ok((c.re as f64, c.im as f64)),
            Tome::Complex128(c) => Ok((c.re, c.im)),
            other => Err(other.wrong_kind("complex number")),
        }
    }

    // ---- array-like operations -----------------------------------------

    /// Element count of an array or record; fails on scalars.
    pub fn size(&self) -> ScribeResult<usize> {
        match self {
            Tome::Record(r) => Ok(r.len()),
            Tome::Array(a) => Ok(a.size()),
            Tome::Int8Array(a) => Ok(a.size()),
            Tome::Int16Array(a) => Ok(a.size()),
            Tome::Int32Array(a) => Ok(a.size()),
            Tome::Int64Array(a) => Ok(a.size()),
            Tome::Uint8Array(a) => Ok(a.size()),
            Tome::Uint16Array(a) => Ok(a.size()),
            Tome::Uint32Array(a) => Ok(a.size()),
            Tome::Uint64Array(a) => Ok(a.size()),
            Tome::Float32Array(a) => Ok(a.size()),
            Tome::Float64Array(a) => Ok(a.size()),
            Tome::Complex64Array(a) => Ok(a.size()),
            Tome::Complex128Array(a) => Ok(a.size()),
            other => Err(other.wrong_kind("array or record")),
        }
    }

    /// Shape of an array; fails on non-arrays (a scalar has no rank).
    pub fn shape(&self) -> ScribeResult<Vec<usize>> {
        match self {
            Tome::Array(a) => Ok(a.shape().to_vec()),
            Tome::Int8Array(a) => Ok(a.shape().to_vec()),
            Tome::Int16Array(a) => Ok(a.shape().to_vec()),
            Tome::Int32Array(a) => Ok(a.shape().to_vec()),
            Tome::Int64Array(a) => Ok(a.shape().to_vec()),
            Tome::Uint8Array(a) => Ok(a.shape().to_vec()),
            Tome::Uint16Array(a) => Ok(a.shape().to_vec()),
            Tome::Uint32Array(a) => Ok(a.shape().to_vec()),
            Tome::Uint64Array(a) => Ok(a.shape().to_vec()),
            Tome::Float32Array(a) => Ok(a.shape().to_vec()),
            Tome::Float64Array(a) => Ok(a.shape().to_vec()),
            Tome::Complex64Array(a) => Ok(a.shape().to_vec()),
            Tome::Complex128Array(a) => Ok(a.shape().to_vec()),
            other => Err(other.wrong_kind("array")),
        }
    }

    pub fn rank(&self) -> ScribeResult<usize> {
        Ok(self.shape()?.len())
    }

    /// Append to a 1-D heterogeneous array.
    pub fn push_back(&mut self, value: impl Into<Tome>) -> ScribeResult<()> {
        match self {
            Tome::Array(a) => a.push(value.into()),
            other if other.is_numeric_array() => Err(ScribeError::type_error(
                "called push_back on a compact numeric array",
            )),
            other => Err(other.wrong_kind("array")),
        }
    }

    /// Per-element atom Tomes of a compact numeric array, row-major.
    pub fn numeric_atoms(&self) -> ScribeResult<Vec<Tome>> {
        match self {
            Tome::Int8Array(a) => Ok(a.iter().map(|&v| Tome::Int8(v)).collect()),
            Tome::Int16Array(a) => Ok(a.iter().map(|&v| Tome::Int16(v)).collect()),
            Tome::Int32Array(a) => Ok(a.iter().map(|&v| Tome::Int32(v)).collect()),
            Tome::Int64Array(a) => Ok(a.iter().map(|&v| Tome::Int64(v)).collect()),
            Tome::Uint8Array(a) => Ok(a.iter().map(|&v| Tome::Uint8(v)).collect()),
            Tome::Uint16Array(a) => Ok(a.iter().map(|&v| Tome::Uint16(v)).collect()),
            Tome::Uint32Array(a) => Ok(a.iter().map(|&v| Tome::Uint32(v)).collect()),
            Tome::Uint64Array(a) => Ok(a.iter().map(|&v| Tome::Uint64(v)).collect()),
            Tome::Float32Array(a) => Ok(a.iter().map(|&v| Tome::Float32(v)).collect()),
            Tome::Float64Array(a) => Ok(a.iter().map(|&v| Tome::Float64(v)).collect()),
            Tome::Complex64Array(a) => Ok(a.iter().map(|&v| Tome::Complex64(v)).collect()),
            Tome::Complex128Array(a) => Ok(a.iter().map(|&v| Tome::Complex128(v)).collect()),
            other => Err(other.wrong_kind("numeric array")),
        }
    }

    // ---- record sugar --------------------------------------------------

    /// Value under `key` if this is a record and the key exists.
    pub fn get(&self, key: &str) -> Option<&Tome> {
        match self {
            Tome::Record(r) => r.get(key),
            _ => None,
        }
    }

    /// Insert into a record.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Tome>) -> ScribeResult<()> {
        self.as_record_mut()?.insert(key, value);
        Ok(())
    }
}

/// Panicking record access, for tests and exploratory code.
impl std::ops::Index<&str> for Tome {
    type Output = Tome;

    fn index(&self, key: &str) -> &Tome {
        self.get(key)
            .unwrap_or_else(|| panic!("no key '{}' in {}", key, self.kind_name()))
    }
}

/// Panicking flat access into a heterogeneous array.
impl std::ops::Index<usize> for Tome {
    type Output = Tome;

    fn index(&self, i: usize) -> &Tome {
        match self {
            Tome::Array(a) => &a.flat()[i],
            other => panic!("cannot index a {} by position", other.kind_name()),
        }
    }
}

fn fmt_nested<T>(
    f: &mut fmt::Formatter<'_>,
    shape: &[usize],
    flat: &[T],
    offset: &mut usize,
    write_elem: &mut impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    if shape.is_empty() {
        let elem = &flat[*offset];
        *offset += 1;
        return write_elem(f, elem);
    }
    write!(f, "[")?;
    for i in 0..shape[0] {
        if i > 0 {
            write!(f, ",")?;
        }
        fmt_nested(f, &shape[1..], flat, offset, write_elem)?;
    }
    write!(f, "]")
}

fn fmt_numeric_array<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    array: &NdArray<T>,
) -> fmt::Result {
    let mut offset = 0;
    fmt_nested(f, array.shape(), array.flat(), &mut offset, &mut |f, e| {
        write!(f, "{}", e)
    })
}

/// Compact JSON-like rendering: quoted strings, `[re,im]` complex
/// values, `{...}` records, nested row-major arrays.
impl fmt::Display for Tome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tome::Bool(b) => write!(f, "{}", b),
            Tome::String(s) => write!(f, "\"{}\"", s),
            Tome::Int8(v) => write!(f, "{}", v),
            Tome::Int16(v) => write!(f, "{}", v),
            Tome::Int32(v) => write!(f, "{}", v),
            Tome::Int64(v) => write!(f, "{}", v),
            Tome::Uint8(v) => write!(f, "{}", v),
            Tome::Uint16(v) => write!(f, "{}", v),
            Tome::Uint32(v) => write!(f, "{}", v),
            Tome::Uint64(v) => write!(f, "{}", v),
            Tome::Float32(v) => write!(f, "{}", v),
            Tome::Float64(v) => write!(f, "{}", v),
            Tome::Complex64(c) => write!(f, "{}", c),
            Tome::Complex128(c) => write!(f, "{}", c),
            Tome::Int8Array(a) => fmt_numeric_array(f, a),
            Tome::Int16Array(a) => fmt_numeric_array(f, a),
            Tome::Int32Array(a) => fmt_numeric_array(f, a),
            Tome::Int64Array(a) => fmt_numeric_array(f, a),
            Tome::Uint8Array(a) => fmt_numeric_array(f, a),
            Tome::Uint16Array(a) => fmt_numeric_array(f, a),
            Tome::Uint32Array(a) => fmt_numeric_array(f, a),
            Tome::Uint64Array(a) => fmt_numeric_array(f, a),
            Tome::Float32Array(a) => fmt_numeric_array(f, a),
            Tome::Float64Array(a) => fmt_numeric_array(f, a),
            Tome::Complex64Array(a) => fmt_numeric_array(f, a),
            Tome::Complex128Array(a) => fmt_numeric_array(f, a),
            Tome::Array(a) => {
                let mut offset = 0;
                fmt_nested(f, a.shape(), a.flat(), &mut offset, &mut |f, e| {
                    write!(f, "{}", e)
                })
            }
            Tome::Record(r) => {
                write!(f, "{{")?;
                for (i, (key, value)) in r.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "\"{}\":{}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
