//! Binary wire codec for the hierarchical container.
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! file    := magic "SCRB" | version u16 | node
//! node    := 0x01 group | 0x02 dataset
//! group   := count u32 | count * (name string | node)
//! dataset := dtype u8 | rank u8 | rank * dim u64 | payload
//! string  := len u32 | len * utf8 byte
//! ```
//!
//! Payloads are packed per dtype: bools one byte each, strings
//! length-prefixed, numbers at their natural width, complex values as
//! re/im pairs.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ScribeError, ScribeResult};
use crate::schema::NumType;
use crate::tome::Complex;

use super::tree::{Buffer, Dataset, Dtype, Group, HierNode};

const MAGIC: &[u8; 4] = b"SCRB";
const VERSION: u16 = 1;

const TAG_GROUP: u8 = 0x01;
const TAG_DATASET: u8 = 0x02;

/// Encode a tree to a writer.
pub fn encode(node: &HierNode, out: &mut impl Write) -> ScribeResult<()> {
    out.write_all(MAGIC).map_err(write_failed)?;
    out.write_u16::<BigEndian>(VERSION).map_err(write_failed)?;
    encode_node(node, out)
}

/// Encode a tree to an owned byte vector.
pub fn encode_to_vec(node: &HierNode) -> ScribeResult<Vec<u8>> {
    let mut out = Vec::new();
    encode(node, &mut out)?;
    Ok(out)
}

/// Decode a tree from a reader.
pub fn decode(input: &mut impl Read) -> ScribeResult<HierNode> {
    let mut magic = [0u8; 4];
    input.read_exact(&mut magic).map_err(read_failed)?;
    if &magic != MAGIC {
        return Err(ScribeError::read(
            "not a scribe container (bad magic bytes)",
        ));
    }
    let version = input.read_u16::<BigEndian>().map_err(read_failed)?;
    if version != VERSION {
        return Err(ScribeError::read(format!(
            "unsupported container version {}",
            version
        )));
    }
    decode_node(input)
}

fn write_failed(e: std::io::Error) -> ScribeError {
    ScribeError::write(format!("container write failed: {}", e))
}

fn read_failed(e: std::io::Error) -> ScribeError {
    ScribeError::read(format!("container truncated or unreadable: {}", e))
}

fn dtype_code(dtype: Dtype) -> u8 {
    match dtype {
        Dtype::Bool => 0,
        Dtype::String => 1,
        Dtype::Num(NumType::Int8) => 2,
        Dtype::Num(NumType::Int16) => 3,
        Dtype::Num(NumType::Int32) => 4,
        Dtype::Num(NumType::Int64) => 5,
        Dtype::Num(NumType::Uint8) => 6,
        Dtype::Num(NumType::Uint16) => 7,
        Dtype::Num(NumType::Uint32) => 8,
        Dtype::Num(NumType::Uint64) => 9,
        Dtype::Num(NumType::Float32) => 10,
        Dtype::Num(NumType::Float64) => 11,
        Dtype::Num(NumType::Complex64) => 12,
        Dtype::Num(NumType::Complex128) => 13,
    }
}

fn dtype_from_code(code: u8) -> ScribeResult<Dtype> {
    Ok(match code {
        0 => Dtype::Bool,
        1 => Dtype::String,
        2 => Dtype::Num(NumType::Int8),
        3 => Dtype::Num(NumType::Int16),
        4 => Dtype::Num(NumType::Int32),
        5 => Dtype::Num(NumType::Int64),
        6 => Dtype::Num(NumType::Uint8),
        7 => Dtype::Num(NumType::Uint16),
        8 => Dtype::Num(NumType::Uint32),
        9 => Dtype::Num(NumType::Uint64),
        10 => Dtype::Num(NumType::Float32),
        11 => Dtype::Num(NumType::Float64),
        12 => Dtype::Num(NumType::Complex64),
        13 => Dtype::Num(NumType::Complex128),
        other => {
            return Err(ScribeError::read(format!(
                "unknown dataset element type code {}",
                other
            )))
        }
    })
}

fn encode_string(s: &str, out: &mut impl Write) -> ScribeResult<()> {
    let bytes = s.as_bytes();
    let len = u32::try_from(bytes.len())
        .map_err(|_| ScribeError::write("string longer than u32::MAX bytes"))?;
    out.write_u32::<BigEndian>(len).map_err(write_failed)?;
    out.write_all(bytes).map_err(write_failed)
}

fn decode_string(input: &mut impl Read) -> ScribeResult<String> {
    let len = input.read_u32::<BigEndian>().map_err(read_failed)? as usize;
    let mut bytes = vec![0u8; len];
    input.read_exact(&mut bytes).map_err(read_failed)?;
    String::from_utf8(bytes)
        .map_err(|e| ScribeError::read(format!("invalid UTF-8 in container string: {}", e)))
}

fn encode_node(node: &HierNode, out: &mut impl Write) -> ScribeResult<()> {
    match node {
        HierNode::Group(group) => {
            out.write_u8(TAG_GROUP).map_err(write_failed)?;
            let count = u32::try_from(group.len())
                .map_err(|_| ScribeError::write("group has more than u32::MAX children"))?;
            out.write_u32::<BigEndian>(count).map_err(write_failed)?;
            for (key, child) in group.iter() {
                encode_string(key, out)?;
                encode_node(child, out)?;
            }
            Ok(())
        }
        HierNode::Dataset(ds) => {
            out.write_u8(TAG_DATASET).map_err(write_failed)?;
            out.write_u8(dtype_code(ds.dtype())).map_err(write_failed)?;
            let rank = u8::try_from(ds.rank())
                .map_err(|_| ScribeError::write("dataset rank exceeds 255"))?;
            out.write_u8(rank).map_err(write_failed)?;
            for &dim in ds.shape() {
                out.write_u64::<BigEndian>(dim as u64).map_err(write_failed)?;
            }
            encode_buffer(ds.buffer(), out)
        }
    }
}

fn encode_buffer(buffer: &Buffer, out: &mut impl Write) -> ScribeResult<()> {
    match buffer {
        Buffer::Bool(v) => {
            for &b in v {
                out.write_u8(b as u8).map_err(write_failed)?;
            }
        }
        Buffer::String(v) => {
            for s in v {
                encode_string(s, out)?;
            }
        }
        Buffer::Int8(v) => {
            for &x in v {
                out.write_i8(x).map_err(write_failed)?;
            }
        }
        Buffer::Int16(v) => {
            for &x in v {
                out.write_i16::<BigEndian>(x).map_err(write_failed)?;
            }
        }
        Buffer::Int32(v) => {
            for &x in v {
                out.write_i32::<BigEndian>(x).map_err(write_failed)?;
            }
        }
        Buffer::Int64(v) => {
            for &x in v {
                out.write_i64::<BigEndian>(x).map_err(write_failed)?;
            }
        }
        Buffer::Uint8(v) => {
            for &x in v {
                out.write_u8(x).map_err(write_failed)?;
            }
        }
        Buffer::Uint16(v) => {
            for &x in v {
                out.write_u16::<BigEndian>(x).map_err(write_failed)?;
            }
        }
        Buffer::Uint32(v) => {
            for &x in v {
                out.write_u32::<BigEndian>(x).map_err(write_failed)?;
            }
        }
        Buffer::Uint64(v) => {
            for &x in v {
                out.write_u64::<BigEndian>(x).map_err(write_failed)?;
            }
        }
        Buffer::Float32(v) => {
            for &x in v {
                out.write_f32::<BigEndian>(x).map_err(write_failed)?;
            }
        }
        Buffer::Float64(v) => {
            for &x in v {
                out.write_f64::<BigEndian>(x).map_err(write_failed)?;
            }
        }
        Buffer::Complex64(v) => {
            for c in v {
                out.write_f32::<BigEndian>(c.re).map_err(write_failed)?;
                out.write_f32::<BigEndian>(c.im).map_err(write_failed)?;
            }
        }
        Buffer::Complex128(v) => {
            for c in v {
                out.write_f64::<BigEndian>(c.re).map_err(write_failed)?;
                out.write_f64::<BigEndian>(c.im).map_err(write_failed)?;
            }
        }
    }
    Ok(())
}

fn decode_node(input: &mut impl Read) -> ScribeResult<HierNode> {
    match input.read_u8().map_err(read_failed)? {
        TAG_GROUP => {
            let count = input.read_u32::<BigEndian>().map_err(read_failed)? as usize;
            let mut group = Group::new();
            for _ in 0..count {
                let key = decode_string(input)?;
                if group.get(&key).is_some() {
                    return Err(ScribeError::read(format!(
                        "duplicate key '{}' in container group",
                        key
                    )));
                }
                let child = decode_node(input)?;
                group.insert(key, child);
            }
            Ok(HierNode::Group(group))
        }
        TAG_DATASET => {
            let dtype = dtype_from_code(input.read_u8().map_err(read_failed)?)?;
            let rank = input.read_u8().map_err(read_failed)? as usize;
            let mut shape = Vec::with_capacity(rank);
            for _ in 0..rank {
                shape.push(input.read_u64::<BigEndian>().map_err(read_failed)? as usize);
            }
            let size: usize = shape.iter().product();
            let buffer = decode_buffer(dtype, size, input)?;
            Ok(HierNode::Dataset(Dataset::new(buffer, shape)?))
        }
        other => Err(ScribeError::read(format!(
            "unknown container node tag {}",
            other
        ))),
    }
}

fn decode_buffer(dtype: Dtype, size: usize, input: &mut impl Read) -> ScribeResult<Buffer> {
    macro_rules! read_n {
        ($method:ident) => {{
            let mut v = Vec::with_capacity(size);
            for _ in 0..size {
                v.push(input.$method::<BigEndian>().map_err(read_failed)?);
            }
            v
        }};
    }

    Ok(match dtype {
        Dtype::Bool => {
            let mut v = Vec::with_capacity(size);
            for _ in 0..size {
                v.push(input.read_u8().map_err(read_failed)? != 0);
            }
            Buffer::Bool(v)
        }
        Dtype::String => {
            let mut v = Vec::with_capacity(size);
            for _ in 0..size {
                v.push(decode_string(input)?);
            }
            Buffer::String(v)
        }
        Dtype::Num(NumType::Int8) => {
            let mut v = Vec::with_capacity(size);
            for _ in 0..size {
                v.push(input.read_i8().map_err(read_failed)?);
            }
            Buffer::Int8(v)
        }
        Dtype::Num(NumType::Uint8) => {
            let mut v = Vec::with_capacity(size);
            for _ in 0..size {
                v.push(input.read_u8().map_err(read_failed)?);
            }
            Buffer::Uint8(v)
        }
        Dtype::Num(NumType::Int16) => Buffer::Int16(read_n!(read_i16)),
        Dtype::Num(NumType::Int32) => Buffer::Int32(read_n!(read_i32)),
        Dtype::Num(NumType::Int64) => Buffer::Int64(read_n!(read_i64)),
        Dtype::Num(NumType::Uint16) => Buffer::Uint16(read_n!(read_u16)),
        Dtype::Num(NumType::Uint32) => Buffer::Uint32(read_n!(read_u32)),
        Dtype::Num(NumType::Uint64) => Buffer::Uint64(read_n!(read_u64)),
        Dtype::Num(NumType::Float32) => Buffer::Float32(read_n!(read_f32)),
        Dtype::Num(NumType::Float64) => Buffer::Float64(read_n!(read_f64)),
        Dtype::Num(NumType::Complex64) => {
            let mut v = Vec::with_capacity(size);
            for _ in 0..size {
                let re = input.read_f32::<BigEndian>().map_err(read_failed)?;
                let im = input.read_f32::<BigEndian>().map_err(read_failed)?;
                v.push(Complex::new(re, im));
            }
            Buffer::Complex64(v)
        }
        Dtype::Num(NumType::Complex128) => {
            let mut v = Vec::with_capacity(size);
            for _ in 0..size {
                let re = input.read_f64::<BigEndian>().map_err(read_failed)?;
                let im = input.read_f64::<BigEndian>().map_err(read_failed)?;
                v.push(Complex::new(re, im));
            }
            Buffer::Complex128(v)
        }
    })
}
