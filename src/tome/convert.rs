//! Conversion between Tomes and native values.
//!
//! `TomeSerializer` is the single extension point for moving user types
//! in and out of Tomes. The engine itself only ever calls the two trait
//! operations; user record types implement it once (typically reading
//! each field by name off a record) and become readable through any
//! driver. The codegen emitter writes these impls mechanically.
//!
//! Conversions are strict: no implicit narrowing or widening between
//! numeric kinds.

use crate::error::{ScribeError, ScribeResult};

use super::array::NdArray;
use super::value::{Complex, Record, Tome};

/// Two-way conversion between a native value and a Tome.
pub trait TomeSerializer: Sized {
    /// Build a Tome representing `self`.
    fn to_tome(&self) -> Tome;

    /// Extract a native value, failing with the `Type` kind on a
    /// variant mismatch.
    fn from_tome(tome: &Tome) -> ScribeResult<Self>;
}

impl From<bool> for Tome {
    fn from(value: bool) -> Tome {
        Tome::Bool(value)
    }
}

impl From<String> for Tome {
    fn from(value: String) -> Tome {
        Tome::String(value)
    }
}

impl From<&str> for Tome {
    fn from(value: &str) -> Tome {
        Tome::String(value.to_string())
    }
}

impl From<Record> for Tome {
    fn from(value: Record) -> Tome {
        Tome::Record(value)
    }
}

impl From<NdArray<Tome>> for Tome {
    fn from(value: NdArray<Tome>) -> Tome {
        Tome::Array(value)
    }
}

impl Tome {
    /// Convert this Tome into a native value via its serializer.
    pub fn get_as<T: TomeSerializer>(&self) -> ScribeResult<T> {
        T::from_tome(self)
    }
}

fn mismatch(tome: &Tome, expected: &str) -> ScribeError {
    ScribeError::type_error(format!(
        "cannot convert {} Tome into {}",
        tome.kind_name(),
        expected
    ))
}

impl TomeSerializer for bool {
    fn to_tome(&self) -> Tome {
        Tome::Bool(*self)
    }

    fn from_tome(tome: &Tome) -> ScribeResult<Self> {
        match tome {
            Tome::Bool(b) => Ok(*b),
            other => Err(mismatch(other, "bool")),
        }
    }
}

impl TomeSerializer for String {
    fn to_tome(&self) -> Tome {
        Tome::String(self.clone())
    }

    fn from_tome(tome: &Tome) -> ScribeResult<Self> {
        Ok(tome.as_str()?.to_string())
    }
}

impl TomeSerializer for Record {
    fn to_tome(&self) -> Tome {
        Tome::Record(self.clone())
    }

    fn from_tome(tome: &Tome) -> ScribeResult<Self> {
        Ok(tome.as_record()?.clone())
    }
}

impl TomeSerializer for NdArray<Tome> {
    fn to_tome(&self) -> Tome {
        Tome::Array(self.clone())
    }

    fn from_tome(tome: &Tome) -> ScribeResult<Self> {
        Ok(tome.as_generic_array()?.clone())
    }
}

impl TomeSerializer for NdArray<bool> {
    fn to_tome(&self) -> Tome {
        Tome::Array(self.map(|&b| Tome::Bool(b)))
    }

    fn from_tome(tome: &Tome) -> ScribeResult<Self> {
        let array = tome.as_generic_array()?;
        let data: ScribeResult<Vec<bool>> = array.flat().iter().map(|t| t.as_bool()).collect();
        NdArray::from_flat(data?, array.shape().to_vec())
    }
}

impl TomeSerializer for NdArray<String> {
    fn to_tome(&self) -> Tome {
        Tome::Array(self.map(|s| Tome::String(s.clone())))
    }

    fn from_tome(tome: &Tome) -> ScribeResult<Self> {
        let array = tome.as_generic_array()?;
        let data: ScribeResult<Vec<String>> = array
            .flat()
            .iter()
            .map(|t| t.as_str().map(str::to_string))
            .collect();
        NdArray::from_flat(data?, array.shape().to_vec())
    }
}

/// Atoms, 1-D sequences, and n-arrays of one numeric kind.
macro_rules! numeric_serializer {
    ($ty:ty, $atom:ident, $array:ident, $name:literal) => {
        impl TomeSerializer for $ty {
            fn to_tome(&self) -> Tome {
                Tome::$atom(*self)
            }

            fn from_tome(tome: &Tome) -> ScribeResult<Self> {
                match tome {
                    Tome::$atom(v) => Ok(*v),
                    other => Err(mismatch(other, $name)),
                }
            }
        }

        impl TomeSerializer for NdArray<$ty> {
            fn to_tome(&self) -> Tome {
                Tome::$array(self.clone())
            }

            fn from_tome(tome: &Tome) -> ScribeResult<Self> {
                match tome {
                    Tome::$array(a) => Ok(a.clone()),
                    other => Err(mismatch(other, concat!($name, " array"))),
                }
            }
        }

        impl From<$ty> for Tome {
            fn from(value: $ty) -> Tome {
                Tome::$atom(value)
            }
        }

        impl From<NdArray<$ty>> for Tome {
            fn from(value: NdArray<$ty>) -> Tome {
                Tome::$array(value)
            }
        }

        impl From<Vec<$ty>> for Tome {
            fn from(value: Vec<$ty>) -> Tome {
                Tome::$array(NdArray::from_vec(value))
            }
        }

        impl TomeSerializer for Vec<$ty> {
            fn to_tome(&self) -> Tome {
                Tome::$array(NdArray::from_vec(self.clone()))
            }

            fn from_tome(tome: &Tome) -> ScribeResult<Self> {
                match tome {
                    Tome::$array(a) if a.rank() == 1 => Ok(a.flat().to_vec()),
                    Tome::$array(_) => Err(ScribeError::type_error(
                        "expected a 1-D array when converting to a vector",
                    )),
                    other => Err(mismatch(other, concat!($name, " array"))),
                }
            }
        }
    };
}

numeric_serializer!(i8, Int8, Int8Array, "int8");
numeric_serializer!(i16, Int16, Int16Array, "int16");
numeric_serializer!(i32, Int32, Int32Array, "int32");
numeric_serializer!(i64, Int64, Int64Array, "int64");
numeric_serializer!(u8, Uint8, Uint8Array, "uint8");
numeric_serializer!(u16, Uint16, Uint16Array, "uint16");
numeric_serializer!(u32, Uint32, Uint32Array, "uint32");
numeric_serializer!(u64, Uint64, Uint64Array, "uint64");
numeric_serializer!(f32, Float32, Float32Array, "float32");
numeric_serializer!(f64, Float64, Float64Array, "float64");
numeric_serializer!(Complex<f32>, Complex64, Complex64Array, "complex64");
numeric_serializer!(Complex<f64>, Complex128, Complex128Array, "complex128");

/// Fixed-size homogeneous sequences go through the 1-D vector impl.
impl<T, const N: usize> TomeSerializer for [T; N]
where
    T: Copy,
    Vec<T>: TomeSerializer,
{
    fn to_tome(&self) -> Tome {
        self.to_vec().to_tome()
    }

    fn from_tome(tome: &Tome) -> ScribeResult<Self> {
        let vec = Vec::<T>::from_tome(tome)?;
        let len = vec.len();
        vec.try_into().map_err(|_| {
            ScribeError::type_error(format!(
                "expected a sequence of length {}, got {}",
                N, len
            ))
        })
    }
}
