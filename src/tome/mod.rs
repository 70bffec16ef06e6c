//! The Tome value model: tagged values, n-arrays, and conversions.

pub mod array;
pub mod convert;
pub mod value;

pub use array::NdArray;
pub use convert::TomeSerializer;
pub use value::{Complex, Record, Tome};
