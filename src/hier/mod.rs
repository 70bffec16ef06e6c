//! Hierarchical binary format: tree model, wire codec, and driver.

pub mod codec;
pub mod driver;
pub mod tree;

pub use driver::{read, validate, write};
pub use tree::{Buffer, Dataset, Dtype, Group, HierNode};
