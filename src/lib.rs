//! scribe - schema-governed, format-agnostic data exchange for
//! scientific and engineering payloads.
//!
//! The engine is built from three pieces: a recursive immutable
//! [`Schema`] describing permissible values, the dynamically tagged
//! [`Tome`] value, and schema-directed drivers that validate,
//! materialize, and emit documents in the text tree format
//! ([`json`]) and the hierarchical binary format ([`hier`]) in a
//! single recursive pass each.

pub mod cli;
pub mod codegen;
pub mod error;
pub mod hier;
pub mod io;
pub mod json;
pub mod logging;
pub mod path;
pub mod schema;
pub mod tome;

pub use error::{ScribeError, ScribeResult};
pub use io::{read_file, validate_file, write_file, Format};
pub use schema::{guess_schema, ItemSchema, NumType, Schema, SchemaNode};
pub use tome::{Complex, NdArray, Record, Tome, TomeSerializer};
