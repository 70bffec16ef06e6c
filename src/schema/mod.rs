//! Schema model: the algebraic description of permissible Tomes.

pub mod guess;
pub mod loader;
pub mod types;

pub use guess::guess_schema;
pub use types::{
    ArraySchema, ItemSchema, NumType, NumberSchema, RecordSchema, Schema, SchemaMetadata,
    SchemaNode, StringSchema,
};
