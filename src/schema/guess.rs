//! Best-effort schema inference from an existing Tome.
//!
//! One recursive pass producing the narrowest schema the value
//! satisfies. Unstable by nature: for heterogeneous arrays only the
//! first element is consulted, sibling elements are not unified.
//! Mostly useful for interactive exploration, or as a starting point
//! when writing a schema for pre-existing data.

use crate::tome::Tome;

use super::types::{ItemSchema, Schema};

/// Guess the narrowest schema a Tome satisfies.
pub fn guess_schema(tome: &Tome) -> Schema {
    match tome {
        Tome::Bool(_) => Schema::boolean(),
        Tome::String(_) => Schema::string(),
        Tome::Record(record) => Schema::record(
            record
                .iter()
                .map(|(key, value)| ItemSchema::required(key, guess_schema(value)))
                .collect(),
        ),
        Tome::Array(array) => {
            let elements = match array.flat().first() {
                Some(first) => guess_schema(first),
                None => Schema::any(),
            };
            Schema::array(elements, Some(to_declared_shape(array.shape())))
        }
        other => match other.num_type() {
            Some(num_type) if other.is_numeric_array() => Schema::array(
                Schema::number(num_type),
                Some(to_declared_shape(&other.shape().expect("numeric arrays have a shape"))),
            ),
            Some(num_type) => Schema::number(num_type),
            // every remaining variant is covered above
            None => unreachable!("unhandled Tome kind '{}'", other.kind_name()),
        },
    }
}

fn to_declared_shape(shape: &[usize]) -> Vec<i64> {
    shape.iter().map(|&d| d as i64).collect()
}
