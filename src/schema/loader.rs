//! Schema loading and serialization.
//!
//! Schema documents are JSON object trees. Every node may carry
//! `schema_name` and `schema_description`; the `type` field selects the
//! variant and defaults to `"any"` when absent. The loader is its own
//! meta-schema: the case analysis here is the full definition of what a
//! well-formed schema document is.
//!
//! The legacy type name `dict` is accepted on read and always written
//! back as `record`. Comments (`//` and `/* */`) are accepted in schema
//! files and dropped on write.

use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};

use crate::error::{ScribeError, ScribeResult};
use crate::json::strip_comments;

use super::types::{
    ArraySchema, ItemSchema, NumType, NumberSchema, RecordSchema, Schema, SchemaMetadata,
    SchemaNode, StringSchema,
};

impl Schema {
    /// Load a schema from a JSON file. Comments are tolerated.
    pub fn from_file(path: impl AsRef<Path>) -> ScribeResult<Schema> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            ScribeError::read(format!(
                "cannot open schema file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Schema::from_text(&text)
    }

    /// Load a schema from JSON text. Comments are tolerated.
    pub fn from_text(text: &str) -> ScribeResult<Schema> {
        let stripped = strip_comments(text);
        let value: Value = serde_json::from_str(&stripped)?;
        Schema::from_value(&value)
    }

    /// Load a schema from a parsed document tree.
    pub fn from_value(value: &Value) -> ScribeResult<Schema> {
        let Some(obj) = value.as_object() else {
            return Err(ScribeError::validation("schema node must be an object"));
        };

        let metadata = SchemaMetadata {
            name: string_field(obj, "schema_name")?.unwrap_or_default(),
            description: string_field(obj, "schema_description")?.unwrap_or_default(),
        };

        let type_name = match obj.get("type") {
            None => "any".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(ScribeError::validation("schema 'type' must be a string"))
            }
        };

        let node = match type_name.as_str() {
            "none" => SchemaNode::None,
            "any" => SchemaNode::Any,
            "bool" => SchemaNode::Bool,
            "string" => SchemaNode::String(load_string(obj)?),
            "array" => SchemaNode::Array(load_array(obj)?),
            // `dict` kept for documents written before the rename
            "record" | "dict" => SchemaNode::Record(load_record(obj)?),
            other => match NumType::from_name(other) {
                Some(num_type) => SchemaNode::Number(NumberSchema::new(num_type)),
                None => {
                    return Err(ScribeError::validation(format!(
                        "unknown schema type '{}'",
                        other
                    )))
                }
            },
        };

        Ok(Schema::with_metadata(node, metadata))
    }

    /// Serialize this schema to a document tree.
    ///
    /// Meta fields are emitted only when present; absent optional fields
    /// are not re-emitted, so `to_value(from_value(x))` is semantically
    /// equivalent to `x`.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        if !self.name().is_empty() {
            obj.insert("schema_name".into(), json!(self.name()));
        }
        if !self.description().is_empty() {
            obj.insert("schema_description".into(), json!(self.description()));
        }
        obj.insert("type".into(), json!(self.type_name()));

        match self.node() {
            SchemaNode::None | SchemaNode::Any | SchemaNode::Bool | SchemaNode::Number(_) => {}
            SchemaNode::String(s) => {
                if let Some(min) = s.min_length {
                    obj.insert("min_length".into(), json!(min));
                }
                if let Some(max) = s.max_length {
                    obj.insert("max_length".into(), json!(max));
                }
            }
            SchemaNode::Array(a) => {
                if let Some(shape) = &a.shape {
                    obj.insert("shape".into(), json!(shape));
                }
                obj.insert("elements".into(), a.elements.to_value());
            }
            SchemaNode::Record(r) => {
                let items: Vec<Value> = r
                    .items
                    .iter()
                    .map(|item| {
                        let mut entry = Map::new();
                        entry.insert("key".into(), json!(item.key));
                        if item.optional {
                            entry.insert("optional".into(), json!(true));
                        }
                        if let Value::Object(nested) = item.schema.to_value() {
                            entry.extend(nested);
                        }
                        Value::Object(entry)
                    })
                    .collect();
                obj.insert("items".into(), Value::Array(items));
            }
        }

        Value::Object(obj)
    }

    /// Serialize to pretty-printed JSON text.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).expect("schema serialization is infallible")
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> ScribeResult<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ScribeError::validation(format!(
            "schema field '{}' must be a string",
            key
        ))),
    }
}

fn unsigned_field(obj: &Map<String, Value>, key: &str) -> ScribeResult<Option<u64>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_u64().map(Some).ok_or_else(|| {
            ScribeError::validation(format!(
                "schema field '{}' must be an unsigned integer",
                key
            ))
        }),
    }
}

fn load_string(obj: &Map<String, Value>) -> ScribeResult<StringSchema> {
    let min_length = unsigned_field(obj, "min_length")?;
    let max_length = unsigned_field(obj, "max_length")?;
    if let (Some(min), Some(max)) = (min_length, max_length) {
        if min > max {
            return Err(ScribeError::validation(format!(
                "string schema has min_length {} > max_length {}",
                min, max
            )));
        }
    }
    Ok(StringSchema {
        min_length,
        max_length,
    })
}

fn load_array(obj: &Map<String, Value>) -> ScribeResult<ArraySchema> {
    let elements = match obj.get("elements") {
        Some(v) => Schema::from_value(v)?,
        None => {
            return Err(ScribeError::validation(
                "array schema requires an 'elements' field",
            ))
        }
    };
    if matches!(elements.node(), SchemaNode::None) {
        return Err(ScribeError::validation(
            "array schema with 'none' elements is never useful",
        ));
    }

    let shape = match obj.get("shape") {
        None | Some(Value::Null) => None,
        Some(Value::Array(dims)) => {
            if dims.is_empty() {
                return Err(ScribeError::validation("array shape must be non-empty"));
            }
            let mut out = Vec::with_capacity(dims.len());
            for dim in dims {
                let dim = dim.as_i64().ok_or_else(|| {
                    ScribeError::validation("array shape entries must be integers")
                })?;
                if dim < -1 {
                    return Err(ScribeError::validation(format!(
                        "array shape entry {} is invalid (must be >= 0, or -1 for wildcard)",
                        dim
                    )));
                }
                out.push(dim);
            }
            Some(out)
        }
        Some(_) => {
            return Err(ScribeError::validation(
                "array 'shape' must be a list of integers",
            ))
        }
    };

    Ok(ArraySchema { elements, shape })
}

fn load_record(obj: &Map<String, Value>) -> ScribeResult<RecordSchema> {
    let Some(items) = obj.get("items") else {
        return Err(ScribeError::validation(
            "record schema requires an 'items' field",
        ));
    };
    let Some(items) = items.as_array() else {
        return Err(ScribeError::validation("record 'items' must be a list"));
    };

    let mut record = RecordSchema::default();
    for item in items {
        let Some(item_obj) = item.as_object() else {
            return Err(ScribeError::validation("record item must be an object"));
        };
        let key = string_field(item_obj, "key")?.ok_or_else(|| {
            ScribeError::validation("record item requires a 'key' field")
        })?;
        if record.schema_for(&key).is_some() {
            return Err(ScribeError::validation(format!(
                "duplicate record key '{}'",
                key
            )));
        }
        let optional = match item_obj.get("optional") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(ScribeError::validation(
                    "record item 'optional' must be a boolean",
                ))
            }
        };
        // the remaining fields of the item object form the nested schema
        let schema = Schema::from_value(item)?;
        record.items.push(ItemSchema {
            key,
            schema,
            optional,
        });
    }

    Ok(record)
}
