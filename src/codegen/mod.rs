//! Record codegen: emit Rust record types from a schema.
//!
//! One depth-first traversal emits a struct definition plus its
//! conversion-trait impl per record schema node. Inner records are
//! emitted before the records that contain them. Shared sub-schemas
//! (same handle visited twice) are emitted once; deduplication is by
//! handle identity, not structural equality. Anonymous records receive
//! a stable generated name from their visit position.

use std::collections::HashMap;

use crate::error::{ScribeError, ScribeResult};
use crate::schema::{NumType, RecordSchema, Schema, SchemaNode};

/// Generate Rust source for every record type reachable from `schema`.
pub fn generate_rust(schema: &Schema) -> ScribeResult<String> {
    let mut generator = Generator::default();
    generator.type_name(schema)?;
    Ok(generator.into_source())
}

#[derive(Default)]
struct Generator {
    /// Generated type name per schema handle identity.
    type_cache: HashMap<usize, String>,
    /// Emitted record definitions, inner records first.
    records: Vec<String>,
    anon_count: usize,
}

impl Generator {
    fn into_source(self) -> String {
        let mut out = String::from(
            "// Generated by scribe codegen; do not edit.\n\
             \n\
             #[allow(unused_imports)]\n\
             use scribe::{Complex, NdArray, Record, ScribeError, ScribeResult, Tome, TomeSerializer};\n",
        );
        for record in &self.records {
            out.push('\n');
            out.push_str(record);
        }
        out
    }

    /// Rust type for a schema node, emitting record definitions along
    /// the way.
    fn type_name(&mut self, schema: &Schema) -> ScribeResult<String> {
        if let Some(name) = self.type_cache.get(&schema.identity()) {
            return Ok(name.clone());
        }

        let name = match schema.node() {
            SchemaNode::None => {
                return Err(ScribeError::validation(
                    "cannot generate a type for the 'none' schema",
                ))
            }
            SchemaNode::Any => "Tome".to_string(),
            SchemaNode::Bool => "bool".to_string(),
            SchemaNode::String(_) => "String".to_string(),
            SchemaNode::Number(n) => atom_type(n.num_type).to_string(),
            SchemaNode::Array(a) => {
                // visit the element schema first so that record elements
                // still get their definitions emitted
                let elem_name = self.type_name(&a.elements)?;
                let storage = match a.elements.node() {
                    SchemaNode::Number(_) | SchemaNode::Bool | SchemaNode::String(_) => elem_name,
                    // arrays of compound or dynamic elements stay dynamic
                    _ => "Tome".to_string(),
                };
                format!("NdArray<{}>", storage)
            }
            SchemaNode::Record(r) => {
                let name = if schema.name().is_empty() {
                    self.anon_count += 1;
                    format!("AnonRecord{}", self.anon_count)
                } else {
                    sanitize_type_name(schema.name())
                };
                // cache before recursing so shared handles resolve
                self.type_cache.insert(schema.identity(), name.clone());
                let definition = self.generate_record(r, &name)?;
                self.records.push(definition);
                return Ok(name);
            }
        };

        self.type_cache.insert(schema.identity(), name.clone());
        Ok(name)
    }

    fn generate_record(&mut self, record: &RecordSchema, name: &str) -> ScribeResult<String> {
        let mut fields = Vec::with_capacity(record.items.len());
        for item in &record.items {
            let base = self.type_name(&item.schema)?;
            let field_type = if item.optional {
                format!("Option<{}>", base)
            } else {
                base
            };
            fields.push((sanitize_ident(&item.key), item.key.clone(), field_type, item.optional));
        }

        let mut out = String::new();

        out.push_str("#[derive(Debug, Clone, PartialEq)]\n");
        out.push_str(&format!("pub struct {} {{\n", name));
        for (field, _, field_type, _) in &fields {
            out.push_str(&format!("    pub {}: {},\n", field, field_type));
        }
        out.push_str("}\n\n");

        out.push_str(&format!("impl TomeSerializer for {} {{\n", name));

        out.push_str("    fn to_tome(&self) -> Tome {\n");
        out.push_str("        let mut record = Record::new();\n");
        for (field, key, _, optional) in &fields {
            if *optional {
                out.push_str(&format!(
                    "        if let Some(value) = &self.{} {{\n\
                     \x20           record.insert(\"{}\", value.to_tome());\n\
                     \x20       }}\n",
                    field, key
                ));
            } else {
                out.push_str(&format!(
                    "        record.insert(\"{}\", self.{}.to_tome());\n",
                    key, field
                ));
            }
        }
        out.push_str("        Tome::Record(record)\n");
        out.push_str("    }\n\n");

        out.push_str("    fn from_tome(tome: &Tome) -> ScribeResult<Self> {\n");
        out.push_str("        let record = tome.as_record()?;\n");
        out.push_str("        Ok(Self {\n");
        for (field, key, _, optional) in &fields {
            if *optional {
                out.push_str(&format!(
                    "            {}: match record.get(\"{}\") {{\n\
                     \x20               Some(value) => Some(TomeSerializer::from_tome(value)?),\n\
                     \x20               None => None,\n\
                     \x20           }},\n",
                    field, key
                ));
            } else {
                out.push_str(&format!(
                    "            {}: match record.get(\"{}\") {{\n\
                     \x20               Some(value) => TomeSerializer::from_tome(value)?,\n\
                     \x20               None => {{\n\
                     \x20                   return Err(ScribeError::type_error(\"missing field '{}'\"))\n\
                     \x20               }}\n\
                     \x20           }},\n",
                    field, key, key
                ));
            }
        }
        out.push_str("        })\n");
        out.push_str("    }\n");
        out.push_str("}\n");

        Ok(out)
    }
}

fn atom_type(num_type: NumType) -> &'static str {
    match num_type {
        NumType::Int8 => "i8",
        NumType::Int16 => "i16",
        NumType::Int32 => "i32",
        NumType::Int64 => "i64",
        NumType::Uint8 => "u8",
        NumType::Uint16 => "u16",
        NumType::Uint32 => "u32",
        NumType::Uint64 => "u64",
        NumType::Float32 => "f32",
        NumType::Float64 => "f64",
        NumType::Complex64 => "Complex<f32>",
        NumType::Complex128 => "Complex<f64>",
    }
}

/// Turn a record key into a usable Rust field identifier.
fn sanitize_ident(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if i == 0 && c.is_ascii_digit() {
                out.push('_');
            }
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    if is_keyword(&out) {
        out.push('_');
    }
    out
}

fn sanitize_type_name(name: &str) -> String {
    let ident = sanitize_ident(name);
    let mut chars = ident.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => ident,
    }
}

fn is_keyword(ident: &str) -> bool {
    matches!(
        ident,
        "as" | "break" | "const" | "continue" | "crate" | "dyn" | "else" | "enum" | "extern"
            | "false" | "fn" | "for" | "if" | "impl" | "in" | "let" | "loop" | "match" | "mod"
            | "move" | "mut" | "pub" | "ref" | "return" | "self" | "static" | "struct" | "super"
            | "trait" | "true" | "type" | "unsafe" | "use" | "where" | "while" | "async"
            | "await" | "box" | "try" | "union"
    )
}
