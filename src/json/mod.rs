//! Text tree format: schema-directed JSON reading, validation, writing.
//!
//! Documents are materialized `serde_json::Value` trees; the driver in
//! [`driver`] walks schema and document together in one recursive pass.

pub mod driver;

pub use driver::{read, validate, write};

use crate::error::ScribeResult;
use crate::schema::Schema;
use crate::tome::Tome;

/// Read a Tome from JSON text under a schema. Comments are tolerated.
pub fn read_str(text: &str, schema: &Schema) -> ScribeResult<Tome> {
    let value: serde_json::Value = serde_json::from_str(&strip_comments(text))?;
    let mut tome = Tome::default();
    read(Some(&mut tome), &value, schema)?;
    Ok(tome)
}

/// Validate JSON text against a schema without materializing a Tome.
pub fn validate_str(text: &str, schema: &Schema) -> ScribeResult<()> {
    let value: serde_json::Value = serde_json::from_str(&strip_comments(text))?;
    validate(&value, schema)
}

/// Write a Tome to pretty-printed JSON text under a schema.
pub fn write_str(tome: &Tome, schema: &Schema) -> ScribeResult<String> {
    let value = write(tome, schema)?;
    Ok(serde_json::to_string_pretty(&value).expect("JSON value serialization is infallible"))
}

/// Remove `//` and `/* */` comments outside of string literals.
///
/// Applied to schema files and text data files before parsing; comments
/// are never preserved on write.
pub(crate) fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' => match chars.peek() {
                Some('/') => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                }
                Some('*') => {
                    chars.next();
                    let mut prev = '\0';
                    for c in chars.by_ref() {
                        if prev == '*' && c == '/' {
                            break;
                        }
                        prev = c;
                    }
                    out.push(' ');
                }
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_block_comments_removed() {
        let text = "// top\n{\"a\": 1 /* mid */, \"b\": 2}\n";
        let v: serde_json::Value = serde_json::from_str(&strip_comments(text)).unwrap();
        assert_eq!(v["a"], 1);
        assert_eq!(v["b"], 2);
    }

    #[test]
    fn test_strings_untouched() {
        let text = r#"{"a": "slash // inside", "b": "star /* inside */"}"#;
        let v: serde_json::Value = serde_json::from_str(&strip_comments(text)).unwrap();
        assert_eq!(v["a"], "slash // inside");
        assert_eq!(v["b"], "star /* inside */");
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let text = r#"{"a": "quote \" then // still in string"}"#;
        let v: serde_json::Value = serde_json::from_str(&strip_comments(text)).unwrap();
        assert_eq!(v["a"], "quote \" then // still in string");
    }
}
