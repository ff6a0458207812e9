//! Field list encoder, the inverse of [`parse_fields`](super::parse_fields).

use std::io::Write;

use super::field_reader::is_line_break;
use super::{FieldTable, PARAGRAPH_SEPARATOR};
use crate::error::{Error, Result};

/// Encode a table as field list text, one `\n`-terminated line per entry.
///
/// Re-parsing the output yields the same table. Entries the format has no
/// way to express are rejected rather than written lossily.
pub fn encode_fields(fields: &FieldTable) -> Result<String> {
    let mut out = String::new();
    for (name, value) in fields {
        encode_entry(&mut out, name, value)?;
    }
    Ok(out)
}

/// Encode a table and write it to `writer`.
pub fn encode_fields_to<W: Write>(fields: &FieldTable, writer: &mut W) -> Result<()> {
    let text = encode_fields(fields)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}

/// Escape a value: `\` first, then newline, then U+2029.
pub fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(PARAGRAPH_SEPARATOR, "\\p")
}

fn encode_entry(out: &mut String, name: &str, value: &str) -> Result<()> {
    let unencodable = |reason| Error::Unencodable {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(unencodable("name is empty"));
    }
    if name.chars().any(is_line_break) {
        return Err(unencodable("name contains a line break"));
    }

    let escaped = escape(value);
    if escaped.chars().any(is_line_break) {
        return Err(unencodable("value contains a line break other than \\n or \\p"));
    }
    let edge_whitespace = |c: Option<char>| c.is_some_and(char::is_whitespace);
    if edge_whitespace(escaped.chars().next()) || edge_whitespace(escaped.chars().last()) {
        return Err(unencodable("value starts or ends with whitespace"));
    }

    let plain = !name.starts_with('[') && !name.contains(char::is_whitespace);
    if plain && !escaped.is_empty() {
        out.push_str(name);
        out.push(' ');
    } else {
        if name.contains(']') {
            return Err(unencodable("bracketed name contains ']'"));
        }
        out.push('[');
        out.push_str(name);
        out.push(']');
        if !escaped.is_empty() {
            out.push(' ');
        }
    }
    out.push_str(&escaped);
    out.push('\n');
    Ok(())
}
