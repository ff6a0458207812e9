//! Field list text format.
//!
//! A field list assigns one value per line, for example:
//!
//! ```text
//! surname     Kitsul
//! [given name] Nikolay
//! address     12 Main St\nSpringfield
//! agree       Yes
//! ```
//!
//! - A plain entry is a name without whitespace, a whitespace run, then the value.
//! - A bracket entry (`[name] value`) allows whitespace inside the name.
//! - Values understand three escapes: `\\` for a backslash, `\n` for a newline
//!   and `\p` for U+2029 PARAGRAPH SEPARATOR.
//! - Lines matching neither form are ignored, so `# comments` without
//!   whitespace after the hash, or `key-value` pairs, simply drop out.
//!
//! ## Example
//!
//! ```
//! use pdf_form_fill::fields::{encode_fields, parse_fields};
//!
//! let fields = parse_fields("[field name] two\\nlines");
//! assert_eq!(fields["field name"], "two\nlines");
//!
//! let text = encode_fields(&fields)?;
//! assert_eq!(parse_fields(&text), fields);
//! # Ok::<(), pdf_form_fill::error::Error>(())
//! ```

mod field_reader;
mod field_writer;
mod source;

pub use field_reader::{parse_fields, unescape};
pub use field_writer::{encode_fields, encode_fields_to, escape};
pub use source::{FieldSource, DEFAULT_ENCODING};

use indexmap::IndexMap;

/// Decoded mapping from form field name to fill-in value.
///
/// Keeps the position of the first occurrence of each name; a later
/// duplicate overwrites the value.
pub type FieldTable = IndexMap<String, String>;

/// U+2029 PARAGRAPH SEPARATOR, written as `\p` in a field list.
pub const PARAGRAPH_SEPARATOR: char = '\u{2029}';
