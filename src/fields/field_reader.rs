//! Field list parser.

use super::{FieldTable, PARAGRAPH_SEPARATOR};

/// Parse a field list into a table.
///
/// Never fails: lines that are neither a plain nor a bracket entry are
/// skipped. When a name appears more than once the last value wins.
pub fn parse_fields(text: &str) -> FieldTable {
    let mut fields = FieldTable::new();

    for line in lines(text) {
        if let Some((name, raw_value)) = split_entry(line.trim()) {
            log::trace!("field list entry '{}'", name);
            fields.insert(name.to_string(), unescape(raw_value));
        }
    }

    fields
}

/// Decode `\\`, `\n` and `\p` in a raw value.
///
/// Single left-to-right pass, so `\\n` is a backslash followed by `n`.
/// A backslash before any other character is kept as is.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('p') => out.push(PARAGRAPH_SEPARATOR),
            _ => {
                out.push('\\');
                continue;
            },
        }
        chars.next();
    }

    out
}

/// Split a trimmed line into name and raw value.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    if let Some(bracketed) = line.strip_prefix('[') {
        let (name, rest) = bracketed.split_once(']')?;
        if name.is_empty() {
            return None;
        }
        Some((name, rest.trim()))
    } else {
        let split_at = line.find(char::is_whitespace)?;
        Some((&line[..split_at], line[split_at..].trim_start()))
    }
}

/// Line terminators recognised between entries.
pub(super) fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{0085}' | '\u{2028}' | PARAGRAPH_SEPARATOR)
}

/// Split on any line terminator, treating `\r\n` as one break.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.char_indices().find(|&(_, c)| is_line_break(c)) {
            Some((idx, c)) => {
                let mut next = idx + c.len_utf8();
                if c == '\r' && current[next..].starts_with('\n') {
                    next += 1;
                }
                rest = Some(&current[next..]);
                Some(&current[..idx])
            },
            None => {
                rest = None;
                Some(current)
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_contains(fields: &FieldTable, name: &str, expected: &str) {
        let actual = fields
            .get(name)
            .unwrap_or_else(|| panic!("Field {} not found", name));
        assert_eq!(actual, expected, "Invalid field {} value", name);
    }

    #[test]
    fn test_no_fields() {
        assert!(parse_fields("").is_empty());
    }

    #[test]
    fn test_regular_field_name() {
        let fields = parse_fields("field value");
        assert_eq!(fields.len(), 1);
        assert_contains(&fields, "field", "value");
    }

    #[test]
    fn test_field_name_with_space() {
        let fields = parse_fields("[field name] value");
        assert_contains(&fields, "field name", "value");
    }

    #[test]
    fn test_unescaping() {
        let fields = parse_fields("field [\\n\\p\\\\]");
        assert_contains(&fields, "field", "[\n\u{2029}\\]");
    }

    #[test]
    fn test_escaped_backslash_before_n_stays_literal() {
        let fields = parse_fields("field a\\\\nb");
        assert_contains(&fields, "field", "a\\nb");
    }

    #[test]
    fn test_multiple_fields() {
        let fields = parse_fields("field1 value1\nfield2 value2");
        assert_contains(&fields, "field1", "value1");
        assert_contains(&fields, "field2", "value2");
    }

    #[test]
    fn test_invalid_entries() {
        assert!(parse_fields("field-value").is_empty());
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let fields = parse_fields("f a\nf b");
        assert_eq!(fields.len(), 1);
        assert_contains(&fields, "f", "b");
    }

    #[test]
    fn test_duplicate_keeps_first_position() {
        let fields = parse_fields("a 1\nb 2\na 3");
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["a", "b"]);
        assert_contains(&fields, "a", "3");
    }

    #[test]
    fn test_escape_free_value_unchanged() {
        let fields = parse_fields("note plain [text] with spaces");
        assert_contains(&fields, "note", "plain [text] with spaces");
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let fields = parse_fields("   name \t  value with  inner  gaps  \t");
        assert_contains(&fields, "name", "value with  inner  gaps");
    }

    #[test]
    fn test_bracket_value_trimmed_and_may_be_empty() {
        let fields = parse_fields("[a b]    x  \n[empty]");
        assert_contains(&fields, "a b", "x");
        assert_contains(&fields, "empty", "");
    }

    #[test]
    fn test_bracket_name_stops_at_first_close() {
        let fields = parse_fields("[a]b] c");
        assert_contains(&fields, "a", "b] c");
    }

    #[test]
    fn test_bracket_name_not_unescaped() {
        let fields = parse_fields("[a\\nb] v");
        assert_contains(&fields, "a\\nb", "v");
    }

    #[test]
    fn test_unterminated_or_empty_bracket_dropped() {
        assert!(parse_fields("[no close value").is_empty());
        assert!(parse_fields("[] value").is_empty());
    }

    #[test]
    fn test_universal_line_breaks() {
        let fields = parse_fields("a 1\r\nb 2\rc 3\u{2028}d 4\u{0085}e 5\u{2029}f 6");
        assert_eq!(fields.len(), 6);
        assert_contains(&fields, "a", "1");
        assert_contains(&fields, "c", "3");
        assert_contains(&fields, "f", "6");
    }

    #[test]
    fn test_blank_lines_ignored() {
        let fields = parse_fields("\n\n  \t \nname value\n\n");
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_checkbox_values_pass_through() {
        let fields = parse_fields("agree Yes\nspam Off");
        assert_contains(&fields, "agree", "Yes");
        assert_contains(&fields, "spam", "Off");
    }

    #[test]
    fn test_unescape_unknown_and_trailing_backslash() {
        assert_eq!(unescape("a\\tb"), "a\\tb");
        assert_eq!(unescape("end\\"), "end\\");
        assert_eq!(unescape("\\\\\\n"), "\\\n");
    }

    #[test]
    fn test_unicode_values() {
        let fields = parse_fields("[ФИО] Иванов Иван\nгород Москва");
        assert_contains(&fields, "ФИО", "Иванов Иван");
        assert_contains(&fields, "город", "Москва");
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_escape_free_text_unescapes_to_itself(text in "[^\\\\]*") {
                prop_assert_eq!(unescape(&text), text);
            }

            #[test]
            fn prop_parse_never_panics(text in "\\PC*") {
                let _ = parse_fields(&text);
            }
        }
    }
}
