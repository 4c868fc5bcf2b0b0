//! The text format boundary behind [`ToonCodec`](super::ToonCodec).
//!
//! The codec only needs two fallible primitives over plain JSON values. The
//! bundled [`ToonFormat`] delegates the grammar to `serde_toon`; other
//! implementations can be plugged in with
//! [`ToonCodec::with_format`](super::ToonCodec::with_format).
//!
//! `serde_toon` trusts the `[N]` count in an array header when it reads the
//! items that follow, so [`ToonFormat::decode`] first checks every header
//! against the items actually present and refuses the text on any mismatch.

use serde_json::Value;
use thiserror::Error;

/// Errors raised by a [`Format`] implementation.
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    /// Text `serde_toon` could not read or value it could not write.
    #[error(transparent)]
    Toon(#[from] serde_toon::Error),

    /// Declared array length does not match the items present.
    #[error("Length mismatch at line {line}: declared {declared} items, found {found}")]
    LengthMismatch {
        line: usize,
        declared: usize,
        found: usize,
    },

    /// Value the format cannot represent.
    #[error("Unsupported value: {0}")]
    Unsupported(String),
}

/// Text encoding of plain data.
pub trait Format: Send + Sync {
    /// Render a plain value as text.
    fn encode(&self, value: &Value) -> Result<String, FormatError>;

    /// Parse text back into a plain value.
    fn decode(&self, text: &str) -> Result<Value, FormatError>;
}

/// Default TOON implementation (2-space indent, comma delimiter).
#[derive(Debug, Clone, Copy, Default)]
pub struct ToonFormat;

impl Format for ToonFormat {
    fn encode(&self, value: &Value) -> Result<String, FormatError> {
        Ok(serde_toon::to_string(value)?)
    }

    fn decode(&self, text: &str) -> Result<Value, FormatError> {
        check_declared_lengths(text)?;
        Ok(serde_toon::from_str(text)?)
    }
}

/// Parsed `[N]`, `[N|]` or `[N]{fields}` array header.
#[derive(Debug, PartialEq)]
struct ArrayHeader<'a> {
    declared: usize,
    delimiter: char,
    tabular: bool,
    /// Text after the header's closing `:`.
    rest: &'a str,
}

/// Compare every array header with the items that follow it.
fn check_declared_lengths(text: &str) -> Result<(), FormatError> {
    let lines: Vec<&str> = text.lines().collect();

    for (index, line) in lines.iter().enumerate() {
        let Some(header) = find_header(line) else {
            continue;
        };

        let block = &lines[index + 1..];
        let indent = indent_of(line);
        let found = if header.tabular {
            count_rows(block, indent)
        } else if header.rest.trim().is_empty() {
            count_list_items(block, indent)
        } else {
            count_cells(header.rest, header.delimiter)
        };

        if found != header.declared {
            return Err(FormatError::LengthMismatch {
                line: index + 1,
                declared: header.declared,
                found,
            });
        }
    }

    Ok(())
}

/// First array header on `line` outside a quoted string.
fn find_header(line: &str) -> Option<ArrayHeader<'_>> {
    let mut in_quotes = false;
    let mut escaped = false;

    for (start, ch) in line.char_indices() {
        if in_quotes {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_quotes = true,
            '[' => {
                if let Some(header) = parse_header(&line[start + 1..]) {
                    return Some(header);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse the header body that follows a `[`.
fn parse_header(after_bracket: &str) -> Option<ArrayHeader<'_>> {
    let body = after_bracket.strip_prefix('#').unwrap_or(after_bracket);

    let digits_end = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    if digits_end == 0 {
        return None;
    }
    // Counts beyond usize still have to be rejected, not wrapped.
    let declared = body[..digits_end].parse::<usize>().unwrap_or(usize::MAX);

    let mut tail = &body[digits_end..];
    let delimiter = if let Some(stripped) = tail.strip_prefix('|') {
        tail = stripped;
        '|'
    } else if tail.starts_with(' ') {
        tail = tail.trim_start_matches(' ');
        '\t'
    } else {
        ','
    };

    let tail = tail.strip_prefix(']')?;

    if let Some(fields) = tail.strip_prefix('{') {
        let close = fields.find('}')?;
        let rest = fields[close + 1..].strip_prefix(':')?;
        return Some(ArrayHeader {
            declared,
            delimiter,
            tabular: true,
            rest,
        });
    }

    let rest = tail.strip_prefix(':')?;
    Some(ArrayHeader {
        declared,
        delimiter,
        tabular: false,
        rest,
    })
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Non-blank lines nested under a header at `indent`.
fn nested<'a>(block: &'a [&'a str], indent: usize) -> impl Iterator<Item = &'a str> + 'a {
    block
        .iter()
        .copied()
        .filter(|line| !line.trim().is_empty())
        .take_while(move |line| indent_of(line) > indent)
}

fn count_rows(block: &[&str], indent: usize) -> usize {
    let mut rows = nested(block, indent);
    let Some(first) = rows.next() else {
        return 0;
    };
    let row_indent = indent_of(first);
    1 + rows.filter(|line| indent_of(line) == row_indent).count()
}

fn count_list_items(block: &[&str], indent: usize) -> usize {
    let mut items = nested(block, indent).filter(|line| {
        let content = line.trim_start_matches(' ');
        content == "-" || content.starts_with("- ")
    });
    let Some(first) = items.next() else {
        return 0;
    };
    let item_indent = indent_of(first);
    1 + items.filter(|line| indent_of(line) == item_indent).count()
}

/// Delimited cells in an inline array, ignoring delimiters inside quotes.
fn count_cells(rest: &str, delimiter: char) -> usize {
    let mut cells = 1;
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in rest.trim().chars() {
        if in_quotes {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == delimiter {
            cells += 1;
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mismatch(text: &str) -> (usize, usize, usize) {
        match ToonFormat.decode(text) {
            Err(FormatError::LengthMismatch {
                line,
                declared,
                found,
            }) => (line, declared, found),
            other => panic!("expected length mismatch for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_hostile_lengths_are_rejected() {
        assert_eq!(
            mismatch("items[100000000000000]:"),
            (1, 100_000_000_000_000, 0)
        );
        assert_eq!(
            mismatch("items: [18446744073709551615]:"),
            (1, usize::MAX, 0)
        );
        assert_eq!(
            mismatch("items: [99999999999999999999999]: a"),
            (1, usize::MAX, 1)
        );
        assert_eq!(mismatch("rows: [4000000000]{}:\n  x"), (1, 4_000_000_000, 1));
    }

    #[test]
    fn test_inline_count_mismatch() {
        assert_eq!(mismatch("tags: [3]: a,b"), (1, 3, 2));
        assert_eq!(mismatch("tags: [1]: a,b"), (1, 1, 2));
        assert_eq!(mismatch("id: 1\ntags: [2|]: a"), (2, 2, 1));
    }

    #[test]
    fn test_table_and_list_count_mismatch() {
        let table = "users: [3]{id,name}:\n  1,Ada\n  2,Grace\nactive: true";
        assert_eq!(mismatch(table), (1, 3, 2));

        let list = "steps: [2]:\n  - 1\n  - [2]: a,b\n  - 3";
        assert_eq!(mismatch(list), (1, 2, 3));
    }

    #[test]
    fn test_header_lookalikes_are_ignored() {
        assert_eq!(find_header("label: \"[9]: quoted\""), None);
        assert_eq!(find_header("ref: a[b]"), None);
        assert_eq!(find_header("pair: [1,2]"), None);

        let header = find_header("t: [2|]{a|b}:").unwrap();
        assert_eq!(header.declared, 2);
        assert_eq!(header.delimiter, '|');
        assert!(header.tabular);
    }

    #[test]
    fn test_quoted_delimiters_do_not_count() {
        assert_eq!(count_cells(" \"a,b\",c", ','), 2);
        assert_eq!(count_cells("\"say \\\"hi,\\\"\"", ','), 1);
    }

    #[test]
    fn test_encoded_arrays_pass_the_length_check() {
        let value = json!({
            "users": [
                {"id": 1, "name": "Ada"},
                {"id": 2, "name": "Grace"}
            ],
            "tags": ["a", "b", "c"],
            "empty": []
        });

        let text = ToonFormat.encode(&value).unwrap();
        assert!(check_declared_lengths(&text).is_ok(), "{text}");
        assert_eq!(ToonFormat.decode(&text).unwrap(), value);
    }

    #[test]
    fn test_unreadable_text_is_a_toon_error() {
        let err = ToonFormat.decode("title: \"unterminated").unwrap_err();
        assert!(matches!(err, FormatError::Toon(_)));
    }
}
