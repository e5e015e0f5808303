//! Single-line encoding and decoding

use serde_json::Value;

use super::errors::{CodecError, CodecResult};

/// Column separator
pub const DELIMITER: char = '|';

/// Splits a line on [`DELIMITER`], ignoring delimiters inside a balanced
/// pair of single or double quotes.
///
/// Inside double quotes a backslash escapes the next character, matching
/// JSON string escapes, so `"a\"|b"` stays one field. An unbalanced quote
/// swallows the rest of the line into the current field. Returned slices
/// are untrimmed.
pub fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' && q == '"' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                DELIMITER => {
                    fields.push(&line[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            },
        }
    }

    fields.push(&line[start..]);
    fields
}

/// Decodes a header line into trimmed field names.
pub fn decode_header(line: &str) -> Vec<String> {
    split_fields(line)
        .into_iter()
        .map(|name| name.trim().to_string())
        .collect()
}

/// Decodes one row line into exactly `expected` values.
///
/// `line_no` is only used for error reporting.
pub fn decode_row(line: &str, line_no: usize, expected: usize) -> CodecResult<Vec<Value>> {
    let tokens = split_fields(line);
    if tokens.len() != expected {
        return Err(CodecError::ColumnCount {
            line: line_no,
            expected,
            found: tokens.len(),
        });
    }

    tokens
        .into_iter()
        .enumerate()
        .map(|(column, token)| {
            let token = token.trim();
            serde_json::from_str(token).map_err(|source| CodecError::InvalidLiteral {
                line: line_no,
                column: column + 1,
                token: token.to_string(),
                source,
            })
        })
        .collect()
}

/// Encodes a value as a compact, self-delimiting JSON literal.
pub fn encode_literal(value: &Value) -> String {
    value.to_string()
}
