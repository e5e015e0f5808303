//! Whole-table encoding and decoding

use serde_json::Value;

use super::errors::{CodecError, CodecResult};
use super::line::{decode_header, decode_row, encode_literal};

/// Header and rows decoded from table text
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTable {
    /// Field names from line 1, trimmed
    pub header: Vec<String>,
    /// Rows in file order, each exactly `header.len()` values wide
    pub rows: Vec<Vec<Value>>,
}

/// Encodes a header and rows into table text.
///
/// With `pad_columns`, each column is left-justified to the widest cell
/// (header included) and trailing whitespace is trimmed per line. Without
/// it, cells are joined by a bare `|`. Both forms decode identically.
/// Every line, including the last, ends with `\n`.
pub fn encode_table<'a, I>(header: &[String], rows: I, pad_columns: bool) -> String
where
    I: IntoIterator<Item = &'a [Value]>,
{
    let cells: Vec<Vec<String>> = rows
        .into_iter()
        .map(|row| row.iter().map(encode_literal).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    if pad_columns {
        for row in &cells {
            for (idx, cell) in row.iter().enumerate() {
                let size = cell.chars().count();
                if size > widths[idx] {
                    widths[idx] = size;
                }
            }
        }
    }

    let mut out = String::new();
    push_line(&mut out, header.iter().map(String::as_str), &widths, pad_columns);

    let dashes = widths.iter().map(|w| "-".repeat(*w));
    if pad_columns {
        out.push('-');
        out.push_str(&dashes.collect::<Vec<_>>().join("-+-"));
        out.push('-');
    } else {
        out.push_str(&dashes.collect::<Vec<_>>().join("+"));
    }
    out.push('\n');

    for row in &cells {
        push_line(&mut out, row.iter().map(String::as_str), &widths, pad_columns);
    }

    out
}

fn push_line<'a, I>(out: &mut String, cells: I, widths: &[usize], pad_columns: bool)
where
    I: Iterator<Item = &'a str>,
{
    if !pad_columns {
        out.push_str(&cells.collect::<Vec<_>>().join("|"));
        out.push('\n');
        return;
    }

    let mut line = String::from(" ");
    for (idx, cell) in cells.enumerate() {
        if idx > 0 {
            line.push_str(" | ");
        }
        line.push_str(cell);
        let pad = widths[idx].saturating_sub(cell.chars().count());
        line.extend(std::iter::repeat(' ').take(pad));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Decodes table text into its header and rows.
///
/// The divider line is skipped unread. Decoding stops at end of input or
/// at the first whitespace-only line; a missing final newline is fine.
///
/// # Errors
///
/// `MissingHeader` if the text is empty or begins with a blank line;
/// `ColumnCount` or `InvalidLiteral` for the first malformed row.
pub fn decode_table(text: &str) -> CodecResult<DecodedTable> {
    let mut lines = text.lines();

    let header = match lines.next() {
        Some(line) if !line.trim().is_empty() => decode_header(line),
        _ => return Err(CodecError::MissingHeader),
    };

    // Divider
    lines.next();

    let mut rows = Vec::new();
    for (offset, line) in lines.enumerate() {
        if line.trim().is_empty() {
            break;
        }
        rows.push(decode_row(line, offset + 3, header.len())?);
    }

    Ok(DecodedTable { header, rows })
}
