//! RFC 4180 reader.
//!
//! Pipeline:
//!   raw &str
//!     └─ split_records()   → Vec<RawRow>   (quotes, escapes, line endings)
//!          └─ into_table() → Table         (header + width check)

use std::path::Path;

use crate::error::{Error, Result};

// ─── Table ───────────────────────────────────────────────────────────────────

/// A parsed CSV file: the header row and every data row, all as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
  pub headers: Vec<String>,
  pub rows:    Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
  /// 1-based line on which the row starts.
  pub line:   usize,
  pub fields: Vec<String>,
}

impl Table {
  /// Index of the header that matches `name` exactly.
  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.headers.iter().position(|h| h == name)
  }

  /// Every row's value in column `idx`, with its line number.
  pub fn column(&self, idx: usize) -> impl Iterator<Item = (usize, &str)> + '_ {
    self
      .rows
      .iter()
      .map(move |r| (r.line, r.fields.get(idx).map_or("", String::as_str)))
  }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }
}

// ─── Entry points ────────────────────────────────────────────────────────────

pub(crate) fn parse_str(input: &str) -> Result<Table> {
  into_table(split_records(input)?)
}

pub(crate) fn parse_path(path: &Path) -> Result<Table> {
  let text = std::fs::read_to_string(path)
    .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
  parse_str(&text)
}

// ─── Low-level helpers
// ────────────────────────────────────────────────────────

struct RawRow {
  line:   usize,
  fields: Vec<String>,
}

/// Split `input` into rows of fields.
///
/// Handles `""` escapes inside quoted fields, embedded separators and line
/// breaks, CRLF / LF / bare CR endings, and a leading UTF-8 BOM. Blank lines
/// are dropped.
fn split_records(input: &str) -> Result<Vec<RawRow>> {
  let input = input.strip_prefix('\u{feff}').unwrap_or(input);

  let mut rows = Vec::new();
  let mut fields: Vec<String> = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  let mut quoted = false;
  let mut line = 1usize;
  let mut row_line = 1usize;
  let mut quote_line = 0usize;

  let mut chars = input.chars().peekable();
  while let Some(c) = chars.next() {
    if in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          chars.next();
          field.push('"');
        }
        '"' => in_quotes = false,
        '\n' => {
          line += 1;
          field.push(c);
        }
        _ => field.push(c),
      }
      continue;
    }

    match c {
      '"' if field.is_empty() && !quoted => {
        in_quotes = true;
        quoted = true;
        quote_line = line;
      }
      ',' => {
        fields.push(std::mem::take(&mut field));
        quoted = false;
      }
      '\r' if chars.peek() == Some(&'\n') => {}
      '\n' | '\r' => {
        fields.push(std::mem::take(&mut field));
        push_row(&mut rows, std::mem::take(&mut fields), row_line, quoted);
        quoted = false;
        line += 1;
        row_line = line;
      }
      _ => field.push(c),
    }
  }

  if in_quotes {
    return Err(Error::UnterminatedQuote { line: quote_line });
  }
  if !field.is_empty() || !fields.is_empty() || quoted {
    fields.push(field);
    push_row(&mut rows, fields, row_line, quoted);
  }
  Ok(rows)
}

/// Keep the row unless it is a blank line (one empty, unquoted field).
fn push_row(rows: &mut Vec<RawRow>, fields: Vec<String>, line: usize, last_quoted: bool) {
  let blank = fields.len() == 1 && fields[0].is_empty() && !last_quoted;
  if !blank {
    rows.push(RawRow { line, fields });
  }
}

fn into_table(raw: Vec<RawRow>) -> Result<Table> {
  let mut iter = raw.into_iter();
  let header = iter.next().ok_or(Error::Empty)?;
  let expected = header.fields.len();

  let rows = iter
    .map(|r| {
      if r.fields.len() == expected {
        Ok(Row { line: r.line, fields: r.fields })
      } else {
        Err(Error::RaggedRow { line: r.line, expected, found: r.fields.len() })
      }
    })
    .collect::<Result<Vec<_>>>()?;

  Ok(Table { headers: header.fields, rows })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fields(t: &Table) -> Vec<Vec<&str>> {
    t.rows
      .iter()
      .map(|r| r.fields.iter().map(String::as_str).collect())
      .collect()
  }

  #[test]
  fn simple_lf_file() {
    let t = parse_str("ID,Population\n1,10\n2,20\n").unwrap();
    assert_eq!(t.headers, vec!["ID", "Population"]);
    assert_eq!(fields(&t), vec![vec!["1", "10"], vec!["2", "20"]]);
    assert_eq!(t.rows[1].line, 3);
  }

  #[test]
  fn crlf_bom_and_missing_final_newline() {
    let t = parse_str("\u{feff}ID,Population\r\n1,10\r\n2,20").unwrap();
    assert_eq!(t.headers[0], "ID");
    assert_eq!(t.len(), 2);
    assert_eq!(fields(&t)[1], vec!["2", "20"]);
  }

  #[test]
  fn quoted_fields_with_commas_quotes_and_newlines() {
    let t = parse_str("a,b\n\"x,y\",\"say \"\"hi\"\"\"\n\"multi\nline\",z\n").unwrap();
    assert_eq!(fields(&t), vec![
      vec!["x,y", "say \"hi\""],
      vec!["multi\nline", "z"],
    ]);
    assert_eq!(t.rows[1].line, 3);
  }

  #[test]
  fn blank_lines_are_skipped() {
    let t = parse_str("a,b\n\n1,2\n\n\n3,4\n").unwrap();
    assert_eq!(t.len(), 2);
    assert_eq!(t.rows[1].line, 6);
  }

  #[test]
  fn empty_quoted_field_is_kept() {
    let t = parse_str("a\n\"\"\n").unwrap();
    assert_eq!(fields(&t), vec![vec![""]]);
  }

  #[test]
  fn ragged_row_is_rejected() {
    let err = parse_str("a,b\n1,2,3\n").unwrap_err();
    assert!(matches!(err, Error::RaggedRow { line: 2, expected: 2, found: 3 }));
    assert!(err.is_schema());
  }

  #[test]
  fn unterminated_quote_is_rejected() {
    let err = parse_str("a,b\n\"1,2\n").unwrap_err();
    assert!(matches!(err, Error::UnterminatedQuote { line: 2 }));
  }

  #[test]
  fn empty_input_has_no_header() {
    assert!(matches!(parse_str("").unwrap_err(), Error::Empty));
    assert!(matches!(parse_str("\n\n").unwrap_err(), Error::Empty));
  }

  #[test]
  fn header_only_is_an_empty_table() {
    let t = parse_str("ID,Population,Latitude,Longitude\n").unwrap();
    assert!(t.is_empty());
    assert_eq!(t.column_index("Latitude"), Some(2));
    assert_eq!(t.column_index("latitude"), None);
  }
}
