// SPDX-License-Identifier: LGPL-2.1

//! Fixed-width record fields.
//!
//! The legacy powder formats pack numbers into fixed column ranges, and
//! several of them legitimately leave trailing columns blank on the last
//! line of a bank. Field extraction therefore clamps to the line length
//! and reads blank columns as zero; only a column range that holds
//! non-numeric text is an error.

use crate::{DecodeError, Result};

/// Columns `[start, start+width)` of an ASCII record, clamped to its length.
pub fn field_str(line: &str, start: usize, width: usize) -> &str {
  let end = (start + width).min(line.len());
  if start >= end { "" } else { &line[start..end] }
}

pub fn field_f64(line: &str, start: usize, width: usize) -> Result<f64> {
  let field = field_str(line, start, width).trim();
  if field.is_empty() {
    return Ok(0.0);
  }
  field
    .parse::<f64>()
    .map_err(|_| DecodeError::MalformedRecord(format!("columns {}..{}: '{}' is not a number", start, start + width, field)))
}

pub fn field_i64(line: &str, start: usize, width: usize) -> Result<i64> {
  let field = field_str(line, start, width).trim();
  if field.is_empty() {
    return Ok(0);
  }
  field
    .parse::<i64>()
    .map_err(|_| DecodeError::MalformedRecord(format!("columns {}..{}: '{}' is not an integer", start, start + width, field)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clamps_to_line_length() {
    assert_eq!(field_str("abcdef", 4, 8), "ef");
    assert_eq!(field_str("abcdef", 8, 4), "");
  }

  #[test]
  fn blank_fields_read_as_zero() {
    assert_eq!(field_f64("        ", 0, 8).unwrap(), 0.0);
    assert_eq!(field_i64("", 0, 2).unwrap(), 0);
  }

  #[test]
  fn garbage_is_malformed() {
    assert!(matches!(field_f64("  xx.y  ", 0, 8), Err(DecodeError::MalformedRecord(_))));
    assert!(matches!(field_i64(" q", 0, 2), Err(DecodeError::MalformedRecord(_))));
  }

  #[test]
  fn parses_packed_columns() {
    let line = " 512.345 298.765";
    assert_eq!(field_i64(line, 0, 2).unwrap(), 5);
    assert_eq!(field_f64(line, 2, 6).unwrap(), 12.345);
    assert_eq!(field_i64(line, 8, 2).unwrap(), 2);
    assert_eq!(field_f64(line, 10, 6).unwrap(), 98.765);
  }
}
