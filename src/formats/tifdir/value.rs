// SPDX-License-Identifier: LGPL-2.1

use serde::{Deserialize, Serialize};

/// Rational type, stored as the raw u32 pair from the file.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rational {
  pub n: u32,
  pub d: u32,
}

impl Rational {
  pub fn new(n: u32, d: u32) -> Self {
    Self { n, d }
  }

  pub fn as_f64(&self) -> f64 {
    if self.d == 0 { 0.0 } else { self.n as f64 / self.d as f64 }
  }
}

/// ASCII tag payload: NUL-separated strings, decoded lossily.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TifAscii {
  strings: Vec<String>,
}

impl TifAscii {
  pub fn new_from_raw(raw: &[u8]) -> Self {
    let strings = raw
      .split(|b| *b == 0)
      .filter(|chunk| !chunk.is_empty())
      .map(|chunk| String::from_utf8_lossy(chunk).trim_end().to_string())
      .collect();
    Self { strings }
  }

  pub fn first(&self) -> &str {
    self.strings.first().map(String::as_str).unwrap_or("")
  }

  pub fn strings(&self) -> &[String] {
    &self.strings
  }
}

/// Typed value list of one directory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
  /// 8-bit unsigned (type 1)
  Byte(Vec<u8>),
  /// ASCII string (type 2)
  Ascii(TifAscii),
  /// 16-bit unsigned (type 3)
  Short(Vec<u16>),
  /// 32-bit unsigned (type 4)
  Long(Vec<u32>),
  /// Unsigned rational, kept as the raw u32 pair (type 5)
  Rational(Vec<Rational>),
  /// 32-bit IEEE float (type 11)
  Float(Vec<f32>),
  /// Raw bytes of a type this reader does not interpret
  Unknown(u16, Vec<u8>),
}

impl Value {
  pub fn count(&self) -> usize {
    match self {
      Self::Byte(v) => v.len(),
      Self::Ascii(v) => v.strings().len(),
      Self::Short(v) => v.len(),
      Self::Long(v) => v.len(),
      Self::Rational(v) => v.len(),
      Self::Float(v) => v.len(),
      Self::Unknown(_, v) => v.len(),
    }
  }

  /// Widen the value at `idx` to u32, or 0 when out of range or non-numeric.
  pub fn force_u32(&self, idx: usize) -> u32 {
    match self {
      Self::Byte(v) => v.get(idx).copied().unwrap_or(0) as u32,
      Self::Short(v) => v.get(idx).copied().unwrap_or(0) as u32,
      Self::Long(v) => v.get(idx).copied().unwrap_or(0),
      Self::Rational(v) => v.get(idx).map(|r| r.n).unwrap_or(0),
      Self::Float(v) => v.get(idx).copied().unwrap_or(0.0) as u32,
      Self::Ascii(_) | Self::Unknown(..) => 0,
    }
  }

  pub fn force_u16(&self, idx: usize) -> u16 {
    self.force_u32(idx) as u16
  }

  pub fn force_usize(&self, idx: usize) -> usize {
    self.force_u32(idx) as usize
  }

  pub fn as_string(&self) -> Option<&str> {
    match self {
      Self::Ascii(v) => Some(v.first()),
      _ => None,
    }
  }

  pub fn value_type(&self) -> u16 {
    match self {
      Self::Byte(_) => 1,
      Self::Ascii(_) => 2,
      Self::Short(_) => 3,
      Self::Long(_) => 4,
      Self::Rational(_) => 5,
      Self::Float(_) => 11,
      Self::Unknown(t, _) => *t,
    }
  }

  pub fn value_type_name(&self) -> &'static str {
    match self {
      Self::Byte(_) => "BYTE",
      Self::Ascii(_) => "ASCII",
      Self::Short(_) => "SHORT",
      Self::Long(_) => "LONG",
      Self::Rational(_) => "RATIONAL",
      Self::Float(_) => "FLOAT",
      Self::Unknown(..) => "UNKNOWN",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn force_u32_widens_across_types() {
    assert_eq!(Value::Short(vec![2048, 8]).force_u32(1), 8);
    assert_eq!(Value::Long(vec![4096]).force_u32(0), 4096);
    assert_eq!(Value::Byte(vec![7]).force_u32(0), 7);
    assert_eq!(Value::Long(vec![4096]).force_u32(5), 0);
  }

  #[test]
  fn ascii_splits_at_nul() {
    let ascii = TifAscii::new_from_raw(b"PILATUS 100K\0");
    assert_eq!(ascii.first(), "PILATUS 100K");
  }
}
