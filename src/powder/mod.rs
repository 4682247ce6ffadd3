// SPDX-License-Identifier: LGPL-2.1

//! Legacy powder pattern files.
//!
//! A powder file holds one or more banks, each introduced by a `BANK`
//! header line and followed by data records in one of four sub-formats.
//! Reading is two-phase: [`scan_banks`] walks the file once and returns
//! a descriptor per bank so a caller can offer a choice; [`decode_bank`]
//! then decodes exactly one of them into a [`PowderProfile`].

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{DecodeError, Result};

pub mod fixed;
pub mod formats;
pub mod instparm;

pub use formats::BankFormat;
pub use instparm::{DataKind, InstrumentParams, Preset};

/// One powder pattern: six equal-length columns over the scan coordinate.
/// `yc`, `yb` and `yd` (calculated, background, difference) are zero here;
/// they belong to fitting stages downstream of decoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PowderProfile {
  pub x: Vec<f64>,
  pub y: Vec<f64>,
  pub w: Vec<f64>,
  pub yc: Vec<f64>,
  pub yb: Vec<f64>,
  pub yd: Vec<f64>,
}

impl PowderProfile {
  pub(crate) fn push(&mut self, x: f64, y: f64, w: f64) {
    self.x.push(x);
    self.y.push(y);
    self.w.push(w);
    self.yc.push(0.0);
    self.yb.push(0.0);
    self.yd.push(0.0);
  }

  pub fn len(&self) -> usize {
    self.x.len()
  }

  pub fn is_empty(&self) -> bool {
    self.x.is_empty()
  }
}

/// One selectable bank: where its data starts and the header line that
/// introduced it (newline stripped).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankDescriptor {
  pub path: PathBuf,
  pub offset: u64,
  pub header: String,
}

/// The result of one pass over a powder file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BankScan {
  pub banks: Vec<BankDescriptor>,
  pub comments: Vec<String>,
}

/// Walk a powder file once, collecting `BANK` headers and `#` comments.
pub fn scan_banks(path: &Path) -> Result<BankScan> {
  let text = fs::read_to_string(path)?;
  let scan = scan_banks_text(path, &text)?;
  debug!("{:?}: {} banks, {} comment lines", path, scan.banks.len(), scan.comments.len());
  Ok(scan)
}

fn scan_banks_text(path: &Path, text: &str) -> Result<BankScan> {
  let mut scan = BankScan::default();
  let mut offset = 0_u64;
  for line in text.split_inclusive('\n') {
    offset += line.len() as u64;
    let stripped = line.strip_suffix('\n').unwrap_or(line);
    let stripped = stripped.strip_suffix('\r').unwrap_or(stripped);
    if stripped.starts_with('#') {
      scan.comments.push(stripped.to_string());
    } else if stripped.starts_with("BANK") {
      scan.banks.push(BankDescriptor {
        path: path.to_path_buf(),
        offset,
        header: stripped.to_string(),
      });
    }
  }
  if scan.banks.is_empty() {
    return Err(DecodeError::NoBanksFound);
  }
  Ok(scan)
}

/// Decode the bank a descriptor points at. Reads the file fresh; a
/// descriptor from an earlier scan of the same bytes yields the same
/// profile every time.
pub fn decode_bank(desc: &BankDescriptor, kind: DataKind) -> Result<PowderProfile> {
  let text = fs::read_to_string(&desc.path)?;
  let offset = desc.offset as usize;
  if offset > text.len() {
    return Err(DecodeError::TruncatedInput(format!(
      "bank data starts at byte {} but file has {}",
      offset,
      text.len()
    )));
  }
  formats::decode_bank_text(&text[offset..], &desc.header, kind)
}
