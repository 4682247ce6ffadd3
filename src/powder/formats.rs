// SPDX-License-Identifier: LGPL-2.1

//! The four legacy bank sub-formats.
//!
//! Which one a bank uses is declared by a keyword in its `BANK` header
//! line. Detection runs in priority order because `FXYE` contains `FXY`
//! as a substring; a header naming neither keyword is an STD bank, the
//! oldest layout and the implied default.

use log::debug;

use super::PowderProfile;
use super::fixed::{field_f64, field_i64};
use super::instparm::DataKind;
use crate::{DecodeError, Result};

const RECORD_WIDTH: usize = 80;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BankFormat {
  Fxye,
  Fxy,
  Esd,
  Std,
}

impl BankFormat {
  pub fn detect(header: &str) -> BankFormat {
    if header.contains("FXYE") {
      Self::Fxye
    } else if header.contains("FXY") {
      Self::Fxy
    } else if header.contains("ESD") {
      Self::Esd
    } else {
      Self::Std
    }
  }
}

/// Decode the bank body that follows one `BANK` header. `body` starts at
/// the byte just past the header's newline and may run through further
/// banks; decoding stops at the next `BANK` line or end of input.
pub fn decode_bank_text(body: &str, header: &str, kind: DataKind) -> Result<PowderProfile> {
  let format = BankFormat::detect(header);
  debug!("bank '{}' decodes as {:?}", header.trim_end(), format);
  match format {
    BankFormat::Fxye => decode_fxye(body, kind),
    BankFormat::Fxy => decode_fxy(body, kind),
    BankFormat::Esd => decode_esd(body, header, kind),
    BankFormat::Std => decode_std(body, header, kind),
  }
}

fn bank_lines(body: &str) -> impl Iterator<Item = &str> {
  body.lines().take_while(|line| !line.starts_with("BANK"))
}

fn decode_fxye(body: &str, kind: DataKind) -> Result<PowderProfile> {
  let mut profile = PowderProfile::default();
  for line in bank_lines(body) {
    let vals: Vec<&str> = line.split_whitespace().collect();
    if vals.len() < 2 {
      return Err(DecodeError::MalformedRecord(format!("FXYE record '{}' needs x and y columns", line)));
    }
    let x = parse_col(vals[0])? / kind.x_scale();
    let y = parse_col(vals[1])?;
    if y <= 0.0 {
      // The sigma column is never consulted for empty points and may be
      // absent entirely.
      profile.push(x, 0.0, 1.0);
    } else {
      let sigma = vals
        .get(2)
        .ok_or_else(|| DecodeError::MalformedRecord(format!("FXYE record '{}' has no sigma column", line)))?;
      let sigma = parse_col(sigma)?;
      profile.push(x, y, 1.0 / (sigma * sigma));
    }
  }
  Ok(profile)
}

fn decode_fxy(body: &str, kind: DataKind) -> Result<PowderProfile> {
  let mut profile = PowderProfile::default();
  for line in bank_lines(body) {
    let vals: Vec<&str> = line.split_whitespace().collect();
    if vals.len() < 2 {
      return Err(DecodeError::MalformedRecord(format!("FXY record '{}' needs two columns", line)));
    }
    let x = parse_col(vals[0])? / kind.x_scale();
    let y = parse_col(vals[1])?;
    if y > 0.0 {
      profile.push(x, y, 1.0 / y);
    } else {
      profile.push(x, 0.0, 1.0);
    }
  }
  Ok(profile)
}

/// The bank header's 6th and 7th fields give the scan start and step; the
/// per-point records carry only `(intensity, esd)` pairs, five per line.
fn decode_esd(body: &str, header: &str, kind: DataKind) -> Result<PowderProfile> {
  let (start, step) = scan_grid(header, kind)?;
  let mut profile = PowderProfile::default();
  let mut j = 0_usize;
  for line in bank_lines(body) {
    for i in (0..RECORD_WIDTH).step_by(16) {
      let x = start + step * j as f64;
      let y = field_f64(line, i, 8)?;
      let esd = field_f64(line, i + 8, 8)?;
      if y > 0.0 {
        profile.push(x, y, 1.0 / (esd * esd));
      } else {
        profile.push(x, 0.0, 1.0);
      }
      j += 1;
    }
  }
  Ok(profile)
}

/// STD packs ten `(count:2, value:6)` pairs per line. The esd is implied
/// by counting statistics, `sqrt(value * count)` with the count floored at
/// one; values are floored at zero. The header's 3rd field declares the
/// channel count and trailing pad points beyond it are dropped.
fn decode_std(body: &str, header: &str, kind: DataKind) -> Result<PowderProfile> {
  let cons: Vec<&str> = header.split_whitespace().collect();
  if cons.len() < 7 {
    return Err(DecodeError::MalformedRecord(format!("STD bank header '{}' is too short", header.trim_end())));
  }
  let nch = cons[2]
    .parse::<usize>()
    .map_err(|_| DecodeError::MalformedRecord(format!("channel count '{}' is not an integer", cons[2])))?;
  let (start, step) = scan_grid(header, kind)?;

  let mut profile = PowderProfile::default();
  let mut j = 0_usize;
  for line in bank_lines(body) {
    for i in (0..RECORD_WIDTH).step_by(8) {
      let x = start + step * j as f64;
      let n = field_i64(line, i, 2)?.max(1) as f64;
      let y = field_f64(line, i + 2, 6)?.max(0.0);
      let esd = if y > 0.0 { (y * n).sqrt() } else { 1.0 };
      j += 1;
      if j < nch {
        profile.push(x, y, 1.0 / (esd * esd));
      }
    }
  }
  Ok(profile)
}

fn scan_grid(header: &str, kind: DataKind) -> Result<(f64, f64)> {
  let cons: Vec<&str> = header.split_whitespace().collect();
  if cons.len() < 7 {
    return Err(DecodeError::MalformedRecord(format!("bank header '{}' carries no scan grid", header.trim_end())));
  }
  Ok((parse_col(cons[5])? / kind.x_scale(), parse_col(cons[6])? / kind.x_scale()))
}

fn parse_col(field: &str) -> Result<f64> {
  field
    .parse::<f64>()
    .map_err(|_| DecodeError::MalformedRecord(format!("'{}' is not a number", field)))
}
