// SPDX-License-Identifier: LGPL-2.1

//! ESRF data format (`.edf`) frames.
//!
//! The header is a brace-delimited text block of `key = value ;` lines
//! padded to a 3072-byte boundary. It declares the payload byte count but
//! not its offset, so the payload is anchored to the end of the file:
//! `data_offset = file_len - Size`. Geometry values use SI units in the
//! header and are converted to the instrument conventions here (microns,
//! Angstrom, mm).

use log::debug;

use crate::bits::Endian;
use crate::cursor::ByteCursor;
use crate::decoders::{SampleEncoding, read_sample_grid};
use crate::rasterimage::{RasterImage, RasterMeta};
use crate::source::DataSource;
use crate::{DecodeError, Result};

const HEADER_LEN: usize = 3072;

pub fn decode_edf(source: &DataSource) -> Result<RasterImage> {
  let buf = source.buf();
  if buf.first() != Some(&b'{') {
    return Err(DecodeError::NotThisFormat("missing opening brace".to_string()));
  }
  let header_len = HEADER_LEN.min(buf.len());

  let mut dim: (usize, usize) = (0, 0);
  let mut payload_size = 0_usize;
  let mut encoding = SampleEncoding::U16;
  let mut endian = Endian::Little;
  let mut pixel_size = (0.0, 0.0);
  let mut wavelength = 0.0;
  let mut distance = 0.0;
  let mut center_px = (0.0, 0.0);
  let mut comments = Vec::new();

  let text = String::from_utf8_lossy(&buf[..header_len]);
  for line in text.split('\n') {
    let line = line.trim().trim_end_matches(';').trim();
    if line == "}" {
      break;
    }
    let Some((key, value)) = line.split_once('=') else { continue };
    let (key, value) = (key.trim(), value.trim());
    match key {
      "Dim_1" => dim.1 = parse_num(value)? as usize,
      "Dim_2" => dim.0 = parse_num(value)? as usize,
      "Size" => payload_size = parse_num(value)? as usize,
      "DataType" => encoding = sample_encoding(value)?,
      "ByteOrder" => endian = if value == "HighByteFirst" { Endian::Big } else { Endian::Little },
      "WaveLength" | "Wavelength" => wavelength = parse_num(value)? * 1.0e10,
      "SampleDistance" | "Distance" => distance = parse_num(value)? * 1000.0,
      "PSize_1" => pixel_size.0 = parse_num(value)? * 1.0e6,
      "PSize_2" => pixel_size.1 = parse_num(value)? * 1.0e6,
      "Center_1" => center_px.0 = parse_num(value)?,
      "Center_2" => center_px.1 = parse_num(value)?,
      _ => comments.push(line.to_string()),
    }
  }

  if dim.0 == 0 || dim.1 == 0 {
    return Err(DecodeError::MalformedRecord("header declares no image dimensions".to_string()));
  }
  if payload_size < dim.0 * dim.1 * encoding.bytes_per_sample() {
    return Err(DecodeError::TruncatedInput(format!(
      "declared payload of {} bytes cannot hold a {}x{} grid",
      payload_size, dim.0, dim.1
    )));
  }
  // End-anchoring must never land the payload inside the header block.
  if buf.len() < HEADER_LEN + payload_size {
    return Err(DecodeError::TruncatedInput(format!(
      "declared payload of {} bytes does not fit a {}-byte file",
      payload_size,
      buf.len()
    )));
  }

  // The payload runs to end-of-file; whatever padding the writer inserted
  // after the header is skipped by anchoring at the back.
  let data_offset = buf.len() - payload_size;
  debug!("EDF payload: {} bytes at offset {}", payload_size, data_offset);

  let mut cursor = ByteCursor::new(buf, endian);
  cursor.seek(data_offset);
  let data = read_sample_grid(&mut cursor, encoding, dim.0, dim.1)?;

  let meta = RasterMeta {
    pixel_size,
    wavelength,
    distance,
    // Center is stored in pixels; express it in mm from the corner.
    center: (center_px.0 * pixel_size.0 / 1000.0, center_px.1 * pixel_size.1 / 1000.0),
    size: (dim.0 as u32, dim.1 as u32),
  };
  Ok(RasterImage::new("EDF", meta, data).with_comments(comments))
}

fn sample_encoding(value: &str) -> Result<SampleEncoding> {
  match value {
    "UnsignedByte" => Ok(SampleEncoding::U8),
    "UnsignedShort" => Ok(SampleEncoding::U16),
    "UnsignedInt" | "UnsignedLong" | "SignedInteger" => Ok(SampleEncoding::I32),
    "FloatValue" | "Float" => Ok(SampleEncoding::F32),
    other => Err(DecodeError::UnsupportedFile(format!("unhandled EDF sample type '{}'", other))),
  }
}

fn parse_num(value: &str) -> Result<f64> {
  value
    .parse::<f64>()
    .map_err(|_| DecodeError::MalformedRecord(format!("unreadable number '{}' in header line", value)))
}
