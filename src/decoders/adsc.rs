// SPDX-License-Identifier: LGPL-2.1

//! ADSC Quantum CCD `.img` files.
//!
//! A 511-byte text header of `KEY=value;` lines between `{`/`}` braces,
//! then the square u16 grid at byte 512. The detector is square and its
//! side length comes from the header itself, so this is the one raster
//! format whose dimensions are fully self-describing.

use crate::bits::Endian;
use crate::cursor::ByteCursor;
use crate::decoders::{SampleEncoding, read_sample_grid};
use crate::rasterimage::{RasterImage, RasterMeta};
use crate::source::DataSource;
use crate::{DecodeError, Result};

const HEADER_LEN: usize = 511;
const DATA_OFFSET: usize = 512;

pub fn decode_img(source: &DataSource) -> Result<RasterImage> {
  let buf = source.buf();
  if buf.len() < DATA_OFFSET {
    return Err(DecodeError::TruncatedInput(format!(
      "header needs {} bytes, file has {}",
      DATA_OFFSET,
      buf.len()
    )));
  }

  let mut size = 0_usize;
  let mut pixel_size = (51.0, 51.0);
  let mut wavelength = 0.0;
  let mut distance = 0.0;
  let mut center = (0.0, 0.0);
  let mut comments = Vec::new();

  let text = String::from_utf8_lossy(&buf[..HEADER_LEN]);
  let lines: Vec<&str> = text.split('\n').collect();
  // First line is the opening brace, the last two close the header block.
  for line in &lines[1..lines.len().saturating_sub(2)] {
    let line = line.trim();
    let line = line.strip_suffix(';').unwrap_or(line);
    if line.is_empty() {
      continue;
    }
    if let Some((key, value)) = line.split_once('=') {
      let value = value.trim();
      if key.contains("SIZE1") {
        size = parse_num(value)? as usize;
      } else if key.contains("WAVELENGTH") {
        wavelength = parse_num(value)?;
      } else if key.contains("BIN") {
        pixel_size = if value == "2x2" { (102.0, 102.0) } else { (51.0, 51.0) };
      } else if key.contains("DISTANCE") {
        distance = parse_num(value)?;
      } else if key.contains("CENTER_X") {
        center.0 = parse_num(value)?;
      } else if key.contains("CENTER_Y") {
        center.1 = parse_num(value)?;
      }
    }
    comments.push(line.to_string());
  }

  if size == 0 {
    return Err(DecodeError::MalformedRecord("header has no SIZE1 record".to_string()));
  }

  let mut cursor = ByteCursor::new(buf, Endian::Little);
  cursor.seek(DATA_OFFSET);
  let data = read_sample_grid(&mut cursor, SampleEncoding::U16, size, size)?;

  let meta = RasterMeta {
    pixel_size,
    wavelength,
    distance,
    center,
    size: (size as u32, size as u32),
  };
  Ok(RasterImage::new("ADSC", meta, data).with_comments(comments))
}

fn parse_num(value: &str) -> Result<f64> {
  value
    .parse::<f64>()
    .map_err(|_| DecodeError::MalformedRecord(format!("unreadable number '{}' in header line", value)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rasterimage::RasterData;

  fn build_img(size: usize, bin: Option<&str>) -> Vec<u8> {
    let mut text = String::from("{\nHEADER_BYTES=  512;\n");
    text.push_str(&format!("SIZE1={};\n", size));
    text.push_str(&format!("SIZE2={};\n", size));
    if let Some(bin) = bin {
      text.push_str(&format!("BIN={};\n", bin));
    }
    text.push_str("WAVELENGTH=1.03320;\n");
    text.push_str("DISTANCE=180.00;\n");
    text.push_str("CENTER_X=105.20;\n");
    text.push_str("CENTER_Y=104.70;\n");
    text.push_str("}\n\n");
    let mut buf = text.into_bytes();
    assert!(buf.len() <= HEADER_LEN);
    buf.resize(DATA_OFFSET, b' ');
    for i in 0..size * size {
      buf.extend_from_slice(&(i as u16).to_le_bytes());
    }
    buf
  }

  #[test]
  fn decodes_binned_frame() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let buf = build_img(4, Some("2x2"));
    let source = DataSource::new_from_slice(&buf);
    let image = decode_img(&source)?;
    assert_eq!(image.detector, "ADSC");
    assert_eq!(image.meta.size, (4, 4));
    assert_eq!(image.meta.pixel_size, (102.0, 102.0));
    assert_eq!(image.meta.wavelength, 1.03320);
    assert_eq!(image.meta.center, (105.20, 104.70));
    assert_eq!(image.data, RasterData::Integer((0..16).collect()));
    assert!(image.comments.iter().any(|c| c.starts_with("SIZE1=")));
    Ok(())
  }

  #[test]
  fn unbinned_frame_defaults_to_fine_pixels() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let buf = build_img(4, None);
    let source = DataSource::new_from_slice(&buf);
    assert_eq!(decode_img(&source)?.meta.pixel_size, (51.0, 51.0));
    Ok(())
  }

  #[test]
  fn missing_size_is_malformed() {
    let mut text = String::from("{\nWAVELENGTH=1.0;\n}\n\n");
    let mut buf = std::mem::take(&mut text).into_bytes();
    buf.resize(DATA_OFFSET, b' ');
    let source = DataSource::new_from_slice(&buf);
    assert!(matches!(decode_img(&source), Err(DecodeError::MalformedRecord(_))));
  }

  #[test]
  fn short_pixel_stream_is_truncated() {
    let mut buf = build_img(4, None);
    buf.truncate(DATA_OFFSET + 10);
    let source = DataSource::new_from_slice(&buf);
    assert!(matches!(decode_img(&source), Err(DecodeError::TruncatedInput(_))));
  }
}
