// SPDX-License-Identifier: LGPL-2.1

//! MAR345 image-plate scanner files.
//!
//! The file opens with a 4096-byte header: ten little-endian control words,
//! then a free-text block from offset 128 whose keyed lines carry the scan
//! geometry. The pixel stream after the header is compressed with the CCP4
//! pack scheme, located by scanning for its `CCP4` marker string. Expansion
//! itself is an injected capability ([`Mar345Decompress`]); without one
//! registered the header still parses but the decode fails cleanly.

use log::debug;

use crate::bits::LEi32;
use crate::decompressors::Mar345Decompress;
use crate::pixarray::PixI32;
use crate::rasterimage::{RasterData, RasterImage, RasterMeta};
use crate::source::DataSource;
use crate::{DecodeError, Result};

const HEADER_LEN: usize = 4096;
const TEXT_START: usize = 128;
const MAGIC: i32 = 1234;

/// Bytes between the start of the marker chunk and the first compressed
/// pixel byte, covering the marker line and its trailing text.
const MARKER_TO_PAYLOAD: usize = 37;

#[derive(Debug, Clone, PartialEq)]
struct Mar345Header {
  side: usize,
  pixel_size: (f64, f64),
  wavelength: f64,
  distance: f64,
  center: (f64, f64),
  comments: Vec<String>,
}

fn parse_header(buf: &[u8]) -> Result<Mar345Header> {
  if buf.len() < HEADER_LEN {
    return Err(DecodeError::TruncatedInput(format!(
      "header needs {} bytes, file has {}",
      HEADER_LEN,
      buf.len()
    )));
  }
  if LEi32(buf, 0) != MAGIC {
    return Err(DecodeError::NotThisFormat(format!("leading word {} is not {}", LEi32(buf, 0), MAGIC)));
  }

  let mut side = 0_usize;
  let mut pixel_size = (150.0, 150.0);
  let mut wavelength = 0.0;
  let mut distance = 0.0;
  let mut center = (0.0, 0.0);
  let mut comments = Vec::new();

  // The text block is NUL-padded ASCII, one keyed record per line.
  let text = String::from_utf8_lossy(&buf[TEXT_START..HEADER_LEN]);
  for line in text.split('\n') {
    let line = line.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if line.is_empty() {
      continue;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    if line.contains("PIXEL") && words.len() >= 5 {
      pixel_size = (field(&words, 2)?, field(&words, 4)?);
    } else if line.contains("WAVELENGTH") && words.len() >= 2 {
      wavelength = field(&words, 1)?;
    } else if line.contains("DISTANCE") && words.len() >= 2 {
      distance = field(&words, 1)?;
    } else if line.contains("CENTER") && words.len() >= 5 {
      // Stored in units of 0.1 pixel; scale to mm.
      center = (field(&words, 2)? / 10.0, field(&words, 4)? / 10.0);
    } else if line.contains("FORMAT") && words.len() >= 2 {
      side = field(&words, 1)? as usize;
    } else {
      comments.push(line.to_string());
    }
  }

  if side == 0 {
    return Err(DecodeError::MalformedRecord("header has no FORMAT line".to_string()));
  }
  Ok(Mar345Header {
    side,
    pixel_size,
    wavelength,
    distance,
    center,
    comments,
  })
}

fn field(words: &[&str], idx: usize) -> Result<f64> {
  words[idx]
    .parse::<f64>()
    .map_err(|_| DecodeError::MalformedRecord(format!("unreadable number '{}' in header line", words[idx])))
}

/// Scan forward from the end of the header in 8-byte steps until a chunk
/// contains the `CCP4` marker; the compressed payload starts a fixed
/// distance into that record. Runs off the end only as far as the file does.
fn find_marker(buf: &[u8]) -> Result<usize> {
  let mut pos = HEADER_LEN;
  while pos + 8 <= buf.len() {
    let chunk = &buf[pos..pos + 8];
    if chunk.windows(4).any(|w| w == b"CCP4") {
      debug!("CCP4 marker in chunk at {}", pos);
      return Ok(pos + MARKER_TO_PAYLOAD);
    }
    pos += 8;
  }
  Err(DecodeError::MarkerNotFound)
}

pub fn decode_mar345(source: &DataSource, decomp: Option<&dyn Mar345Decompress>) -> Result<RasterImage> {
  let decomp = decomp.ok_or(DecodeError::DecompressionUnavailable)?;
  let buf = source.buf();
  let header = parse_header(buf)?;
  let payload_at = find_marker(buf)?;
  if payload_at >= buf.len() {
    return Err(DecodeError::TruncatedInput("compressed payload starts past end of file".to_string()));
  }

  let mut grid = PixI32::new(header.side, header.side);
  decomp.decompress(&buf[payload_at..], header.side, &mut grid)?;
  // The expansion routine emits the grid with axes swapped relative to the
  // row-major convention used everywhere else in this crate.
  let grid = grid.transpose();

  let meta = RasterMeta {
    pixel_size: header.pixel_size,
    wavelength: header.wavelength,
    distance: header.distance,
    center: header.center,
    size: (header.side as u32, header.side as u32),
  };
  Ok(RasterImage::new("MAR345", meta, RasterData::Integer(grid.into_inner())).with_comments(header.comments))
}

#[cfg(test)]
mod tests {
  use super::*;

  struct RampStub;

  impl Mar345Decompress for RampStub {
    fn decompress(&self, _payload: &[u8], side: usize, out: &mut PixI32) -> Result<()> {
      for (i, px) in out.pixels_mut().iter_mut().enumerate() {
        *px = i as i32;
      }
      assert_eq!(side, out.width);
      Ok(())
    }
  }

  fn build_file(side: usize, with_marker: bool) -> Vec<u8> {
    let mut buf = Vec::new();
    for word in [1234_i32, 0, side as i32, 1, (side * side) as i32, 0, 0, 0, 0, 0] {
      buf.extend_from_slice(&word.to_le_bytes());
    }
    buf.resize(TEXT_START, 0);
    let text = format!(
      "mar research\nPROGRAM mar345 3.0\nFORMAT {side} PCK {npix}\nPIXEL LENGTH 150 HEIGHT 150\nWAVELENGTH 0.709290\nDISTANCE 240.0\nCENTER X 1725 Y 1725\n",
      side = side,
      npix = side * side
    );
    buf.extend_from_slice(text.as_bytes());
    buf.resize(HEADER_LEN, 0);
    if with_marker {
      buf.extend_from_slice(b"\nCCP4 packed image, X: ");
      buf.resize(HEADER_LEN + MARKER_TO_PAYLOAD + 64, 0);
    } else {
      buf.resize(HEADER_LEN + 256, 0);
    }
    buf
  }

  #[test]
  fn decodes_and_transposes() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let buf = build_file(3, true);
    let source = DataSource::new_from_slice(&buf);
    let image = decode_mar345(&source, Some(&RampStub))?;
    assert_eq!(image.detector, "MAR345");
    assert_eq!(image.meta.size, (3, 3));
    assert_eq!(image.meta.pixel_size, (150.0, 150.0));
    assert_eq!(image.meta.wavelength, 0.709290);
    assert_eq!(image.meta.distance, 240.0);
    assert_eq!(image.meta.center, (172.5, 172.5));
    // The stub wrote 0..9 row-major; the decoder hands back the transpose.
    assert_eq!(image.data, RasterData::Integer(vec![0, 3, 6, 1, 4, 7, 2, 5, 8]));
    assert!(image.comments.iter().any(|c| c.contains("mar research")));
    Ok(())
  }

  #[test]
  fn missing_marker_terminates_at_eof() {
    let buf = build_file(3, false);
    let source = DataSource::new_from_slice(&buf);
    assert!(matches!(decode_mar345(&source, Some(&RampStub)), Err(DecodeError::MarkerNotFound)));
  }

  #[test]
  fn no_decompressor_is_reported_before_parsing() {
    let source = DataSource::new_from_slice(&[0_u8; 8]);
    assert!(matches!(decode_mar345(&source, None), Err(DecodeError::DecompressionUnavailable)));
  }

  #[test]
  fn wrong_magic_is_not_this_format() {
    let mut buf = build_file(3, true);
    buf[0..4].copy_from_slice(&4321_i32.to_le_bytes());
    let source = DataSource::new_from_slice(&buf);
    assert!(matches!(decode_mar345(&source, Some(&RampStub)), Err(DecodeError::NotThisFormat(_))));
  }

  #[test]
  fn short_file_is_truncated() {
    let mut buf = 1234_i32.to_le_bytes().to_vec();
    buf.resize(512, 0);
    let source = DataSource::new_from_slice(&buf);
    assert!(matches!(decode_mar345(&source, Some(&RampStub)), Err(DecodeError::TruncatedInput(_))));
  }
}
