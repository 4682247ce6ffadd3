// SPDX-License-Identifier: LGPL-2.1

//! GE amorphous-silicon panel files from APS 1-ID.
//!
//! Three variants share one fixed 2048x2048 geometry and carry no geometry
//! header at all; everything about the panel is known out of band. `.sum`
//! files are little-endian f32 totals, `.avg` files are u16 averages, and
//! extensionless raw exposures hold one or more u16 frames after a fixed
//! preamble, which decode as their per-pixel sum.

use log::debug;

use crate::bits::Endian;
use crate::cursor::ByteCursor;
use crate::decoders::{SampleEncoding, read_sample_grid};
use crate::rasterimage::{RasterData, RasterImage, RasterMeta};
use crate::source::DataSource;
use crate::{DecodeError, Result};

pub const GE_SIZE: usize = 2048;

/// Raw exposure layout: frame count location and start of frame data.
const RAW_NFRAMES_OFFSET: usize = 18;
const RAW_DATA_OFFSET: usize = 8192;

fn ge_meta() -> RasterMeta {
  RasterMeta {
    pixel_size: (200.0, 200.0),
    wavelength: 0.15,
    distance: 250.0,
    center: (204.8, 204.8),
    size: (GE_SIZE as u32, GE_SIZE as u32),
  }
}

pub fn decode_sum(source: &DataSource) -> Result<RasterImage> {
  let mut cursor = ByteCursor::new(source.buf(), Endian::Little);
  let data = read_sample_grid(&mut cursor, SampleEncoding::F32, GE_SIZE, GE_SIZE)?;
  // Summed frames are integral counts stored as floats; carry them back
  // to the integer grid like the other panel variants.
  let data = match data {
    RasterData::Float(samples) => RasterData::Integer(samples.into_iter().map(|v| v as i32).collect()),
    other => other,
  };
  Ok(RasterImage::new("GE sum", ge_meta(), data).with_comments(vec!["GE detector sum data from APS 1-ID".to_string()]))
}

pub fn decode_avg(source: &DataSource) -> Result<RasterImage> {
  let mut cursor = ByteCursor::new(source.buf(), Endian::Little);
  let data = read_sample_grid(&mut cursor, SampleEncoding::U16, GE_SIZE, GE_SIZE)?;
  Ok(RasterImage::new("GE avg", ge_meta(), data).with_comments(vec!["GE detector avg data from APS 1-ID".to_string()]))
}

/// Decode a raw multi-frame exposure as the widening sum of its frames.
/// Frame pixels are u16 but sums over many frames overflow that range, so
/// accumulation happens in the i32 grid directly.
pub fn decode_raw(source: &DataSource) -> Result<RasterImage> {
  let mut cursor = ByteCursor::new(source.buf(), Endian::Little);
  cursor.seek(RAW_NFRAMES_OFFSET);
  let nframes = cursor.read_u16()? as usize;
  if nframes == 0 {
    return Err(DecodeError::MalformedRecord("raw exposure declares zero frames".to_string()));
  }
  debug!("GE raw exposure, {} frames", nframes);

  let mut sum = vec![0_i32; GE_SIZE * GE_SIZE];
  let mut frame = vec![0_u16; GE_SIZE * GE_SIZE];
  cursor.seek(RAW_DATA_OFFSET);
  for _ in 0..nframes {
    cursor.read_u16_into(&mut frame)?;
    for (acc, px) in sum.iter_mut().zip(frame.iter()) {
      *acc += *px as i32;
    }
  }

  let image = RasterImage::new("GE raw", ge_meta(), RasterData::Integer(sum));
  Ok(image.with_comments(vec![format!("GE detector raw data from APS 1-ID, sum of {} frames", nframes)]))
}
