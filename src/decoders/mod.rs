// SPDX-License-Identifier: LGPL-2.1

//! Per-format raster decoders and the extension-keyed dispatcher.

use std::path::Path;

use log::debug;

use crate::bits::LEi32;
use crate::cursor::ByteCursor;
use crate::decompressors::Mar345Decompress;
use crate::rasterimage::{RasterData, RasterImage};
use crate::source::DataSource;
use crate::{DecodeError, Result};

pub mod adsc;
pub mod edf;
pub mod ge;
pub mod mar345;
pub mod tif;

pub use tif::{DetectorKind, VendorProfile};

/// Per-pixel storage width and numeric type of a raw sample stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SampleEncoding {
  U8,
  U16,
  I32,
  F32,
}

impl SampleEncoding {
  pub fn bytes_per_sample(&self) -> usize {
    match self {
      Self::U8 => 1,
      Self::U16 => 2,
      Self::I32 | Self::F32 => 4,
    }
  }
}

/// Read `rows * cols` samples from the cursor's current position into the
/// canonical grid. Float streams stay float; everything else widens to i32.
pub(crate) fn read_sample_grid(cursor: &mut ByteCursor<'_>, encoding: SampleEncoding, rows: usize, cols: usize) -> Result<RasterData> {
  let npix = rows * cols;
  match encoding {
    SampleEncoding::U8 => {
      let src = cursor.read_bytes(npix)?;
      Ok(RasterData::Integer(src.iter().map(|b| *b as i32).collect()))
    }
    SampleEncoding::U16 => {
      let mut tmp = vec![0_u16; npix];
      cursor.read_u16_into(&mut tmp)?;
      Ok(RasterData::Integer(tmp.into_iter().map(|v| v as i32).collect()))
    }
    SampleEncoding::I32 => {
      let mut out = vec![0_i32; npix];
      cursor.read_i32_into(&mut out)?;
      Ok(RasterData::Integer(out))
    }
    SampleEncoding::F32 => {
      let mut out = vec![0.0_f32; npix];
      cursor.read_f32_into(&mut out)?;
      Ok(RasterData::Float(out))
    }
  }
}

/// Closed set of raster container formats this crate can dispatch to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RasterFormat {
  Tif,
  Edf,
  Adsc,
  Mar345,
  GeSum,
  GeAvg,
  GeRaw,
  /// Project-native serialized raster; handled by an injected reader.
  Project,
}

impl RasterFormat {
  /// Map a path to a candidate format by extension (case-insensitive).
  /// Files without an extension are GE raw exposures by convention.
  pub fn from_path(path: &Path) -> Option<RasterFormat> {
    let ext = match path.extension() {
      Some(ext) => ext.to_string_lossy().to_lowercase(),
      None => String::new(),
    };
    match ext.as_str() {
      "tif" | "tiff" => Some(Self::Tif),
      "edf" => Some(Self::Edf),
      "img" => Some(Self::Adsc),
      "mar3450" | "mar2300" => Some(Self::Mar345),
      "sum" => Some(Self::GeSum),
      "avg" => Some(Self::GeAvg),
      "g2img" => Some(Self::Project),
      "" => Some(Self::GeRaw),
      _ => None,
    }
  }
}

/// Short content probe for files whose extension settles nothing.
pub fn probe(buf: &[u8]) -> Option<RasterFormat> {
  use crate::formats::tifdir::TagDirectory;
  if TagDirectory::is_tif(buf) {
    return Some(RasterFormat::Tif);
  }
  // MAR345 preambles open with the constant 1234 as a little-endian word.
  if buf.len() >= 4 && LEi32(buf, 0) == 1234 {
    return Some(RasterFormat::Mar345);
  }
  if buf.first() == Some(&b'{') {
    return Some(RasterFormat::Edf);
  }
  None
}

/// Reader for rasters round-tripped through the project file (collaborator).
pub trait ProjectRasterReader: Send + Sync {
  fn read_raster(&self, path: &Path) -> Result<RasterImage>;
}

/// The dispatcher. Holds the injected external capabilities; performs no
/// decoding itself beyond routing one file to one decoder.
#[derive(Default)]
pub struct RasterLoader {
  mar345: Option<Box<dyn Mar345Decompress>>,
  project: Option<Box<dyn ProjectRasterReader>>,
}

impl RasterLoader {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_mar345(mut self, decomp: Box<dyn Mar345Decompress>) -> Self {
    self.mar345 = Some(decomp);
    self
  }

  pub fn with_project_reader(mut self, reader: Box<dyn ProjectRasterReader>) -> Self {
    self.project = Some(reader);
    self
  }

  /// Decode one raster file. Opens, reads and closes exactly one source.
  pub fn decode_file(&self, path: &Path) -> Result<RasterImage> {
    let format = match RasterFormat::from_path(path) {
      Some(RasterFormat::Project) => {
        let reader = self
          .project
          .as_ref()
          .ok_or_else(|| DecodeError::UnsupportedFile("no project raster reader registered".to_string()))?;
        return reader.read_raster(path);
      }
      Some(format) => Some(format),
      None => None,
    };

    let source = DataSource::new(path)?;
    let format = match format.or_else(|| probe(source.buf())) {
      Some(format) => format,
      None => return Err(DecodeError::UnsupportedFile(format!("{:?}: unknown extension and no recognizable header", path))),
    };

    match self.decode(&source, format) {
      // The extension promised a format the content disproved; give the
      // probe one chance to pick a different route before giving up.
      Err(DecodeError::NotThisFormat(reason)) => {
        debug!("{:?} is not {:?}: {}", path, format, reason);
        match probe(source.buf()) {
          Some(probed) if probed != format => self.decode(&source, probed),
          _ => Err(DecodeError::UnsupportedFile(format!("{:?}: {}", path, reason))),
        }
      }
      result => result,
    }
  }

  /// Decode an already-opened source as a known format.
  pub fn decode(&self, source: &DataSource, format: RasterFormat) -> Result<RasterImage> {
    debug!("decoding {:?} as {:?}", source.path(), format);
    match format {
      RasterFormat::Tif => tif::decode_tif(source),
      RasterFormat::Edf => edf::decode_edf(source),
      RasterFormat::Adsc => adsc::decode_img(source),
      RasterFormat::Mar345 => mar345::decode_mar345(source, self.mar345.as_deref()),
      RasterFormat::GeSum => ge::decode_sum(source),
      RasterFormat::GeAvg => ge::decode_avg(source),
      RasterFormat::GeRaw => ge::decode_raw(source),
      RasterFormat::Project => {
        let reader = self
          .project
          .as_ref()
          .ok_or_else(|| DecodeError::UnsupportedFile("no project raster reader registered".to_string()))?;
        reader.read_raster(source.path())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extension_routing() {
    assert_eq!(RasterFormat::from_path(Path::new("scan.TIF")), Some(RasterFormat::Tif));
    assert_eq!(RasterFormat::from_path(Path::new("scan.tiff")), Some(RasterFormat::Tif));
    assert_eq!(RasterFormat::from_path(Path::new("a/b/frame.edf")), Some(RasterFormat::Edf));
    assert_eq!(RasterFormat::from_path(Path::new("frame.img")), Some(RasterFormat::Adsc));
    assert_eq!(RasterFormat::from_path(Path::new("x.mar3450")), Some(RasterFormat::Mar345));
    assert_eq!(RasterFormat::from_path(Path::new("x.MAR2300")), Some(RasterFormat::Mar345));
    assert_eq!(RasterFormat::from_path(Path::new("run1.sum")), Some(RasterFormat::GeSum));
    assert_eq!(RasterFormat::from_path(Path::new("run1.avg")), Some(RasterFormat::GeAvg));
    assert_eq!(RasterFormat::from_path(Path::new("ge_frames")), Some(RasterFormat::GeRaw));
    assert_eq!(RasterFormat::from_path(Path::new("saved.g2img")), Some(RasterFormat::Project));
    assert_eq!(RasterFormat::from_path(Path::new("notes.txt")), None);
  }

  #[test]
  fn probe_recognizes_known_headers() {
    assert_eq!(probe(&[0x49, 0x49, 0x2a, 0x00, 0, 0]), Some(RasterFormat::Tif));
    assert_eq!(probe(&[0x4d, 0x4d, 0x00, 0x2a]), Some(RasterFormat::Tif));
    assert_eq!(probe(&1234_i32.to_le_bytes()), Some(RasterFormat::Mar345));
    assert_eq!(probe(b"{\nHeaderID = EH:000001\n"), Some(RasterFormat::Edf));
    assert_eq!(probe(b"BANK 1"), None);
  }
}
