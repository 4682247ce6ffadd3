// SPDX-License-Identifier: LGPL-2.1

use serde::{Deserialize, Serialize};

/// Sample storage for a decoded raster. Nearly all detectors decode to the
/// integer grid; the Perkin-Elmer float variant keeps its samples at full
/// precision instead of rounding them through the integer path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RasterData {
  Integer(Vec<i32>),
  Float(Vec<f32>),
}

impl RasterData {
  pub fn len(&self) -> usize {
    match self {
      Self::Integer(d) => d.len(),
      Self::Float(d) => d.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Geometry and beam metadata recovered from a raster file header.
///
/// Units follow the instrument conventions: pixel size in microns,
/// wavelength in Angstrom, detector distance in mm, beam center in mm
/// from the detector corner. `size` is `(rows, cols)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterMeta {
  pub pixel_size: (f64, f64),
  pub wavelength: f64,
  pub distance: f64,
  pub center: (f64, f64),
  pub size: (u32, u32),
}

/// One decoded detector exposure: a dense row-major grid plus its metadata.
/// Constructed atomically by a single decode call and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterImage {
  /// Vendor label chosen by the classifier (or the fixed format name).
  pub detector: String,
  pub meta: RasterMeta,
  pub data: RasterData,
  /// Free-text header lines the decoder scanned past, in file order.
  pub comments: Vec<String>,
}

impl RasterImage {
  pub fn new(detector: impl Into<String>, meta: RasterMeta, data: RasterData) -> Self {
    assert_eq!(data.len(), meta.size.0 as usize * meta.size.1 as usize);
    Self {
      detector: detector.into(),
      meta,
      data,
      comments: Vec::new(),
    }
  }

  pub fn with_comments(mut self, comments: Vec<String>) -> Self {
    self.comments = comments;
    self
  }

  pub fn rows(&self) -> usize {
    self.meta.size.0 as usize
  }

  pub fn cols(&self) -> usize {
    self.meta.size.1 as usize
  }
}
