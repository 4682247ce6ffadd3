// SPDX-License-Identifier: LGPL-2.1
//! Library for reading powder-diffraction instrument files.
//!
//! Two families of input are covered. Area-detector exposures arrive as
//! binary rasters in several vendor containers (TIFF-family with a vendor
//! classification step, MAR345 compressed plates, EDF, ADSC and GE panel
//! files); these decode to a [`RasterImage`]. Point-detector scans arrive
//! as legacy text bank files with a companion instrument-parameter file;
//! these decode to a [`PowderProfile`].
//!
//! ```no_run
//! use powdler::decode_raster_file;
//!
//! let image = decode_raster_file("frame_0001.tif")?;
//! println!("{} {}x{}", image.detector, image.rows(), image.cols());
//! # Ok::<(), powdler::DecodeError>(())
//! ```
//!
//! Every decode call is self-contained: it opens one file, reads it, and
//! returns an immutable value. There is no shared mutable state, so files
//! may be decoded from independent threads without synchronization.

use std::path::Path;

use lazy_static::lazy_static;
use thiserror::Error;

pub mod bits;
pub mod cursor;
pub mod decoders;
pub mod decompressors;
pub mod formats;
pub mod pixarray;
pub mod powder;
pub mod rasterimage;
pub mod source;
pub mod tags;

pub use decoders::{DetectorKind, ProjectRasterReader, RasterFormat, RasterLoader, SampleEncoding, VendorProfile};
pub use decompressors::Mar345Decompress;
pub use powder::{BankDescriptor, BankFormat, BankScan, DataKind, InstrumentParams, PowderProfile, Preset, decode_bank, scan_banks};
pub use rasterimage::{RasterData, RasterImage, RasterMeta};

#[derive(Error, Debug)]
pub enum DecodeError {
  /// Probe failed; the file may well be some other supported format.
  #[error("format mismatch: {0}")]
  NotThisFormat(String),

  #[error("unsupported file: {0}")]
  UnsupportedFile(String),

  #[error("truncated input: {0}")]
  TruncatedInput(String),

  #[error("unrecognized vendor layout: {0}")]
  UnrecognizedVendorLayout(String),

  #[error("compressed payload marker not found before end of file")]
  MarkerNotFound,

  #[error("no decompression routine available for this format")]
  DecompressionUnavailable,

  #[error("no BANK records found; not a bank-formatted powder file")]
  NoBanksFound,

  #[error("malformed record: {0}")]
  MalformedRecord(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

lazy_static! {
  static ref LOADER: RasterLoader = RasterLoader::new();
}

/// Decode one raster file with the default loader.
///
/// The default loader carries no injected capabilities, so MAR345 files
/// fail with [`DecodeError::DecompressionUnavailable`] and project-native
/// rasters with [`DecodeError::UnsupportedFile`]; build a [`RasterLoader`]
/// with the capabilities registered to handle those.
pub fn decode_raster_file<P: AsRef<Path>>(path: P) -> Result<RasterImage> {
  LOADER.decode_file(path.as_ref())
}
