// SPDX-License-Identifier: LGPL-2.1

/// The handful of baseline TIFF tags the vendor classifier consults.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum TifTag {
  ImageWidth = 256,
  ImageLength = 257,
  BitsPerSample = 258,
  PhotometricInt = 262,
  Model = 272,
  StripOffsets = 273,
  SampleFormat = 339,
}

impl From<TifTag> for u16 {
  fn from(tag: TifTag) -> Self {
    tag as u16
  }
}

/// Values of the SampleFormat tag (339).
pub const SAMPLE_FORMAT_UINT: u16 = 1;
pub const SAMPLE_FORMAT_INT: u16 = 2;
pub const SAMPLE_FORMAT_IEEEFP: u16 = 3;
