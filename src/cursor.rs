// SPDX-License-Identifier: LGPL-2.1

//! Checked cursor over a random-access byte source.
//!
//! Every binary decoder in this crate routes its reads through [`ByteCursor`];
//! no decoder does raw offset arithmetic on a file handle. Short reads are
//! reported as [`DecodeError::TruncatedInput`] with the position that failed.

use crate::DecodeError;
use crate::Result;
use crate::bits::Endian;

#[derive(Debug, Copy, Clone)]
pub struct ByteCursor<'a> {
  buf: &'a [u8],
  pos: usize,
  endian: Endian,
}

impl<'a> ByteCursor<'a> {
  pub fn new(buf: &'a [u8], endian: Endian) -> Self {
    Self { buf, pos: 0, endian }
  }

  pub fn with_endian(self, endian: Endian) -> Self {
    Self { endian, ..self }
  }

  #[inline]
  pub fn endian(&self) -> Endian {
    self.endian
  }

  /// Absolute seek. Seeking past the end is allowed; the next read fails.
  #[inline]
  pub fn seek(&mut self, offset: usize) {
    self.pos = offset;
  }

  #[inline]
  pub fn position(&self) -> usize {
    self.pos
  }

  #[inline]
  pub fn remaining(&self) -> usize {
    self.buf.len().saturating_sub(self.pos)
  }

  pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
    let chunk = self
      .buf
      .get(self.pos..self.pos.saturating_add(n))
      .ok_or_else(|| DecodeError::TruncatedInput(format!("need {} bytes at offset {}, only {} remain", n, self.pos, self.remaining())))?;
    self.pos += n;
    Ok(chunk)
  }

  #[inline]
  pub fn read_u8(&mut self) -> Result<u8> {
    Ok(self.read_bytes(1)?[0])
  }

  #[inline]
  pub fn read_u16(&mut self) -> Result<u16> {
    let endian = self.endian;
    Ok(endian.read_u16(self.read_bytes(2)?, 0))
  }

  #[inline]
  pub fn read_u32(&mut self) -> Result<u32> {
    let endian = self.endian;
    Ok(endian.read_u32(self.read_bytes(4)?, 0))
  }

  #[inline]
  pub fn read_i32(&mut self) -> Result<i32> {
    let endian = self.endian;
    Ok(endian.read_i32(self.read_bytes(4)?, 0))
  }

  #[inline]
  pub fn read_f32(&mut self) -> Result<f32> {
    let endian = self.endian;
    Ok(endian.read_f32(self.read_bytes(4)?, 0))
  }

  pub fn read_u16_into(&mut self, dst: &mut [u16]) -> Result<()> {
    let endian = self.endian;
    let src = self.read_bytes(dst.len() * 2)?;
    for (i, v) in dst.iter_mut().enumerate() {
      *v = endian.read_u16(src, i * 2);
    }
    Ok(())
  }

  pub fn read_u32_into(&mut self, dst: &mut [u32]) -> Result<()> {
    let endian = self.endian;
    let src = self.read_bytes(dst.len() * 4)?;
    for (i, v) in dst.iter_mut().enumerate() {
      *v = endian.read_u32(src, i * 4);
    }
    Ok(())
  }

  pub fn read_i32_into(&mut self, dst: &mut [i32]) -> Result<()> {
    let endian = self.endian;
    let src = self.read_bytes(dst.len() * 4)?;
    for (i, v) in dst.iter_mut().enumerate() {
      *v = endian.read_i32(src, i * 4);
    }
    Ok(())
  }

  pub fn read_f32_into(&mut self, dst: &mut [f32]) -> Result<()> {
    let endian = self.endian;
    let src = self.read_bytes(dst.len() * 4)?;
    for (i, v) in dst.iter_mut().enumerate() {
      *v = endian.read_f32(src, i * 4);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn typed_reads_respect_endianness() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let buf = [0x01, 0x02, 0x03, 0x04];
    let mut le = ByteCursor::new(&buf, Endian::Little);
    assert_eq!(le.read_u16()?, 0x0201);
    assert_eq!(le.read_u16()?, 0x0403);

    let mut be = ByteCursor::new(&buf, Endian::Big);
    assert_eq!(be.read_u32()?, 0x01020304);
    Ok(())
  }

  #[test]
  fn short_read_is_truncated_input() {
    let buf = [0u8; 3];
    let mut cur = ByteCursor::new(&buf, Endian::Little);
    assert!(matches!(cur.read_u32(), Err(DecodeError::TruncatedInput(_))));
  }

  #[test]
  fn seek_is_absolute_and_idempotent() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let buf = [0x10, 0x20, 0x30, 0x40];
    let mut cur = ByteCursor::new(&buf, Endian::Little);
    cur.seek(2);
    cur.seek(2);
    assert_eq!(cur.read_u8()?, 0x30);
    cur.seek(2);
    assert_eq!(cur.read_u8()?, 0x30);
    Ok(())
  }

  #[test]
  fn read_past_end_after_seek_fails() {
    let buf = [0u8; 4];
    let mut cur = ByteCursor::new(&buf, Endian::Little);
    cur.seek(100);
    assert_eq!(cur.remaining(), 0);
    assert!(matches!(cur.read_u8(), Err(DecodeError::TruncatedInput(_))));
  }
}
