// SPDX-License-Identifier: LGPL-2.1

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{Entry, MAX_CHAINED_IFD, TIFF_MAGIC};
use crate::bits::Endian;
use crate::cursor::ByteCursor;
use crate::{DecodeError, Result};

/// One directory: a sorted mapping from tag number to its parsed entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ifd {
  pub offset: u32,
  pub next_ifd: u32,
  pub endian: Endian,
  pub entries: BTreeMap<u16, Entry>,
}

impl Ifd {
  pub fn parse(cursor: &mut ByteCursor<'_>, offset: u32) -> Result<Ifd> {
    cursor.seek(offset as usize);
    let entry_count = cursor.read_u16()?;
    let mut entries = BTreeMap::new();
    for _ in 0..entry_count {
      let slot = cursor.position();
      let tag = cursor.read_u16()?;
      match Entry::parse(cursor, tag) {
        Ok(entry) => {
          entries.insert(entry.tag, entry);
        }
        Err(err) => {
          // A single unparseable entry does not sink the directory.
          log::info!("failed to parse tag {:#06x}, skipping: {:?}", tag, err);
        }
      }
      // A failed parse leaves the cursor wherever the bad payload sent it;
      // the next entry always starts 12 bytes after this one's slot.
      cursor.seek(slot + 12);
    }

    // Some writers omit the next-directory pointer; treat that as end of chain.
    let next_ifd = match cursor.read_u32() {
      Ok(ptr) => ptr,
      Err(e) => {
        debug!("no next-IFD pointer, ending chain: {}", e);
        0
      }
    };

    Ok(Ifd {
      offset,
      next_ifd,
      endian: cursor.endian(),
      entries,
    })
  }

  pub fn entry_count(&self) -> usize {
    self.entries.len()
  }

  pub fn get_entry<T: Into<u16>>(&self, tag: T) -> Option<&Entry> {
    self.entries.get(&tag.into())
  }

  pub fn has_entry<T: Into<u16>>(&self, tag: T) -> bool {
    self.get_entry(tag).is_some()
  }
}

/// The parsed chain of directories of one file, plus its byte order.
/// Transient: scoped to a single decode call, never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagDirectory {
  pub endian: Endian,
  pub chain: Vec<Ifd>,
}

impl TagDirectory {
  /// Quick probe: does the buffer start with a TIFF byte-order mark?
  pub fn is_tif(buf: &[u8]) -> bool {
    buf.len() >= 4 && (buf[0..4] == [0x49, 0x49, 0x2a, 0x00] || buf[0..4] == [0x4d, 0x4d, 0x00, 0x2a])
  }

  /// Parse the directory chain from a full file buffer.
  ///
  /// An unknown byte-order mark or a failed magic check means this is some
  /// other format, not a broken file, and fails with
  /// [`DecodeError::NotThisFormat`] so the dispatcher can try elsewhere.
  pub fn parse(buf: &[u8]) -> Result<TagDirectory> {
    let mut cursor = ByteCursor::new(buf, Endian::Little);
    let endian = match cursor.read_u16()? {
      0x4949 => Endian::Little,
      0x4d4d => Endian::Big,
      x => {
        return Err(DecodeError::NotThisFormat(format!("unknown byte-order marker {:#06x}", x)));
      }
    };
    let mut cursor = cursor.with_endian(endian);
    let magic = cursor.read_u16()?;
    if magic != TIFF_MAGIC {
      return Err(DecodeError::NotThisFormat(format!("bad magic {}, expected {}", magic, TIFF_MAGIC)));
    }

    let mut next_ifd = cursor.read_u32()?;
    if next_ifd == 0 {
      return Err(DecodeError::NotThisFormat("header contains no root directory".to_string()));
    }

    let mut chain = Vec::new();
    while next_ifd != 0 {
      let ifd = Ifd::parse(&mut cursor, next_ifd)?;
      if ifd.entries.is_empty() {
        return Err(DecodeError::NotThisFormat("directory contains no entries".to_string()));
      }
      next_ifd = ifd.next_ifd;
      chain.push(ifd);
      if chain.len() > MAX_CHAINED_IFD {
        break;
      }
    }

    Ok(TagDirectory { endian, chain })
  }

  pub fn root_ifd(&self) -> &Ifd {
    &self.chain[0]
  }

  /// First entry for `tag` anywhere in the chain.
  pub fn get_entry<T: Into<u16> + Copy>(&self, tag: T) -> Option<&Entry> {
    self.chain.iter().find_map(|ifd| ifd.get_entry(tag))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::formats::tifdir::Value;
  use crate::tags::TifTag;

  /// Hand-assemble a minimal single-IFD little-endian TIFF header.
  /// Entries are (tag, type, count, inline value bytes).
  pub(crate) fn build_le_tif(entries: &[(u16, u16, u32, [u8; 4])]) -> Vec<u8> {
    let mut buf = vec![0x49, 0x49, 0x2a, 0x00, 0x08, 0x00, 0x00, 0x00];
    buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for (tag, typ, count, value) in entries {
      buf.extend_from_slice(&tag.to_le_bytes());
      buf.extend_from_slice(&typ.to_le_bytes());
      buf.extend_from_slice(&count.to_le_bytes());
      buf.extend_from_slice(value);
    }
    buf.extend_from_slice(&[0, 0, 0, 0]); // no next IFD
    buf
  }

  #[test]
  fn parses_single_le_directory() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let buf = build_le_tif(&[
      (256, 3, 1, [0x00, 0x08, 0, 0]), // width 2048, SHORT
      (257, 3, 1, [0x00, 0x08, 0, 0]),
      (273, 4, 1, [0x08, 0x00, 0, 0]), // strip offset 8, LONG
    ]);
    let dir = TagDirectory::parse(&buf)?;
    assert_eq!(dir.endian, Endian::Little);
    assert_eq!(dir.root_ifd().entry_count(), 3);
    assert_eq!(dir.get_entry(TifTag::ImageWidth).unwrap().value.force_u32(0), 2048);
    assert!(matches!(dir.get_entry(TifTag::StripOffsets).unwrap().value, Value::Long(_)));
    Ok(())
  }

  #[test]
  fn parses_big_endian_directory() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut buf = vec![0x4d, 0x4d, 0x00, 0x2a, 0x00, 0x00, 0x00, 0x08];
    buf.extend_from_slice(&1_u16.to_be_bytes());
    buf.extend_from_slice(&256_u16.to_be_bytes());
    buf.extend_from_slice(&3_u16.to_be_bytes());
    buf.extend_from_slice(&1_u32.to_be_bytes());
    buf.extend_from_slice(&[0x06, 0x00, 0, 0]); // SHORT 1536 big-endian
    buf.extend_from_slice(&[0, 0, 0, 0]);
    let dir = TagDirectory::parse(&buf)?;
    assert_eq!(dir.endian, Endian::Big);
    assert_eq!(dir.get_entry(256_u16).unwrap().value.force_u32(0), 1536);
    Ok(())
  }

  #[test]
  fn bad_entry_does_not_derail_its_neighbors() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // First entry points 100 LONGs at offset 60, past the end of the
    // buffer. It must be skipped without moving the read position of the
    // entries that follow it.
    let buf = build_le_tif(&[
      (270, 4, 100, [60, 0, 0, 0]),
      (256, 3, 1, [0x00, 0x08, 0, 0]),
      (257, 3, 1, [0x00, 0x08, 0, 0]),
    ]);
    let dir = TagDirectory::parse(&buf)?;
    assert_eq!(dir.root_ifd().entry_count(), 2);
    assert!(!dir.root_ifd().has_entry(270_u16));
    assert_eq!(dir.get_entry(TifTag::ImageWidth).unwrap().value.force_u32(0), 2048);
    assert_eq!(dir.get_entry(TifTag::ImageLength).unwrap().value.force_u32(0), 2048);
    Ok(())
  }

  #[test]
  fn unknown_marker_is_not_this_format() {
    let buf = [0x4a, 0x46, 0x49, 0x46, 0, 0, 0, 0];
    assert!(matches!(TagDirectory::parse(&buf), Err(DecodeError::NotThisFormat(_))));
  }

  #[test]
  fn bad_magic_is_not_this_format() {
    let buf = [0x49, 0x49, 0x2b, 0x00, 0x08, 0, 0, 0];
    assert!(matches!(TagDirectory::parse(&buf), Err(DecodeError::NotThisFormat(_))));
  }

  #[test]
  fn truncated_directory_is_fatal() {
    // Valid header, but the directory is cut short.
    let buf = [0x49, 0x49, 0x2a, 0x00, 0x08, 0x00, 0x00, 0x00, 0x05];
    assert!(matches!(TagDirectory::parse(&buf), Err(DecodeError::TruncatedInput(_))));
  }
}
