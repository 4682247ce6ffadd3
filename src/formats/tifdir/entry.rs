// SPDX-License-Identifier: LGPL-2.1

use log::debug;
use serde::{Deserialize, Serialize};

use super::value::{Rational, TifAscii, Value};
use crate::Result;
use crate::cursor::ByteCursor;

const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;
const TYPE_FLOAT: u16 = 11;

// Per-type shift from element count to byte size, indexed by type code.
const DATASHIFTS: [u8; 14] = [0, 0, 0, 1, 2, 3, 0, 0, 1, 2, 3, 2, 3, 2];

/// One parsed directory entry: the typed value list plus the offset its
/// payload was read from (inline position for values that fit in 4 bytes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
  pub tag: u16,
  pub value: Value,
  pub offset: u32,
}

impl Entry {
  pub fn count(&self) -> usize {
    self.value.count()
  }

  pub fn value_type(&self) -> u16 {
    self.value.value_type()
  }

  /// Parse one 12-byte entry. The cursor stands just past the tag id; on
  /// return it stands at the next entry regardless of where the payload was.
  pub fn parse(cursor: &mut ByteCursor<'_>, tag: u16) -> Result<Entry> {
    let pos = cursor.position() - 2;

    let typ = cursor.read_u16()?;
    let count = cursor.read_u32()?;

    debug!("tag {:#06x}, type {}, count {}", tag, typ, count);

    // Unknown types are treated as byte payloads.
    let compat_typ = if typ == 0 || typ > 13 { 7 } else { typ };
    let bytesize = (count as usize) << DATASHIFTS[compat_typ as usize];
    let offset: u32 = if bytesize <= 4 { cursor.position() as u32 } else { cursor.read_u32()? };
    cursor.seek(offset as usize);

    let value = match typ {
      TYPE_BYTE => {
        let v = cursor.read_bytes(count as usize)?.to_vec();
        Value::Byte(v)
      }
      TYPE_ASCII => {
        let v = cursor.read_bytes(count as usize)?;
        Value::Ascii(TifAscii::new_from_raw(v))
      }
      TYPE_SHORT => {
        let mut v = vec![0_u16; count as usize];
        cursor.read_u16_into(&mut v)?;
        Value::Short(v)
      }
      TYPE_LONG => {
        let mut v = vec![0_u32; count as usize];
        cursor.read_u32_into(&mut v)?;
        Value::Long(v)
      }
      TYPE_RATIONAL => {
        let mut tmp = vec![0_u32; count as usize * 2];
        cursor.read_u32_into(&mut tmp)?;
        let v = tmp.chunks_exact(2).map(|pair| Rational::new(pair[0], pair[1])).collect();
        Value::Rational(v)
      }
      TYPE_FLOAT => {
        let mut v = vec![0.0_f32; count as usize];
        cursor.read_f32_into(&mut v)?;
        Value::Float(v)
      }
      x => {
        let v = cursor.read_bytes(count as usize)?.to_vec();
        Value::Unknown(x, v)
      }
    };

    cursor.seek(pos + 12);
    Ok(Entry { tag, value, offset })
  }
}
