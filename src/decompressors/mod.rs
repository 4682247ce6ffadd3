// SPDX-License-Identifier: LGPL-2.1

//! External decompression capabilities.
//!
//! The MAR345 pixel expansion is a proprietary algorithm shipped as a native
//! routine outside this crate. Decoders take it as an injected capability so
//! a pure-Rust reimplementation or a test stub can stand in for it.

use crate::Result;
use crate::pixarray::PixI32;

/// The MAR345 pixel-expansion primitive.
///
/// `payload` is the compressed byte stream that follows the overflow table,
/// `side` the square image side length from the `FORMAT` header line. The
/// implementation fills `out`, which is pre-sized to `side` x `side`.
pub trait Mar345Decompress: Send + Sync {
  fn decompress(&self, payload: &[u8], side: usize, out: &mut PixI32) -> Result<()>;
}
