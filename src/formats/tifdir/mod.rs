// SPDX-License-Identifier: LGPL-2.1

//! Generic IFD (tag directory) reader for the TIFF container family.
//!
//! This layer knows nothing about detector vendors; it turns the chained
//! directory structure into a mapping from tag number to typed value list.
//! Vendor meaning is assigned later by the classifier in `decoders::tif`.

pub mod entry;
pub mod ifd;
pub mod value;

pub use entry::Entry;
pub use ifd::{Ifd, TagDirectory};
pub use value::{Rational, TifAscii, Value};

pub(crate) const TIFF_MAGIC: u16 = 42;

/// Cap on chained directories; real detector files carry one or two.
pub(crate) const MAX_CHAINED_IFD: usize = 8;
