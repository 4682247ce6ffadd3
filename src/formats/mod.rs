// SPDX-License-Identifier: LGPL-2.1

pub mod tifdir;
