// SPDX-License-Identifier: LGPL-2.1

use std::{
  fmt::Debug,
  fs::File,
  ops::Deref,
  path::{Path, PathBuf},
  sync::Arc,
};

use memmap2::MmapOptions;

/// A single decode call reads from one of these; the mapping (or buffer) is
/// dropped when the call returns, so no file handle outlives a decode.
pub struct DataSource {
  path: PathBuf,
  inner: DataSourceImpl,
}

enum DataSourceImpl {
  Memmap(memmap2::Mmap),
  Memory(Arc<Vec<u8>>),
}

impl DataSource {
  pub fn new(path: &Path) -> std::io::Result<Self> {
    let file = File::open(path)?;
    let mmap = unsafe { MmapOptions::new().populate().map(&file)? };
    #[cfg(unix)]
    {
      mmap.advise(memmap2::Advice::Sequential)?;
    }
    Ok(Self {
      path: path.canonicalize().unwrap_or_else(|_| path.to_owned()),
      inner: DataSourceImpl::Memmap(mmap),
    })
  }

  pub fn new_from_shared_vec(buf: Arc<Vec<u8>>) -> Self {
    Self {
      path: PathBuf::default(),
      inner: DataSourceImpl::Memory(buf),
    }
  }

  pub fn new_from_slice(buf: &[u8]) -> Self {
    Self::new_from_shared_vec(Arc::new(Vec::from(buf)))
  }

  pub fn with_path(self, path: impl AsRef<Path>) -> Self {
    Self {
      path: path.as_ref().to_owned(),
      inner: self.inner,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn buf(&self) -> &[u8] {
    self.deref()
  }

  pub fn len(&self) -> usize {
    self.buf().len()
  }

  pub fn is_empty(&self) -> bool {
    self.buf().is_empty()
  }
}

impl Deref for DataSource {
  type Target = [u8];

  fn deref(&self) -> &Self::Target {
    match &self.inner {
      DataSourceImpl::Memmap(mmap) => mmap.deref(),
      DataSourceImpl::Memory(mem) => mem.deref(),
    }
  }
}

impl Debug for DataSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DataSource").field("path", &self.path).finish()
  }
}
