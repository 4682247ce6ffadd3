// SPDX-License-Identifier: LGPL-2.1

pub struct Pix2D<T> {
  pub width: usize,
  pub height: usize,
  pub data: Vec<T>,
}

pub type PixI32 = Pix2D<i32>;
pub type PixF32 = Pix2D<f32>;

impl<T> Pix2D<T>
where
  T: Copy + Default,
{
  pub fn new_with(data: Vec<T>, width: usize, height: usize) -> Self {
    assert_eq!(data.len(), height * width);
    Self { data, width, height }
  }

  pub fn new(width: usize, height: usize) -> Self {
    let data = vec![T::default(); width * height];
    Self { data, width, height }
  }

  pub fn into_inner(self) -> Vec<T> {
    self.data
  }

  pub fn pixels(&self) -> &[T] {
    &self.data
  }

  pub fn pixels_mut(&mut self) -> &mut [T] {
    &mut self.data
  }

  pub fn pixel_rows(&self) -> std::slice::ChunksExact<'_, T> {
    self.data.chunks_exact(self.width)
  }

  pub fn pixel_rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, T> {
    self.data.chunks_exact_mut(self.width)
  }

  #[inline(always)]
  pub fn at(&self, row: usize, col: usize) -> &T {
    &self.data[row * self.width + col]
  }

  #[inline(always)]
  pub fn at_mut(&mut self, row: usize, col: usize) -> &mut T {
    &mut self.data[row * self.width + col]
  }

  /// Row/column swap. The MAR345 decompression routine emits its grid in
  /// the opposite axis order from this crate's convention.
  pub fn transpose(&self) -> Self {
    let mut out = Self::new(self.height, self.width);
    for row in 0..self.height {
      for col in 0..self.width {
        *out.at_mut(col, row) = *self.at(row, col);
      }
    }
    out
  }
}

impl<T> Default for Pix2D<T>
where
  T: Default,
{
  fn default() -> Self {
    Self {
      width: 0,
      height: 0,
      data: Default::default(),
    }
  }
}
