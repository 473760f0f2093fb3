//! Pixel canvas for single-sample inference.
//!
//! A drawing surface collects intensities in `[0, 1]`; before inference the
//! grid is resized to the network's input image shape with the `image`
//! crate and flattened by `Network::forward`.

use image::{imageops::{self, FilterType}, GrayImage};

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Brush stamp: centre, edge neighbours, diagonal neighbours.
/// Softens strokes to look like anti-aliased MNIST digits.
const BRUSH: [(i64, i64, f64); 9] = [
    (0, 0, 1.0),
    (-1, 0, 0.5),
    (1, 0, 0.5),
    (0, -1, 0.5),
    (0, 1, 0.5),
    (-1, -1, 0.25),
    (-1, 1, 0.25),
    (1, -1, 0.25),
    (1, 1, 0.25),
];

#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: Matrix,
}

impl Canvas {
    pub fn new(rows: usize, cols: usize) -> Canvas {
        Canvas { pixels: Matrix::zeros(rows, cols) }
    }

    pub fn pixels(&self) -> &Matrix {
        &self.pixels
    }

    pub fn clear(&mut self) {
        self.pixels = Matrix::zeros(self.pixels.rows(), self.pixels.cols());
    }

    /// Stamps the brush centred at `(row, col)`. Cells outside the canvas
    /// are skipped and existing intensities are never lowered.
    pub fn stroke(&mut self, row: i64, col: i64) {
        let (rows, cols) = self.pixels.shape();
        let data = self.pixels.as_mut_slice();
        for &(dr, dc, value) in BRUSH.iter() {
            let (r, c) = match (cell_index(row, dr, rows), cell_index(col, dc, cols)) {
                (Some(r), Some(c)) => (r, c),
                _ => continue,
            };
            let cell = &mut data[r * cols + c];
            *cell = cell.max(value);
        }
    }

    /// The canvas resized to `rows x cols`, ready for `Network::forward`.
    pub fn to_input(&self, rows: usize, cols: usize) -> Result<Matrix> {
        resize_pixels(&self.pixels, rows, cols)
    }
}

/// `base + offset` as an index below `len`, or `None` when it falls outside.
fn cell_index(base: i64, offset: i64, len: usize) -> Option<usize> {
    let index = usize::try_from(base.checked_add(offset)?).ok()?;
    (index < len).then_some(index)
}

/// Resizes a `[0, 1]` intensity matrix to `rows x cols` (triangle filter).
/// Values are quantised to 8 bits on the way through.
pub fn resize_pixels(pixels: &Matrix, rows: usize, cols: usize) -> Result<Matrix> {
    if rows == 0 || cols == 0 || pixels.rows() == 0 || pixels.cols() == 0 {
        return Err(NnError::Image(format!(
            "cannot resize {}x{} pixels to {}x{}",
            pixels.rows(), pixels.cols(), rows, cols
        )));
    }
    if pixels.shape() == (rows, cols) {
        return Ok(pixels.clone());
    }

    let bytes = pixels.as_slice()
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    let source = GrayImage::from_raw(pixels.cols() as u32, pixels.rows() as u32, bytes)
        .ok_or_else(|| NnError::Image("pixel buffer does not match its dimensions".into()))?;

    let resized = imageops::resize(&source, cols as u32, rows as u32, FilterType::Triangle);
    let values = resized.pixels().map(|p| p.0[0] as f64 / 255.0).collect();
    Matrix::from_vec(rows, cols, values)
}
