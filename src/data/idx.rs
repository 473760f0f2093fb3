//! IDX image/label pairs as used by MNIST and its derivatives.
//!
//! # Image file layout
//! ```text
//! bytes  0-3:   magic 2051  (big-endian u32, 0x00000803)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # Label file layout
//! ```text
//! bytes  0-3:   magic 2049  (big-endian u32, 0x00000801)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index
//! ```

use log::debug;

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;
use crate::network::spec::ImageShape;

pub const IMAGE_MAGIC: u32 = 2051;
pub const LABEL_MAGIC: u32 = 2049;

/// Index-aligned samples and integer labels consumed by training and
/// evaluation.
pub trait Dataset {
    fn images(&self) -> &[Matrix];
    fn labels(&self) -> &[usize];

    fn len(&self) -> usize {
        self.labels().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An IDX pair decoded into `rows x cols` matrices with pixels in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct IdxDataset {
    images: Vec<Matrix>,
    labels: Vec<usize>,
    shape: ImageShape,
}

impl Dataset for IdxDataset {
    fn images(&self) -> &[Matrix] {
        &self.images
    }

    fn labels(&self) -> &[usize] {
        &self.labels
    }
}

impl IdxDataset {
    pub fn load(image_path: &str, label_path: &str) -> Result<IdxDataset> {
        let image_bytes = std::fs::read(image_path)?;
        let label_bytes = std::fs::read(label_path)?;
        let dataset = IdxDataset::parse(&image_bytes, &label_bytes)?;
        debug!(
            "loaded {} images of {}x{} from {}",
            dataset.len(), dataset.shape.rows, dataset.shape.cols, image_path
        );
        Ok(dataset)
    }

    pub fn parse(image_bytes: &[u8], label_bytes: &[u8]) -> Result<IdxDataset> {
        // ── Image header ────────────────────────────────────────────────────
        if image_bytes.len() < 16 {
            return Err(NnError::Format(format!(
                "IDX image file too short: expected at least 16 header bytes, got {}",
                image_bytes.len()
            )));
        }
        let magic = be_u32(image_bytes, 0);
        if magic != IMAGE_MAGIC {
            return Err(NnError::Format(format!(
                "incorrect image file magic: {} (expected {})",
                magic, IMAGE_MAGIC
            )));
        }
        let n_items = be_u32(image_bytes, 4) as usize;
        let rows = be_u32(image_bytes, 8) as usize;
        let cols = be_u32(image_bytes, 12) as usize;

        // ── Label header ────────────────────────────────────────────────────
        if label_bytes.len() < 8 {
            return Err(NnError::Format(format!(
                "IDX label file too short: expected at least 8 header bytes, got {}",
                label_bytes.len()
            )));
        }
        let magic = be_u32(label_bytes, 0);
        if magic != LABEL_MAGIC {
            return Err(NnError::Format(format!(
                "incorrect label file magic: {} (expected {})",
                magic, LABEL_MAGIC
            )));
        }
        let n_labels = be_u32(label_bytes, 4) as usize;
        if n_labels != n_items {
            return Err(NnError::Format(format!(
                "number of images ({}) does not match number of labels ({})",
                n_items, n_labels
            )));
        }

        // ── Payload sizes ───────────────────────────────────────────────────
        if rows == 0 || cols == 0 {
            return Err(NnError::Format(format!("IDX images must not be empty, header says {}x{}", rows, cols)));
        }
        let n_pixels = rows.checked_mul(cols)
            .ok_or_else(|| NnError::Format(format!("image size {}x{} overflows", rows, cols)))?;
        let image_len = n_items.checked_mul(n_pixels)
            .ok_or_else(|| NnError::Format("image data length overflows".into()))?;
        if image_bytes.len() - 16 < image_len {
            return Err(NnError::Format(format!(
                "IDX image file too short: header declares {} images of {}x{} ({} bytes), \
                 but only {} data bytes follow",
                n_items, rows, cols, image_len, image_bytes.len() - 16
            )));
        }
        if label_bytes.len() - 8 < n_items {
            return Err(NnError::Format(format!(
                "IDX label file too short: header declares {} labels, but only {} bytes follow",
                n_items, label_bytes.len() - 8
            )));
        }

        // ── Decode ──────────────────────────────────────────────────────────
        let images = image_bytes[16..16 + image_len]
            .chunks_exact(n_pixels)
            .map(|chunk| {
                let pixels = chunk.iter().map(|&px| px as f64 / 255.0).collect();
                Matrix::from_vec(rows, cols, pixels)
            })
            .collect::<Result<Vec<_>>>()?;
        let labels = label_bytes[8..8 + n_items].iter().map(|&l| l as usize).collect();

        Ok(IdxDataset {
            images,
            labels,
            shape: ImageShape { rows, cols },
        })
    }

    pub fn image_shape(&self) -> ImageShape {
        self.shape
    }

    /// Keeps only the first `n` samples.
    pub fn take(mut self, n: usize) -> IdxDataset {
        self.images.truncate(n);
        self.labels.truncate(n);
        self
    }
}

fn be_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}
