pub mod canvas;
pub mod idx;

pub use canvas::{resize_pixels, Canvas};
pub use idx::{Dataset, IdxDataset};
