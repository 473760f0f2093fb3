pub mod gradients;
pub mod network;
pub mod persist;
pub mod spec;

pub use gradients::{Gradients, LayerGradients};
pub use network::Network;
pub use persist::{load_model, save_model};
pub use spec::{ImageShape, NetworkSpec};
