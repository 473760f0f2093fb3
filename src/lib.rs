pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod data;

// Convenience re-exports
pub use error::{NnError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::Activation;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use network::gradients::{Gradients, LayerGradients};
pub use network::persist::{load_model, save_model};
pub use network::spec::{ImageShape, NetworkSpec};
pub use loss::{mse::MseLoss, one_hot::OneHotEncoder};
pub use optim::sgd::Sgd;
pub use train::{EpochStats, TrainConfig};
pub use data::{canvas::Canvas, idx::{Dataset, IdxDataset}};
