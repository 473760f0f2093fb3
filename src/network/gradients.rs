use crate::math::matrix::Matrix;

/// Gradient pair for one layer, shaped like that layer's `(W, b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGradients {
    pub weights: Matrix,
    pub biases: Matrix,
}

/// Output of one backward pass: one `LayerGradients` per layer, in network
/// order. Values are summed (not averaged) over the samples of the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub layers: Vec<LayerGradients>,
    /// Number of samples the sums were taken over.
    pub batch_len: usize,
}

impl Gradients {
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerGradients> {
        self.layers.iter()
    }
}
