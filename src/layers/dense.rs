use rand::Rng;

use crate::{
    activation::activation::Activation,
    error::{NnError, Result},
    math::matrix::Matrix,
    network::gradients::LayerGradients,
};

/// Initial value of every bias; slightly positive so ReLU units start alive.
pub const INITIAL_BIAS: f64 = 0.1;

/// Fully connected layer: `a = f(W·x + b)`.
///
/// `W` is `outputs x inputs`, `b` is `outputs x 1`. The pre-activation `z`
/// and output `a` of the latest `forward` call are cached for the backward
/// pass that follows it; each call overwrites them.
#[derive(Debug, Clone)]
pub struct Layer {
    weights: Matrix,
    biases: Matrix,
    activation: Activation,
    pre_activation: Option<Matrix>,
    output: Option<Matrix>,
}

impl Layer {
    /// Xavier-style uniform init in `[-1/sqrt(inputs), 1/sqrt(inputs)]`.
    pub fn new<R: Rng + ?Sized>(inputs: usize, outputs: usize, activation: Activation, rng: &mut R) -> Layer {
        let bound = 1.0 / (inputs as f64).sqrt();
        Layer {
            weights: Matrix::random_uniform(outputs, inputs, bound, rng),
            biases: Matrix::new(outputs, 1, INITIAL_BIAS),
            activation,
            pre_activation: None,
            output: None,
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.cols()
    }

    pub fn outputs(&self) -> usize {
        self.weights.rows()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &Matrix {
        &self.biases
    }

    /// `z` from the latest forward pass, if any.
    pub fn pre_activation(&self) -> Option<&Matrix> {
        self.pre_activation.as_ref()
    }

    /// `a` from the latest forward pass, if any.
    pub fn output(&self) -> Option<&Matrix> {
        self.output.as_ref()
    }

    /// Accepts a single column or a batch with one sample per column.
    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        let z = self.weights.multiply(input)?.add_column_broadcast(&self.biases)?;
        let a = self.activation.apply(&z);
        self.pre_activation = Some(z);
        self.output = Some(a.clone());
        Ok(a)
    }

    /// `W <- W - (lr * dW + l2 * W)`, `b <- b - lr * db`.
    pub fn update(&mut self, grads: &LayerGradients, learning_rate: f64, l2_lambda: f64) -> Result<()> {
        if grads.weights.shape() != self.weights.shape() {
            return Err(NnError::shape("update", self.weights.shape(), grads.weights.shape()));
        }
        if grads.biases.shape() != self.biases.shape() {
            return Err(NnError::shape("update", self.biases.shape(), grads.biases.shape()));
        }

        let step = grads.weights.scalar_multiply(learning_rate)
            .add(&self.weights.scalar_multiply(l2_lambda))?;
        self.weights = self.weights.subtract(&step)?;
        self.biases = self.biases.subtract(&grads.biases.scalar_multiply(learning_rate))?;
        Ok(())
    }

    /// Replaces both parameters, e.g. when restoring a saved model.
    /// Shapes must match the current ones.
    pub(crate) fn set_parameters(&mut self, weights: Matrix, biases: Matrix) -> Result<()> {
        if weights.shape() != self.weights.shape() || biases.shape() != self.biases.shape() {
            return Err(NnError::Format(format!(
                "layer expects weights {:?} and biases {:?}, got {:?} and {:?}",
                self.weights.shape(), self.biases.shape(), weights.shape(), biases.shape()
            )));
        }
        self.weights = weights;
        self.biases = biases;
        self.pre_activation = None;
        self.output = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn layer(inputs: usize, outputs: usize) -> Layer {
        Layer::new(inputs, outputs, Activation::Sigmoid, &mut StdRng::seed_from_u64(11))
    }

    #[test]
    fn init_uses_fan_in_bound_and_constant_bias() {
        let l = layer(16, 4);
        assert_eq!(l.weights().shape(), (4, 16));
        assert_eq!(l.biases().shape(), (4, 1));
        assert!(l.weights().as_slice().iter().all(|w| w.abs() <= 0.25));
        assert!(l.biases().as_slice().iter().all(|&b| b == INITIAL_BIAS));
        assert!(l.pre_activation().is_none());
    }

    #[test]
    fn forward_caches_z_and_a() {
        let mut l = layer(3, 2);
        let x = Matrix::column(vec![0.5, -1.0, 2.0]);
        let a = l.forward(&x).unwrap();
        let z = l.weights().multiply(&x).unwrap().add(l.biases()).unwrap();
        assert_eq!(l.pre_activation().unwrap(), &z);
        assert_eq!(l.output().unwrap(), &a);
        assert_relative_eq!(a.get(0, 0).unwrap(), Activation::Sigmoid.function(z.get(0, 0).unwrap()));
    }

    #[test]
    fn forward_handles_batch_columns() {
        let mut l = layer(2, 3);
        let x0 = Matrix::column(vec![1.0, 0.0]);
        let x1 = Matrix::column(vec![0.0, 1.0]);
        let batch = l.forward(&Matrix::from_columns(&[x0.clone(), x1.clone()]).unwrap()).unwrap();
        assert_eq!(batch.shape(), (3, 2));
        assert_eq!(batch.col(0).unwrap(), l.clone().forward(&x0).unwrap());
        assert_eq!(batch.col(1).unwrap(), l.clone().forward(&x1).unwrap());
    }

    #[test]
    fn forward_rejects_wrong_input_height() {
        let mut l = layer(3, 2);
        let err = l.forward(&Matrix::column(vec![1.0, 2.0])).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch { .. }));
    }

    #[test]
    fn update_applies_sgd_with_weight_decay() {
        let mut l = layer(2, 1);
        let w0 = l.weights().clone();
        let grads = LayerGradients {
            weights: Matrix::new(1, 2, 1.0),
            biases: Matrix::new(1, 1, 2.0),
        };
        l.update(&grads, 0.5, 0.1).unwrap();
        for (w, w_old) in l.weights().as_slice().iter().zip(w0.as_slice()) {
            assert_relative_eq!(*w, w_old - (0.5 + 0.1 * w_old), epsilon = 1e-12);
        }
        assert_relative_eq!(l.biases().get(0, 0).unwrap(), INITIAL_BIAS - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn update_rejects_mismatched_gradients() {
        let mut l = layer(2, 1);
        let grads = LayerGradients {
            weights: Matrix::zeros(2, 1),
            biases: Matrix::zeros(1, 1),
        };
        assert!(l.update(&grads, 0.1, 0.0).is_err());
    }
}
