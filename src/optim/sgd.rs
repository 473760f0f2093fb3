use crate::{
    error::{NnError, Result},
    network::{gradients::Gradients, network::Network},
};

/// Plain SGD with optional L2 weight decay.
///
/// Gradients arrive summed over a batch; `step` divides the learning rate by
/// `grads.batch_len` so every update moves along the mean gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
    pub l2_lambda: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate, l2_lambda: 0.0 }
    }

    pub fn with_l2(mut self, l2_lambda: f64) -> Sgd {
        self.l2_lambda = l2_lambda;
        self
    }

    /// Applies one update to every layer of `network`.
    pub fn step(&self, network: &mut Network, grads: &Gradients) -> Result<()> {
        if grads.len() != network.layers().len() {
            return Err(NnError::shape("sgd step", (network.layers().len(), 1), (grads.len(), 1)));
        }
        let lr = self.learning_rate / grads.batch_len.max(1) as f64;
        for (layer, layer_grads) in network.layers_mut().iter_mut().zip(grads.iter()) {
            layer.update(layer_grads, lr, self.l2_lambda)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{activation::activation::Activation, math::matrix::Matrix, network::gradients::LayerGradients};
    use approx::assert_relative_eq;

    #[test]
    fn step_uses_mean_of_summed_gradients() {
        let mut net = Network::seeded(&[1, 1], Activation::Sigmoid, 1).unwrap();
        let w0 = net.layers()[0].weights().get(0, 0).unwrap();
        let b0 = net.layers()[0].biases().get(0, 0).unwrap();
        let grads = Gradients {
            layers: vec![LayerGradients {
                weights: Matrix::new(1, 1, 4.0),
                biases: Matrix::new(1, 1, 2.0),
            }],
            batch_len: 4,
        };
        Sgd::new(0.5).step(&mut net, &grads).unwrap();
        assert_relative_eq!(net.layers()[0].weights().get(0, 0).unwrap(), w0 - 0.5, epsilon = 1e-12);
        assert_relative_eq!(net.layers()[0].biases().get(0, 0).unwrap(), b0 - 0.25, epsilon = 1e-12);
    }

    #[test]
    fn step_rejects_gradients_for_another_architecture() {
        let mut net = Network::seeded(&[2, 2, 1], Activation::Sigmoid, 1).unwrap();
        let grads = Gradients { layers: Vec::new(), batch_len: 1 };
        assert!(Sgd::new(0.1).step(&mut net, &grads).is_err());
    }
}
