use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    activation::activation::Activation,
    error::{NnError, Result},
    layers::dense::Layer,
    loss::{mse::MseLoss, one_hot::OneHotEncoder},
    math::matrix::Matrix,
    network::gradients::{Gradients, LayerGradients},
    train::{epoch_stats::EpochStats, loop_fn::train_loop, train_config::TrainConfig},
};

/// Samples per forward call when scoring a whole dataset.
const EVAL_CHUNK: usize = 256;

/// A stack of dense layers sharing one activation function.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    activation: Activation,
    /// Stacked input of the latest `forward`, paired with the layer caches.
    batch_input: Option<Matrix>,
}

impl Network {
    /// Builds one layer per consecutive pair of `widths`, so `[784, 30, 10]`
    /// yields a 784→30 layer followed by a 30→10 layer.
    pub fn new<R: Rng + ?Sized>(widths: &[usize], activation: Activation, rng: &mut R) -> Result<Network> {
        if widths.len() < 2 {
            return Err(NnError::InvalidArchitecture(format!(
                "need at least an input and an output width, got {:?}",
                widths
            )));
        }
        if widths.iter().any(|&w| w == 0) {
            return Err(NnError::InvalidArchitecture(format!(
                "layer widths must be non-zero, got {:?}",
                widths
            )));
        }

        let layers = widths.windows(2)
            .map(|pair| Layer::new(pair[0], pair[1], activation, &mut *rng))
            .collect();
        debug!("built network {:?} with {:?} activation", widths, activation);
        Ok(Network { layers, activation, batch_input: None })
    }

    /// Same as `new` with a generator seeded from `seed`.
    pub fn seeded(widths: &[usize], activation: Activation, seed: u64) -> Result<Network> {
        Network::new(widths, activation, &mut StdRng::seed_from_u64(seed))
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn input_width(&self) -> usize {
        self.layers[0].inputs()
    }

    pub fn output_width(&self) -> usize {
        self.layers[self.layers.len() - 1].outputs()
    }

    /// `[n0, n1, ..., nL]`, the widths this network was built from.
    pub fn widths(&self) -> Vec<usize> {
        std::iter::once(self.input_width())
            .chain(self.layers.iter().map(|l| l.outputs()))
            .collect()
    }

    /// Flattens each sample to a column and stacks them into one batch.
    fn stack_inputs(&self, samples: &[Matrix]) -> Result<Matrix> {
        let columns = samples.iter()
            .map(|sample| {
                let column = sample.flatten();
                if column.rows() != self.input_width() {
                    return Err(NnError::shape("forward", (self.input_width(), 1), sample.shape()));
                }
                Ok(column)
            })
            .collect::<Result<Vec<_>>>()?;
        Matrix::from_columns(&columns)
    }

    /// Runs every sample through the network and returns one output column
    /// per sample, in input order. Leaves `z`/`a` of this batch cached in
    /// each layer for a following `backward`.
    pub fn forward(&mut self, samples: &[Matrix]) -> Result<Vec<Matrix>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        self.batch_input = None;
        let input = self.stack_inputs(samples)?;
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current)?;
        }
        self.batch_input = Some(input);

        (0..current.cols()).map(|j| current.col(j)).collect()
    }

    /// Backpropagation over the batch from the immediately preceding
    /// `forward(samples)`. Returned gradients are summed over the batch.
    ///
    /// `samples` and `predicted` must be exactly the batch and outputs of
    /// that forward call; anything else is `NoForwardPass`.
    pub fn backward(&self, samples: &[Matrix], predicted: &[Matrix], targets: &[Matrix]) -> Result<Gradients> {
        let batch_len = samples.len();
        if batch_len == 0 {
            return Err(NnError::InvalidConfig("backward needs at least one sample".into()));
        }
        if predicted.len() != batch_len || targets.len() != batch_len {
            return Err(NnError::shape("backward", (batch_len, 1), (predicted.len(), targets.len())));
        }

        let input = self.stack_inputs(samples)?;
        let output = Matrix::from_columns(predicted)?;
        let target = Matrix::from_columns(targets)?;

        let last = self.layers.len() - 1;
        let cached_input = self.batch_input.as_ref().ok_or(NnError::NoForwardPass)?;
        if cached_input.cols() != batch_len {
            return Err(NnError::shape("backward", cached_input.shape(), input.shape()));
        }
        let cached_output = self.layers[last].output().ok_or(NnError::NoForwardPass)?;
        if !same_bits(cached_input, &input) || !same_bits(cached_output, &output) {
            return Err(NnError::NoForwardPass);
        }
        let error = MseLoss::derivative(&output, &target)?;
        let last_z = self.cached_pre_activation(last, batch_len)?;
        let mut delta = error.hadamard(&self.activation.derivative(last_z))?;

        let mut grads = Vec::with_capacity(self.layers.len());
        for i in (0..self.layers.len()).rev() {
            let prev_activation = if i == 0 {
                &input
            } else {
                self.layers[i - 1].output().ok_or(NnError::NoForwardPass)?
            };

            grads.push(LayerGradients {
                weights: delta.multiply(&prev_activation.transpose())?,
                biases: delta.sum_columns(),
            });

            if i > 0 {
                let propagated = self.layers[i].weights().transpose().multiply(&delta)?;
                let prev_z = self.cached_pre_activation(i - 1, batch_len)?;
                delta = propagated.hadamard(&self.activation.derivative(prev_z))?;
            }
        }
        grads.reverse();

        Ok(Gradients { layers: grads, batch_len })
    }

    /// `z` of layer `index`, checked to come from a batch of `batch_len`.
    fn cached_pre_activation(&self, index: usize, batch_len: usize) -> Result<&Matrix> {
        let z = self.layers[index].pre_activation().ok_or(NnError::NoForwardPass)?;
        if z.cols() != batch_len {
            return Err(NnError::shape("backward", z.shape(), (z.rows(), batch_len)));
        }
        Ok(z)
    }

    /// Mini-batch SGD with a generator seeded once for the whole run from
    /// `config.seed`, or from OS entropy when no seed is given.
    pub fn train(&mut self, inputs: &[Matrix], labels: &[usize], config: &TrainConfig) -> Result<Vec<EpochStats>> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.train_with_rng(inputs, labels, config, &mut rng)
    }

    /// Mini-batch SGD using a caller-supplied shuffle generator.
    pub fn train_with_rng<R: Rng + ?Sized>(
        &mut self,
        inputs: &[Matrix],
        labels: &[usize],
        config: &TrainConfig,
        rng: &mut R,
    ) -> Result<Vec<EpochStats>> {
        train_loop(self, inputs, labels, config, rng)
    }

    /// Percentage of samples whose output argmax equals the label.
    pub fn evaluate(&mut self, inputs: &[Matrix], labels: &[usize]) -> Result<f64> {
        check_dataset(inputs, labels)?;

        let mut correct = 0usize;
        for (chunk, chunk_labels) in inputs.chunks(EVAL_CHUNK).zip(labels.chunks(EVAL_CHUNK)) {
            let outputs = self.forward(chunk)?;
            correct += outputs.iter()
                .zip(chunk_labels)
                .filter(|(output, label)| output.argmax() == Some(**label))
                .count();
        }

        Ok(100.0 * correct as f64 / inputs.len() as f64)
    }

    /// Mean per-sample MSE over a labelled set, without touching parameters.
    pub fn loss(&mut self, inputs: &[Matrix], labels: &[usize]) -> Result<f64> {
        check_dataset(inputs, labels)?;

        let encoder = OneHotEncoder::for_network(self);
        let mut total = 0.0;
        for (chunk, chunk_labels) in inputs.chunks(EVAL_CHUNK).zip(labels.chunks(EVAL_CHUNK)) {
            let outputs = self.forward(chunk)?;
            for (output, &label) in outputs.iter().zip(chunk_labels) {
                total += MseLoss::loss(output, &encoder.encode(label)?)?;
            }
        }

        Ok(total / inputs.len() as f64)
    }

    /// Class index predicted for a single sample.
    pub fn predict(&mut self, sample: &Matrix) -> Result<usize> {
        let outputs = self.forward(std::slice::from_ref(sample))?;
        outputs[0].argmax().ok_or_else(|| NnError::InvalidArchitecture("network has no outputs".into()))
    }
}

/// Bitwise equality, so NaN entries still compare equal to themselves.
fn same_bits(a: &Matrix, b: &Matrix) -> bool {
    a.shape() == b.shape()
        && a.as_slice().iter().zip(b.as_slice()).all(|(x, y)| x.to_bits() == y.to_bits())
}

pub(crate) fn check_dataset(inputs: &[Matrix], labels: &[usize]) -> Result<()> {
    if inputs.is_empty() {
        return Err(NnError::InvalidConfig("dataset is empty".into()));
    }
    if inputs.len() != labels.len() {
        return Err(NnError::InvalidConfig(format!(
            "{} inputs but {} labels",
            inputs.len(),
            labels.len()
        )));
    }
    Ok(())
}
