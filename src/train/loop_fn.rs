use std::sync::atomic::Ordering;
use std::time::Instant;

use log::{debug, info};
use rand::{seq::SliceRandom, Rng};

use crate::error::Result;
use crate::loss::{mse::MseLoss, one_hot::OneHotEncoder};
use crate::math::matrix::Matrix;
use crate::network::network::{check_dataset, Network};
use crate::optim::sgd::Sgd;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` with mini-batch SGD and returns the statistics of every
/// completed epoch.
///
/// # Arguments
/// - `network` - mutable reference to the network; modified in place
/// - `inputs`  - training samples; each is flattened to the input width
/// - `labels`  - integer class of each sample, same length as `inputs`
/// - `config`  - hyperparameters, optional progress channel, optional stop flag
/// - `rng`     - drives the per-epoch shuffle; owned by the caller for the
///               whole run so the sample order is reproducible
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
///
/// # Errors
/// Invalid configuration, an empty or misaligned dataset, labels outside the
/// output width, and any shape error raised mid-batch all abort the run.
pub fn train_loop<R: Rng + ?Sized>(
    network: &mut Network,
    inputs: &[Matrix],
    labels: &[usize],
    config: &TrainConfig,
    rng: &mut R,
) -> Result<Vec<EpochStats>> {
    config.validate()?;
    check_dataset(inputs, labels)?;

    let encoder = OneHotEncoder::for_network(network);
    let targets = encoder.encode_all(labels)?;
    let optimizer = Sgd::new(config.learning_rate).with_l2(config.l2_lambda);

    debug!(
        "training on {} samples: epochs={}, batch_size={}, lr={}",
        inputs.len(), config.epochs, config.batch_size, config.learning_rate
    );

    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 1..=config.epochs {
        if stop_requested(config) {
            break;
        }

        let t_start = Instant::now();

        let (loss_sum, batches) = run_one_epoch(
            network,
            inputs,
            &targets,
            &optimizer,
            config.batch_size,
            rng,
        )?;

        let train_loss = if config.normalize_loss {
            loss_sum / inputs.len() as f64
        } else {
            loss_sum
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            batches,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        info!(
            "epoch {}/{}: loss = {:.6} ({} ms)",
            epoch, config.epochs, stats.train_loss, stats.elapsed_ms
        );
        history.push(stats.clone());

        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                break;
            }
        }
    }

    Ok(history)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn stop_requested(config: &TrainConfig) -> bool {
    config.stop_flag
        .as_ref()
        .map_or(false, |flag| flag.load(Ordering::Relaxed))
}

/// One shuffled pass over the data. Returns the summed per-sample MSE and
/// the number of mini-batches processed.
fn run_one_epoch<R: Rng + ?Sized>(
    network: &mut Network,
    inputs: &[Matrix],
    targets: &[Matrix],
    optimizer: &Sgd,
    batch_size: usize,
    rng: &mut R,
) -> Result<(f64, usize)> {
    let n = inputs.len();
    let mut total_loss = 0.0;
    let mut batches = 0;

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    for batch in indices.chunks(batch_size) {
        let batch_inputs: Vec<Matrix> = batch.iter().map(|&i| inputs[i].clone()).collect();
        let batch_targets: Vec<Matrix> = batch.iter().map(|&i| targets[i].clone()).collect();

        let outputs = network.forward(&batch_inputs)?;
        for (output, target) in outputs.iter().zip(&batch_targets) {
            total_loss += MseLoss::loss(output, target)?;
        }

        let grads = network.backward(&batch_inputs, &outputs, &batch_targets)?;
        optimizer.step(network, &grads)?;
        batches += 1;
    }

    Ok((total_loss, batches))
}
