use serde::{Serialize, Deserialize};

/// Per-epoch training statistics emitted by `train_loop`.
///
/// The loop returns one value per completed epoch and, when a `progress_tx`
/// channel is configured in `TrainConfig`, also sends each value as soon as
/// the epoch finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Sum of per-sample MSE, divided by the sample count when
    /// `TrainConfig::normalize_loss` is set.
    pub train_loss: f64,
    /// Number of parameter updates applied during this epoch.
    pub batches: usize,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
