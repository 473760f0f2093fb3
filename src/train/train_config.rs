use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::train::epoch_stats::EpochStats;

/// Configuration for a training run.
///
/// # Fields
/// - `epochs`         - total number of full passes over the training data
/// - `batch_size`     - samples per mini-batch; use `1` for online SGD
/// - `learning_rate`  - SGD step size applied to the mean batch gradient
/// - `l2_lambda`      - weight decay factor (0 disables it)
/// - `seed`           - seeds the shuffle generator once per run; `None`
///                      draws the seed from OS entropy
/// - `normalize_loss` - report epoch loss divided by the dataset size
///                      instead of the raw sum of per-sample MSE
/// - `progress_tx`    - optional channel sender; one `EpochStats` is sent per
///                      completed epoch.  If the receiver is dropped the loop
///                      terminates early (clean shutdown).
/// - `stop_flag`      - optional atomic flag; when set to `true` from another
///                      thread the loop terminates after the current epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    #[serde(default)]
    pub l2_lambda: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_normalize_loss")]
    pub normalize_loss: bool,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    #[serde(skip)]
    pub stop_flag: Option<Arc<AtomicBool>>,
}

fn default_normalize_loss() -> bool {
    true
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no progress channel and no stop flag.
    pub fn new(epochs: usize, batch_size: usize, learning_rate: f64) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            learning_rate,
            l2_lambda: 0.0,
            seed: None,
            normalize_loss: default_normalize_loss(),
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reads a config from a JSON file; omitted optional fields take their defaults.
    pub fn load_json(path: &str) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: TrainConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(NnError::InvalidConfig("epochs must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(NnError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(NnError::InvalidConfig(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if !self.l2_lambda.is_finite() || self.l2_lambda < 0.0 {
            return Err(NnError::InvalidConfig(format!(
                "l2_lambda must be non-negative, got {}",
                self.l2_lambda
            )));
        }
        Ok(())
    }
}
