use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};
use crate::loss::loss_type::LossType;
use crate::train::epoch_stats::EpochStats;

/// Configuration for a training run.
///
/// # Fields
/// - `epochs`          — total number of full passes over the training split
/// - `batch_size`      — pairs per mini-batch; one optimizer step per batch
/// - `loss_type`       — reconstruction loss (`BinaryCrossEntropy` by default)
/// - `learning_rate`   — Adam step size
/// - `image_size`      — side length R every sample must have
/// - `val_fraction`    — share of pairs held out for validation
/// - `seed`            — seeds the split, the weight init and the shuffles
/// - `damage_fraction` — recorded in the artifact metadata only
/// - `progress_tx` — optional channel sender; one `EpochStats` is sent per
///                   completed epoch.  If the receiver is dropped the loop
///                   terminates early.
/// - `stop_flag`   — optional atomic flag; when set to `true` from another
///                   thread the loop terminates after the current epoch.
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub loss_type: LossType,
    pub learning_rate: f64,
    pub image_size: usize,
    pub val_fraction: f64,
    pub seed: u64,
    pub damage_fraction: Option<f64>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a `TrainConfig` with the stock QR settings (R = 128, lr 0.001,
    /// 20 % validation, seed 42), no progress channel and no stop flag.
    pub fn new(epochs: usize, batch_size: usize, loss_type: LossType) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            loss_type,
            learning_rate: 0.001,
            image_size: 128,
            val_fraction: 0.2,
            seed: 42,
            damage_fraction: None,
            progress_tx: None,
            stop_flag: None,
        }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig::new(20, 32, LossType::default())
    }
}
