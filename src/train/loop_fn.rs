use std::sync::atomic::Ordering;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::data::sample::SamplePair;
use crate::error::{HealError, Result};
use crate::imaging::normalize;
use crate::layers::Gradients;
use crate::loss::loss_type::LossType;
use crate::math::tensor::Tensor;
use crate::network::network::Network;
use crate::optim::Optimizer;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` to map damaged images onto their clean originals and
/// returns the statistics of every completed epoch.
///
/// # Arguments
/// - `network`   — modified in place
/// - `train`     — training pairs; inputs are `damaged`, targets `clean`
/// - `val`       — validation pairs; may be empty
/// - `optimizer` — applied once per mini-batch with the batch-mean gradients
/// - `config`    — hyperparameters, optional progress channel, optional stop flag
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
pub fn train_loop(
    network: &mut Network,
    train: &[&SamplePair],
    val: &[&SamplePair],
    optimizer: &mut dyn Optimizer,
    config: &TrainConfig,
) -> Result<Vec<EpochStats>> {
    if train.is_empty() {
        return Err(HealError::DataIntegrity("no training pairs".into()));
    }
    if config.batch_size == 0 {
        return Err(HealError::Config("batch_size must be at least 1".into()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 1..=config.epochs {
        if stop_requested(config) {
            break;
        }

        let t_start = Instant::now();

        let train_loss = run_one_epoch(
            network,
            train,
            optimizer,
            config.batch_size,
            config.loss_type,
            &mut rng,
        );

        let val_loss = if val.is_empty() {
            None
        } else {
            Some(compute_eval_loss(network, val, config.loss_type)?)
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            val_loss,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        match val_loss {
            Some(v) => log::info!(
                "epoch {}/{}: train_loss={:.5} val_loss={:.5} ({} ms)",
                epoch, config.epochs, train_loss, v, stats.elapsed_ms
            ),
            None => log::info!(
                "epoch {}/{}: train_loss={:.5} ({} ms)",
                epoch, config.epochs, train_loss, stats.elapsed_ms
            ),
        }

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
    config.stop_flag.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
}

/// One full pass of mini-batch training. Returns the mean loss over all pairs.
fn run_one_epoch(
    network: &mut Network,
    pairs: &[&SamplePair],
    optimizer: &mut dyn Optimizer,
    batch_size: usize,
    loss_type: LossType,
    rng: &mut StdRng,
) -> f64 {
    let n = pairs.len();
    let mut total_loss = 0.0;

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    for batch in indices.chunks(batch_size) {
        // Per-sample gradients in parallel, summed pairwise.
        let net: &Network = network;
        let summed = batch
            .par_iter()
            .map(|&idx| sample_gradients(net, pairs[idx], loss_type))
            .reduce_with(merge_gradients);

        let Some((batch_loss, mut grads)) = summed else {
            continue;
        };
        total_loss += batch_loss;

        let inv_batch = 1.0 / batch.len() as f64;
        for g in grads.iter_mut().flatten() {
            g.scale(inv_batch);
        }
        optimizer.step(network, &grads);
    }

    total_loss / n as f64
}

/// Loss and parameter gradients for a single (damaged → clean) pair.
fn sample_gradients(
    network: &Network,
    pair: &SamplePair,
    loss_type: LossType,
) -> (f64, Vec<Option<Gradients>>) {
    let input = normalize(&pair.damaged);
    let target = normalize(&pair.clean);

    let trace = network.forward_trace(&input);
    let loss = loss_type.loss(&trace.output.data, &target.data);

    let (c, h, w) = trace.output.shape();
    let delta = Tensor::from_data(c, h, w, loss_type.derivative(&trace.output.data, &target.data));
    (loss, network.backward(&trace, delta))
}

fn merge_gradients(
    (loss_a, mut grads_a): (f64, Vec<Option<Gradients>>),
    (loss_b, grads_b): (f64, Vec<Option<Gradients>>),
) -> (f64, Vec<Option<Gradients>>) {
    for (a, b) in grads_a.iter_mut().zip(grads_b.iter()) {
        if let (Some(a), Some(b)) = (a.as_mut(), b.as_ref()) {
            a.accumulate(b);
        }
    }
    (loss_a + loss_b, grads_a)
}

/// Mean loss over a dataset without gradient bookkeeping (eval mode).
fn compute_eval_loss(network: &Network, pairs: &[&SamplePair], loss_type: LossType) -> Result<f64> {
    let losses = pairs
        .par_iter()
        .map(|pair| -> Result<f64> {
            let output = network.predict(&normalize(&pair.damaged))?;
            Ok(loss_type.loss(&output.data, &normalize(&pair.clean).data))
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(losses.iter().sum::<f64>() / pairs.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::spec::NetworkSpec;
    use crate::optim::Adam;
    use image::{GrayImage, Luma};
    use std::sync::atomic::AtomicBool;
    use std::sync::{mpsc, Arc};

    fn tiny_net() -> Network {
        let mut rng = StdRng::seed_from_u64(1);
        Network::from_spec_with_rng(&NetworkSpec::qr_autoencoder(8), &mut rng).unwrap()
    }

    fn checker_pair(i: usize) -> SamplePair {
        let clean = GrayImage::from_fn(8, 8, |x, y| {
            Luma([if (x / 2 + y / 2) % 2 == 0 { 0 } else { 255 }])
        });
        let mut damaged = clean.clone();
        let p = damaged.get_pixel_mut((i % 8) as u32, (i / 8 % 8) as u32);
        p.0[0] = 255 - p.0[0];
        SamplePair { name: SamplePair::file_name(i), clean, damaged }
    }

    fn config(epochs: usize) -> TrainConfig {
        TrainConfig { image_size: 8, ..TrainConfig::new(epochs, 2, LossType::BinaryCrossEntropy) }
    }

    #[test]
    fn loss_decreases_on_tiny_fixture() {
        let pairs: Vec<SamplePair> = (0..4).map(checker_pair).collect();
        let refs: Vec<&SamplePair> = pairs.iter().collect();
        let mut net = tiny_net();
        let mut adam = Adam::new(0.01);
        let history = train_loop(&mut net, &refs, &refs, &mut adam, &config(8)).unwrap();
        assert_eq!(history.len(), 8);
        let first = history[0].val_loss.unwrap();
        let last = history[7].val_loss.unwrap();
        assert!(last < first, "val loss went from {} to {}", first, last);
        assert_eq!(adam.steps(), 16);
    }

    #[test]
    fn progress_is_sent_per_epoch() {
        let pairs: Vec<SamplePair> = (0..2).map(checker_pair).collect();
        let refs: Vec<&SamplePair> = pairs.iter().collect();
        let (tx, rx) = mpsc::channel();
        let cfg = TrainConfig { progress_tx: Some(tx), ..config(3) };
        train_loop(&mut tiny_net(), &refs, &[], &mut Adam::default(), &cfg).unwrap();
        // The config owns the last sender; the receiver only drains once it is gone.
        drop(cfg);
        let stats: Vec<EpochStats> = rx.iter().collect();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[2].epoch, 3);
        assert!(stats.iter().all(|s| s.val_loss.is_none()));
    }

    #[test]
    fn stop_flag_halts_before_first_epoch() {
        let pairs = vec![checker_pair(0)];
        let refs: Vec<&SamplePair> = pairs.iter().collect();
        let cfg = TrainConfig { stop_flag: Some(Arc::new(AtomicBool::new(true))), ..config(5) };
        let history = train_loop(&mut tiny_net(), &refs, &[], &mut Adam::default(), &cfg).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let err = train_loop(&mut tiny_net(), &[], &[], &mut Adam::default(), &config(1)).unwrap_err();
        assert!(matches!(err, HealError::DataIntegrity(_)));
    }
}
