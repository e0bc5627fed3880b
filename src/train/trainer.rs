use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::data::sample::SamplePair;
use crate::data::store::SampleStore;
use crate::error::{HealError, Result};
use crate::network::metadata::ModelMetadata;
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::optim::Adam;
use crate::train::epoch_stats::EpochStats;
use crate::train::loop_fn::train_loop;
use crate::train::split::train_val_split;
use crate::train::train_config::TrainConfig;

/// A fitted network together with the per-epoch history that produced it.
#[derive(Debug)]
pub struct TrainOutcome {
    pub network: Network,
    pub history: Vec<EpochStats>,
}

/// Fits a fresh QR autoencoder on `pairs`.
///
/// Every pair must be `image_size × image_size` on both sides, otherwise the
/// run fails with `DataIntegrity` before any weights are touched.
pub fn train(pairs: &[SamplePair], config: &TrainConfig) -> Result<TrainOutcome> {
    if pairs.is_empty() {
        return Err(HealError::DataIntegrity("no sample pairs to train on".into()));
    }
    let size = config.image_size as u32;
    if let Some(bad) = pairs.iter().find(|p| {
        p.clean.dimensions() != (size, size) || p.damaged.dimensions() != (size, size)
    }) {
        return Err(HealError::DataIntegrity(format!(
            "{}: expected {}x{}, found clean {:?} damaged {:?}",
            bad.name, size, size, bad.clean.dimensions(), bad.damaged.dimensions()
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut network = Network::from_spec_with_rng(&NetworkSpec::qr_autoencoder(config.image_size), &mut rng)?;

    let (train_idx, val_idx) = train_val_split(pairs.len(), config.val_fraction, config.seed);
    let train_set: Vec<&SamplePair> = train_idx.iter().map(|&i| &pairs[i]).collect();
    let val_set: Vec<&SamplePair> = val_idx.iter().map(|&i| &pairs[i]).collect();

    log::info!(
        "training on {} pairs, validating on {} ({} parameters)",
        train_set.len(), val_set.len(), network.param_count()
    );

    let mut optimizer = Adam::new(config.learning_rate);
    let history = train_loop(&mut network, &train_set, &val_set, &mut optimizer, config)?;

    let last = history.last();
    network.metadata = Some(ModelMetadata {
        description: Some("QR code healing autoencoder".into()),
        image_size: Some(config.image_size),
        damage_fraction: config.damage_fraction,
        epochs_trained: Some(history.len()),
        final_train_loss: last.map(|s| s.train_loss),
        final_val_loss: last.and_then(|s| s.val_loss),
    });

    Ok(TrainOutcome { network, history })
}

/// Loads every pair from `store`, trains, and writes the weights artifact.
///
/// Nothing is written to `weights_path` unless training completes.
pub fn train_from_store(store: &SampleStore, config: &TrainConfig, weights_path: &Path) -> Result<TrainOutcome> {
    let pairs = store.load_pairs(Some(config.image_size as u32))?;
    log::info!("loaded {} pairs from {}", pairs.len(), store.root().display());

    let outcome = train(&pairs, config)?;
    outcome.network.save_json(weights_path)?;
    log::info!("model saved to {}", weights_path.display());
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::loss_type::LossType;
    use image::{GrayImage, Luma};

    fn pair(i: usize, size: u32) -> SamplePair {
        let clean = GrayImage::from_fn(size, size, |x, _| Luma([if x % 2 == 0 { 0 } else { 255 }]));
        let damaged = GrayImage::from_fn(size, size, |x, y| {
            Luma([if (x + y) as usize % 5 == i % 5 { 128 } else if x % 2 == 0 { 0 } else { 255 }])
        });
        SamplePair { name: SamplePair::file_name(i), clean, damaged }
    }

    fn config() -> TrainConfig {
        TrainConfig { image_size: 8, damage_fraction: Some(0.25), ..TrainConfig::new(2, 4, LossType::default()) }
    }

    #[test]
    fn metadata_records_the_run() {
        let pairs: Vec<SamplePair> = (0..5).map(|i| pair(i, 8)).collect();
        let outcome = train(&pairs, &config()).unwrap();
        let meta = outcome.network.metadata.unwrap();
        assert_eq!(meta.image_size, Some(8));
        assert_eq!(meta.damage_fraction, Some(0.25));
        assert_eq!(meta.epochs_trained, Some(2));
        assert_eq!(meta.final_train_loss, Some(outcome.history[1].train_loss));
        assert!(meta.final_val_loss.is_some());
    }

    #[test]
    fn outcome_is_debug_printable() {
        let pairs: Vec<SamplePair> = (0..3).map(|i| pair(i, 8)).collect();
        let outcome = train(&pairs, &TrainConfig { epochs: 1, ..config() }).unwrap();
        let printed = format!("{:?}", outcome);
        assert!(printed.starts_with("TrainOutcome"));
        assert!(printed.contains("history"));
    }

    #[test]
    fn wrong_sized_pairs_are_rejected() {
        let pairs = vec![pair(0, 8), pair(1, 16)];
        assert!(matches!(train(&pairs, &config()), Err(HealError::DataIntegrity(_))));
    }

    #[test]
    fn integrity_failure_writes_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::new(dir.path().join("data"));
        store.create().unwrap();
        let weights = dir.path().join("model.json");

        let result = train_from_store(&store, &config(), &weights);
        assert!(matches!(result, Err(HealError::DataIntegrity(_))));
        assert!(!weights.exists());
    }

    #[test]
    fn store_round_trip_writes_loadable_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::new(dir.path().join("data"));
        store.create().unwrap();
        for i in 0..3 {
            store.write_pair(&pair(i, 8)).unwrap();
        }
        let weights = dir.path().join("model.json");
        let outcome = train_from_store(&store, &config(), &weights).unwrap();

        let loaded = Network::load_json(&weights).unwrap();
        assert_eq!(loaded.layers, outcome.network.layers);
        assert_eq!(loaded.metadata, outcome.network.metadata);
    }
}
