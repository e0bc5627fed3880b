use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use qr_healer::codec::{DecodeAdapter, QrEncoder};
use qr_healer::data::{SampleGenerator, SampleStore};
use qr_healer::heal::HealingService;
use qr_healer::train::{train_from_store, TrainConfig};
use qr_healer::{evaluate_pairs, HealError, LossType};

fn small_config(size: usize) -> TrainConfig {
    TrainConfig {
        image_size: size,
        damage_fraction: Some(0.25),
        ..TrainConfig::new(1, 4, LossType::BinaryCrossEntropy)
    }
}

#[test]
fn generate_train_and_heal_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store = SampleStore::new(dir.path().join("qrcodes"));
    let mut generator = SampleGenerator::with_rng(QrEncoder::default(), 16, 0.25, StdRng::seed_from_u64(3));
    let report = generator.generate_into(&store, 6).unwrap();
    assert_eq!(report.written, 6);
    assert!(store.clean_dir().join("qr_0.png").exists());
    assert!(store.damaged_dir().join("qr_5.png").exists());

    let weights = dir.path().join("model.json");
    let outcome = train_from_store(&store, &small_config(16), &weights).unwrap();
    assert_eq!(outcome.history.len(), 1);
    assert!(weights.exists());

    let healer = HealingService::load(&weights, 128);
    assert!(healer.is_ready());
    assert_eq!(healer.size(), 16);

    let pairs = store.load_pairs(Some(16)).unwrap();
    let report = evaluate_pairs(&healer, &DecodeAdapter::platform_default(), &pairs).unwrap();
    assert_eq!(report.total, 6);
}

#[test]
fn mismatched_store_aborts_without_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let store = SampleStore::new(dir.path());
    let mut generator = SampleGenerator::new(QrEncoder::default(), 16, 0.25);
    generator.generate_into(&store, 2).unwrap();
    std::fs::remove_file(store.damaged_dir().join("qr_1.png")).unwrap();

    let weights = dir.path().join("model.json");
    let err = train_from_store(&store, &small_config(16), &weights).unwrap_err();
    assert!(matches!(err, HealError::DataIntegrity(_)));
    assert!(!weights.exists());
}

#[test]
fn wrong_sample_size_aborts_without_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let store = SampleStore::new(dir.path());
    SampleGenerator::new(QrEncoder::default(), 32, 0.25).generate_into(&store, 2).unwrap();

    let weights = dir.path().join("model.json");
    let err = train_from_store(&store, &small_config(16), &weights).unwrap_err();
    assert!(matches!(err, HealError::DataIntegrity(_)));
    assert!(!weights.exists());
}

/// Healing must beat direct decoding of damaged codes. Needs a trained
/// 128×128 artifact: `QR_HEALER_MODEL=qr_healer_model.json cargo test -- --ignored`.
#[test]
#[ignore]
fn trained_model_improves_decode_rate() {
    let Ok(model_path) = std::env::var("QR_HEALER_MODEL") else {
        eprintln!("QR_HEALER_MODEL not set; skipping");
        return;
    };
    let healer = HealingService::load(PathBuf::from(model_path), 128);
    assert!(healer.is_ready(), "model failed to load");

    let mut generator = SampleGenerator::with_rng(QrEncoder::default(), 128, 0.25, StdRng::seed_from_u64(42));
    let pairs = generator.generate(120);
    assert!(pairs.len() >= 100);

    let report = evaluate_pairs(&healer, &DecodeAdapter::platform_default(), &pairs).unwrap();
    assert!(
        report.healed_decoded > report.damaged_decoded,
        "healed {} vs damaged {} of {}",
        report.healed_decoded, report.damaged_decoded, report.total
    );
}
