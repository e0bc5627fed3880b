use image::{DynamicImage, GrayImage, Luma};
use rand::rngs::StdRng;
use rand::SeedableRng;

use qr_healer::codec::{BarcodeEncoder, DecodeAdapter, QrEncoder};
use qr_healer::data::{damage_with_rng, random_payload};
use qr_healer::heal::pipeline::ERR_NO_MODEL;
use qr_healer::heal::{HealingService, Scanner};
use qr_healer::imaging::{encode_png, resize_area};
use qr_healer::{HealError, Network, NetworkSpec};

fn clean_qr(payload: &str) -> GrayImage {
    let rendered = QrEncoder::default().encode(payload).unwrap();
    resize_area(&rendered, 128, 128)
}

#[test]
fn undamaged_code_decodes_without_a_model() {
    let mut rng = StdRng::seed_from_u64(21);
    let payload = random_payload(&mut rng);
    let bytes = encode_png(&clean_qr(&payload)).unwrap();

    let scanner = Scanner::new(HealingService::unavailable(128), DecodeAdapter::platform_default());
    let result = scanner.heal_and_decode(&bytes);
    assert!(result.success);
    assert!(!result.reconstructed);
    assert_eq!(result.data.as_deref(), Some(payload.as_str()));
    assert_eq!(result.confidence, Some(1.0));
}

#[test]
fn blank_image_without_model_reports_damage() {
    let bytes = encode_png(&GrayImage::from_pixel(64, 64, Luma([255]))).unwrap();
    let scanner = Scanner::new(HealingService::unavailable(128), DecodeAdapter::platform_default());
    let result = scanner.heal_and_decode(&bytes);
    assert!(!result.success);
    assert!(!result.reconstructed);
    assert_eq!(result.error.as_deref(), Some(ERR_NO_MODEL));

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("data").is_none());
}

#[test]
fn untrained_model_still_produces_a_verdict() {
    let mut rng = StdRng::seed_from_u64(8);
    let net = Network::from_spec_with_rng(&NetworkSpec::qr_autoencoder(32), &mut rng).unwrap();
    let scanner = Scanner::new(HealingService::new(net), DecodeAdapter::platform_default());

    let damaged = damage_with_rng(&clean_qr("abcdefghij0123456789"), 1.0, &mut rng);
    let result = scanner.heal_and_decode(&encode_png(&damaged).unwrap());
    assert!(result.reconstructed);
    let c = result.confidence.unwrap();
    assert!((0.0..=1.0).contains(&c));
}

#[test]
fn heal_output_is_model_sized() {
    let net = Network::qr_autoencoder(16).unwrap();
    let healer = HealingService::new(net);
    let img = DynamicImage::ImageLuma8(clean_qr("payload"));
    let result = healer.heal(&img).unwrap();
    assert_eq!(result.healed.dimensions(), (16, 16));
}

#[test]
fn healing_without_weights_is_deterministic_error() {
    let healer = HealingService::unavailable(128);
    let img = DynamicImage::ImageLuma8(GrayImage::new(10, 10));
    for _ in 0..3 {
        assert!(matches!(healer.heal(&img), Err(HealError::ModelUnavailable)));
    }
}
