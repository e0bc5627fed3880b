use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::codec::DecodeAdapter;
use crate::error::{HealError, Result};
use crate::heal::service::HealingService;
use crate::imaging::{load_from_memory, png_data_url, to_grayscale};

pub const MSG_SCANNED: &str = "QR code scanned successfully";
pub const MSG_RECONSTRUCTED: &str = "QR code reconstructed using AI";
pub const ERR_NO_MODEL: &str = "QR code damaged and model not available";
pub const ERR_RECONSTRUCTION: &str = "Reconstruction failed";
pub const ERR_TOO_DAMAGED: &str = "QR code too damaged to reconstruct";

/// Outcome of a scan, serialized as the `/api/scan-qr` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScanResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub reconstructed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// `data:image/png;base64,...` of the healed image, on healed success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healed_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanResult {
    pub fn failure(error: impl Into<String>, reconstructed: bool) -> Self {
        ScanResult { error: Some(error.into()), reconstructed, ..Default::default() }
    }
}

/// Decode first, heal only when the direct decode fails.
#[derive(Debug, Clone)]
pub struct Scanner {
    healer: HealingService,
    decoder: DecodeAdapter,
}

impl Scanner {
    pub fn new(healer: HealingService, decoder: DecodeAdapter) -> Self {
        Scanner { healer, decoder }
    }

    pub fn healer(&self) -> &HealingService {
        &self.healer
    }

    pub fn model_loaded(&self) -> bool {
        self.healer.is_ready()
    }

    /// Runs the full flow on raw image bytes, folding every error into the
    /// returned `ScanResult`.
    pub fn heal_and_decode(&self, raw_image_bytes: &[u8]) -> ScanResult {
        self.scan(raw_image_bytes).unwrap_or_else(|e| {
            log::warn!("scan failed: {}", e);
            ScanResult::failure(e.to_string(), false)
        })
    }

    /// Same flow as `heal_and_decode`, but errors that are not a scan verdict
    /// (unreadable bytes, PNG encoding) are returned as `Err`.
    pub fn scan(&self, raw_image_bytes: &[u8]) -> Result<ScanResult> {
        let image = load_from_memory(raw_image_bytes)?;
        let gray = to_grayscale(&image);

        let direct = self.decoder.decode(&gray);
        if let Some(data) = direct.payload {
            log::debug!("direct decode succeeded");
            return Ok(ScanResult {
                success: true,
                data: Some(data),
                reconstructed: false,
                confidence: Some(1.0),
                message: Some(MSG_SCANNED.into()),
                ..Default::default()
            });
        }

        log::info!("direct scan failed, attempting reconstruction");
        let healed = match self.healer.heal(&image) {
            Ok(h) => h,
            Err(HealError::ModelUnavailable) => return Ok(ScanResult::failure(ERR_NO_MODEL, false)),
            Err(e @ HealError::InputShape(_)) => {
                log::warn!("reconstruction failed: {}", e);
                return Ok(ScanResult::failure(ERR_RECONSTRUCTION, true));
            }
            Err(e) => return Err(e),
        };

        match self.decoder.decode(&healed.healed).payload {
            Some(data) => Ok(ScanResult {
                success: true,
                data: Some(data),
                reconstructed: true,
                confidence: Some(healed.confidence),
                healed_image: Some(png_data_url(&healed.healed)?),
                message: Some(MSG_RECONSTRUCTED.into()),
                ..Default::default()
            }),
            None => {
                let e = HealError::ReconstructionFailed { confidence: healed.confidence };
                log::debug!("{}", e);
                Ok(ScanResult {
                    confidence: Some(healed.confidence),
                    ..ScanResult::failure(ERR_TOO_DAMAGED, true)
                })
            }
        }
    }
}

/// Decodes a base64 image payload, accepting either bare base64 or a
/// `data:<mime>;base64,<payload>` URL.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>> {
    let encoded = match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    };
    Ok(STANDARD.decode(encoded.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BarcodeDecoder;
    use crate::imaging::encode_png;
    use crate::network::network::Network;
    use crate::network::spec::NetworkSpec;
    use image::{GrayImage, Luma};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Decodes only images whose top-left pixel is black.
    struct TopLeftBlack;

    impl BarcodeDecoder for TopLeftBlack {
        fn decode(&self, image: &GrayImage) -> Vec<String> {
            if image.width() > 0 && image.get_pixel(0, 0).0[0] == 0 {
                vec!["payload".into()]
            } else {
                vec![]
            }
        }
    }

    struct Always;

    impl BarcodeDecoder for Always {
        fn decode(&self, _: &GrayImage) -> Vec<String> {
            vec!["healed".into()]
        }
    }

    fn png(value: u8) -> Vec<u8> {
        encode_png(&GrayImage::from_pixel(8, 8, Luma([value]))).unwrap()
    }

    fn model() -> HealingService {
        let mut rng = StdRng::seed_from_u64(2);
        HealingService::new(Network::from_spec_with_rng(&NetworkSpec::qr_autoencoder(8), &mut rng).unwrap())
    }

    #[test]
    fn direct_decode_skips_healing() {
        let scanner = Scanner::new(HealingService::unavailable(8), DecodeAdapter::new(TopLeftBlack));
        let r = scanner.heal_and_decode(&png(0));
        assert!(r.success);
        assert!(!r.reconstructed);
        assert_eq!(r.confidence, Some(1.0));
        assert_eq!(r.data.as_deref(), Some("payload"));
        assert_eq!(r.message.as_deref(), Some(MSG_SCANNED));
    }

    #[test]
    fn no_model_reports_damaged() {
        let scanner = Scanner::new(HealingService::unavailable(8), DecodeAdapter::new(TopLeftBlack));
        let r = scanner.heal_and_decode(&png(255));
        assert!(!r.success);
        assert!(!r.reconstructed);
        assert_eq!(r.error.as_deref(), Some(ERR_NO_MODEL));
    }

    #[test]
    fn failed_heal_reports_too_damaged_with_confidence() {
        let scanner = Scanner::new(model(), DecodeAdapter::unsupported());
        let r = scanner.heal_and_decode(&png(255));
        assert!(!r.success);
        assert!(r.reconstructed);
        assert!(r.confidence.is_some());
        assert_eq!(r.error.as_deref(), Some(ERR_TOO_DAMAGED));
    }

    #[test]
    fn healed_success_carries_image() {
        // First decode of the raw image is the one that must fail.
        struct SecondCall(std::sync::atomic::AtomicUsize);
        impl BarcodeDecoder for SecondCall {
            fn decode(&self, _: &GrayImage) -> Vec<String> {
                if self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                    vec![]
                } else {
                    Always.decode(&GrayImage::new(1, 1))
                }
            }
        }
        let decoder = DecodeAdapter::new(SecondCall(Default::default()));
        let scanner = Scanner::new(model(), decoder);
        let r = scanner.heal_and_decode(&png(128));
        assert!(r.success);
        assert!(r.reconstructed);
        assert_eq!(r.data.as_deref(), Some("healed"));
        assert!(r.healed_image.unwrap().starts_with("data:image/png;base64,"));
        assert_eq!(r.message.as_deref(), Some(MSG_RECONSTRUCTED));
    }

    #[test]
    fn garbage_bytes_are_a_failure() {
        let scanner = Scanner::new(model(), DecodeAdapter::platform_default());
        assert!(scanner.scan(b"not an image").is_err());
        let r = scanner.heal_and_decode(b"not an image");
        assert!(!r.success);
        assert!(!r.reconstructed);
        assert!(r.error.is_some());
    }

    #[test]
    fn payload_accepts_data_urls() {
        let bytes = png(0);
        let bare = STANDARD.encode(&bytes);
        let url = format!("data:image/png;base64,{}", bare);
        assert_eq!(decode_image_payload(&bare).unwrap(), bytes);
        assert_eq!(decode_image_payload(&url).unwrap(), bytes);
        assert!(decode_image_payload("@@@").is_err());
    }

    #[test]
    fn json_omits_absent_fields() {
        let json = serde_json::to_value(ScanResult::failure(ERR_NO_MODEL, false)).unwrap();
        assert_eq!(json, serde_json::json!({
            "success": false,
            "reconstructed": false,
            "error": ERR_NO_MODEL,
        }));
    }
}
