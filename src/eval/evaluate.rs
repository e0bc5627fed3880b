use image::GrayImage;
use rayon::prelude::*;
use serde::Serialize;

use crate::codec::DecodeAdapter;
use crate::data::sample::SamplePair;
use crate::error::Result;
use crate::heal::service::HealingService;
use crate::imaging::side_by_side;

/// Decode results for the three versions of one stored pair.
#[derive(Debug, Clone)]
pub struct PairEvaluation {
    pub name: String,
    pub clean_decoded: bool,
    pub damaged_decoded: bool,
    pub healed_decoded: bool,
    pub confidence: f64,
    pub healed: GrayImage,
}

/// Aggregate decode success over a set of pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodeReport {
    pub total: usize,
    pub clean_decoded: usize,
    pub damaged_decoded: usize,
    pub healed_decoded: usize,
    pub mean_confidence: f64,
}

impl DecodeReport {
    fn rate(&self, count: usize) -> f64 {
        if self.total == 0 { 0.0 } else { count as f64 / self.total as f64 }
    }

    pub fn damaged_rate(&self) -> f64 {
        self.rate(self.damaged_decoded)
    }

    pub fn healed_rate(&self) -> f64 {
        self.rate(self.healed_decoded)
    }

    /// Healed decode rate minus damaged decode rate.
    pub fn improvement(&self) -> f64 {
        self.healed_rate() - self.damaged_rate()
    }
}

/// Decodes the clean, damaged and healed versions of `pair`.
pub fn evaluate_pair(healer: &HealingService, decoder: &DecodeAdapter, pair: &SamplePair) -> Result<PairEvaluation> {
    let healed = healer.heal_gray(&pair.damaged)?;
    Ok(PairEvaluation {
        name: pair.name.clone(),
        clean_decoded: decoder.decode(&pair.clean).success,
        damaged_decoded: decoder.decode(&pair.damaged).success,
        healed_decoded: decoder.decode(&healed.healed).success,
        confidence: healed.confidence,
        healed: healed.healed,
    })
}

/// Evaluates every pair in parallel and tallies the decode successes.
pub fn evaluate_pairs(healer: &HealingService, decoder: &DecodeAdapter, pairs: &[SamplePair]) -> Result<DecodeReport> {
    let evaluations = pairs
        .par_iter()
        .map(|pair| evaluate_pair(healer, decoder, pair))
        .collect::<Result<Vec<_>>>()?;

    let mut report = DecodeReport { total: evaluations.len(), ..Default::default() };
    for e in &evaluations {
        report.clean_decoded += e.clean_decoded as usize;
        report.damaged_decoded += e.damaged_decoded as usize;
        report.healed_decoded += e.healed_decoded as usize;
        report.mean_confidence += e.confidence;
    }
    if report.total > 0 {
        report.mean_confidence /= report.total as f64;
    }
    log::info!(
        "decoded {}/{} clean, {}/{} damaged, {}/{} healed (mean confidence {:.3})",
        report.clean_decoded, report.total,
        report.damaged_decoded, report.total,
        report.healed_decoded, report.total,
        report.mean_confidence
    );
    Ok(report)
}

/// Clean | damaged | healed, left to right, for visual inspection.
pub fn comparison_strip(pair: &SamplePair, healed: &GrayImage) -> GrayImage {
    side_by_side(&[&pair.clean, &pair.damaged, healed], 8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BarcodeDecoder;
    use crate::error::HealError;
    use crate::network::network::Network;
    use crate::network::spec::NetworkSpec;
    use image::Luma;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Decodes anything whose first pixel is white.
    struct WhiteCorner;

    impl BarcodeDecoder for WhiteCorner {
        fn decode(&self, image: &GrayImage) -> Vec<String> {
            if image.get_pixel(0, 0).0[0] == 255 { vec!["x".into()] } else { vec![] }
        }
    }

    fn pair(i: usize) -> SamplePair {
        SamplePair {
            name: SamplePair::file_name(i),
            clean: GrayImage::from_pixel(8, 8, Luma([255])),
            damaged: GrayImage::from_pixel(8, 8, Luma([0])),
        }
    }

    fn healer() -> HealingService {
        let mut rng = StdRng::seed_from_u64(4);
        HealingService::new(Network::from_spec_with_rng(&NetworkSpec::qr_autoencoder(8), &mut rng).unwrap())
    }

    #[test]
    fn report_counts_each_version() {
        let pairs: Vec<SamplePair> = (0..3).map(pair).collect();
        let report = evaluate_pairs(&healer(), &DecodeAdapter::new(WhiteCorner), &pairs).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.clean_decoded, 3);
        assert_eq!(report.damaged_decoded, 0);
        assert!((0.0..=1.0).contains(&report.mean_confidence));
    }

    #[test]
    fn evaluation_requires_a_model() {
        let err = evaluate_pairs(&HealingService::unavailable(8), &DecodeAdapter::unsupported(), &[pair(0)]);
        assert!(matches!(err, Err(HealError::ModelUnavailable)));
    }

    #[test]
    fn improvement_is_rate_difference() {
        let report = DecodeReport { total: 4, damaged_decoded: 1, healed_decoded: 3, ..Default::default() };
        assert!((report.improvement() - 0.5).abs() < 1e-12);
        assert_eq!(DecodeReport::default().improvement(), 0.0);
    }

    #[test]
    fn strip_places_three_images() {
        let p = pair(0);
        let strip = comparison_strip(&p, &p.clean);
        assert_eq!(strip.dimensions(), (8 * 3 + 8 * 2, 8));
    }
}
