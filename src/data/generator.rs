use image::GrayImage;
use rand::rngs::ThreadRng;
use rand::Rng;

use crate::codec::BarcodeEncoder;
use crate::data::damage::damage_with_rng;
use crate::data::payload::random_payload;
use crate::data::sample::SamplePair;
use crate::data::store::SampleStore;
use crate::error::Result;
use crate::imaging::resize_area;

/// Counts from one `generate_into` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationReport {
    pub written: usize,
    pub skipped: usize,
}

/// Produces (clean, damaged) training pairs from random payloads.
///
/// Iterating yields one attempt per item, lazily: `Ok(pair)` or the encode
/// error for that attempt. Attempt `i` is named `qr_<i>.png`, so skipped
/// attempts leave gaps in the numbering.
pub struct SampleGenerator<E: BarcodeEncoder, R: Rng = ThreadRng> {
    encoder: E,
    size: u32,
    damage_fraction: f64,
    rng: R,
    next_index: usize,
}

impl<E: BarcodeEncoder> SampleGenerator<E, ThreadRng> {
    pub fn new(encoder: E, size: u32, damage_fraction: f64) -> Self {
        SampleGenerator::with_rng(encoder, size, damage_fraction, rand::thread_rng())
    }
}

impl<E: BarcodeEncoder, R: Rng> SampleGenerator<E, R> {
    pub fn with_rng(encoder: E, size: u32, damage_fraction: f64, rng: R) -> Self {
        SampleGenerator { encoder, size, damage_fraction, rng, next_index: 0 }
    }

    /// Renders `payload` and shrinks it to the sample size (the clean image).
    pub fn render_clean(&self, payload: &str) -> Result<GrayImage> {
        let rendered = self.encoder.encode(payload)?;
        Ok(resize_area(&rendered, self.size, self.size))
    }

    fn attempt(&mut self) -> Result<SamplePair> {
        let index = self.next_index;
        self.next_index += 1;

        let payload = random_payload(&mut self.rng);
        let clean = self.render_clean(&payload)?;
        let damaged = damage_with_rng(&clean, self.damage_fraction, &mut self.rng);
        Ok(SamplePair { name: SamplePair::file_name(index), clean, damaged })
    }

    /// Makes `n` attempts and returns the pairs that succeeded.
    pub fn generate(&mut self, n: usize) -> Vec<SamplePair> {
        self.by_ref()
            .take(n)
            .filter_map(|attempt| match attempt {
                Ok(pair) => Some(pair),
                Err(e) => {
                    log::warn!("skipping sample: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Makes `n` attempts, writing each successful pair to `store`.
    ///
    /// Encode failures skip the sample; storage failures abort the run.
    pub fn generate_into(&mut self, store: &SampleStore, n: usize) -> Result<GenerationReport> {
        store.create()?;
        let mut report = GenerationReport::default();
        for i in 0..n {
            match self.attempt() {
                Ok(pair) => {
                    store.write_pair(&pair)?;
                    report.written += 1;
                }
                Err(e) => {
                    log::warn!("skipping sample {}: {}", i, e);
                    report.skipped += 1;
                }
            }
            if (i + 1) % 100 == 0 {
                log::info!("generated {}/{} samples", i + 1, n);
            }
        }
        Ok(report)
    }
}

impl<E: BarcodeEncoder, R: Rng> Iterator for SampleGenerator<E, R> {
    type Item = Result<SamplePair>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.attempt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::QrEncoder;
    use crate::error::HealError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Fails on every other call.
    struct Flaky(std::sync::atomic::AtomicUsize);

    impl BarcodeEncoder for Flaky {
        fn encode(&self, payload: &str) -> Result<GrayImage> {
            let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n % 2 == 1 {
                Err(HealError::Encode(format!("refusing {}", payload)))
            } else {
                QrEncoder::default().encode(payload)
            }
        }
    }

    #[test]
    fn pairs_have_requested_size_and_names() {
        let mut gen = SampleGenerator::with_rng(QrEncoder::default(), 64, 0.25, StdRng::seed_from_u64(5));
        let pairs = gen.generate(3);
        assert_eq!(pairs.len(), 3);
        for (i, p) in pairs.iter().enumerate() {
            assert_eq!(p.name, format!("qr_{}.png", i));
            assert_eq!(p.clean.dimensions(), (64, 64));
            assert_eq!(p.damaged.dimensions(), (64, 64));
            assert_ne!(p.clean, p.damaged);
        }
    }

    #[test]
    fn zero_damage_pairs_are_identical() {
        let mut gen = SampleGenerator::new(QrEncoder::default(), 32, 0.0);
        let pair = gen.next().unwrap().unwrap();
        assert_eq!(pair.clean, pair.damaged);
    }

    #[test]
    fn encode_failures_are_skipped() {
        let flaky = Flaky(std::sync::atomic::AtomicUsize::new(0));
        let mut gen = SampleGenerator::new(flaky, 32, 0.1);
        let pairs = gen.generate(4);
        let names: Vec<&str> = pairs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["qr_0.png", "qr_2.png"]);
    }

    #[test]
    fn iterator_surfaces_each_failed_attempt() {
        let flaky = Flaky(std::sync::atomic::AtomicUsize::new(0));
        let attempts: Vec<Result<SamplePair>> = SampleGenerator::new(flaky, 32, 0.1).take(3).collect();
        assert_eq!(attempts.len(), 3);
        assert!(attempts[0].is_ok());
        assert!(matches!(attempts[1], Err(HealError::Encode(_))));
        assert_eq!(attempts[2].as_ref().map(|p| p.name.as_str()).ok(), Some("qr_2.png"));
    }

    #[test]
    fn generate_into_writes_parallel_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::new(dir.path());
        let flaky = Flaky(std::sync::atomic::AtomicUsize::new(0));
        let mut gen = SampleGenerator::new(flaky, 32, 0.25);
        let report = gen.generate_into(&store, 5).unwrap();
        assert_eq!(report, GenerationReport { written: 3, skipped: 2 });
        assert_eq!(store.load_pairs(Some(32)).unwrap().len(), 3);
    }
}
