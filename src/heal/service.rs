use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, GrayImage};

use crate::error::{HealError, Result};
use crate::heal::confidence::contrast_confidence;
use crate::imaging::{denormalize, normalize, resize_bilinear, to_grayscale};
use crate::network::network::Network;

/// Output of one healing pass: an `R × R` grayscale image and its contrast
/// confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct HealingResult {
    pub healed: GrayImage,
    pub confidence: f64,
}

/// Runs damaged images through the restoration model.
///
/// Holds the weights behind an `Arc` and never mutates them, so one service
/// can be cloned into or shared between any number of threads.
#[derive(Debug, Clone)]
pub struct HealingService {
    model: Option<Arc<Network>>,
    size: usize,
}

impl HealingService {
    pub fn new(network: Network) -> Self {
        let size = network.input_size();
        HealingService { model: Some(Arc::new(network)), size }
    }

    /// A service without weights; every `heal` returns `ModelUnavailable`.
    pub fn unavailable(size: usize) -> Self {
        HealingService { model: None, size }
    }

    /// Loads the weights artifact at `path`.
    ///
    /// A missing or unreadable artifact is logged and yields an unavailable
    /// service of size `fallback_size`.
    pub fn load<P: AsRef<Path>>(path: P, fallback_size: usize) -> Self {
        let path = path.as_ref();
        match Network::load_json(path) {
            Ok(network) => {
                log::info!(
                    "loaded healing model from {} ({}x{}, {} parameters)",
                    path.display(), network.input_size(), network.input_size(), network.param_count()
                );
                HealingService::new(network)
            }
            Err(e) => {
                log::error!("could not load healing model from {}: {}", path.display(), e);
                HealingService::unavailable(fallback_size)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    /// Side length R of the images this service produces.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Heals an image of any size and color layout.
    pub fn heal(&self, image: &DynamicImage) -> Result<HealingResult> {
        let model = self.model.as_ref().ok_or(HealError::ModelUnavailable)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(HealError::InputShape(format!(
                "image is {}x{}", image.width(), image.height()
            )));
        }
        self.heal_with(model, &to_grayscale(image))
    }

    /// Like `heal`, for an image that is already grayscale.
    pub fn heal_gray(&self, image: &GrayImage) -> Result<HealingResult> {
        let model = self.model.as_ref().ok_or(HealError::ModelUnavailable)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(HealError::InputShape(format!(
                "image is {}x{}", image.width(), image.height()
            )));
        }
        self.heal_with(model, image)
    }

    fn heal_with(&self, model: &Network, gray: &GrayImage) -> Result<HealingResult> {
        let side = self.size as u32;
        let resized = if gray.dimensions() == (side, side) {
            gray.clone()
        } else {
            resize_bilinear(gray, side, side)
        };
        let output = model.predict(&normalize(&resized))?;
        let healed = denormalize(&output)?;
        let confidence = contrast_confidence(&healed);
        Ok(HealingResult { healed, confidence })
    }
}
