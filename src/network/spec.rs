use crate::activation::activation::ActivationFunction;
use crate::error::{HealError, Result};
use crate::layers::{Conv2d, Layer, MaxPool2d, UpSample2d};
use crate::network::metadata::ModelMetadata;

/// Describes one layer in a network specification.
///
/// Convolutions always use stride 1 and "same" padding, so `kernel` must be odd.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSpec {
    Conv2d { filters: usize, kernel: usize, activation: ActivationFunction },
    MaxPool { size: usize },
    UpSample { factor: usize },
}

/// Architecture of a restoration network, from which fresh weights are drawn.
#[derive(Debug, Clone)]
pub struct NetworkSpec {
    /// Side length of the square input image.
    pub input_size: usize,
    pub input_channels: usize,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    pub metadata: Option<ModelMetadata>,
}

impl NetworkSpec {
    /// The QR restoration autoencoder:
    ///
    /// ```text
    /// Conv(32) → Pool → Conv(64) → Pool → Conv(64) → Up → Conv(32) → Up → Conv(1, sigmoid)
    /// ```
    ///
    /// All convolutions are 3×3; hidden ones use ReLU.
    pub fn qr_autoencoder(input_size: usize) -> NetworkSpec {
        let conv = |filters, activation| LayerSpec::Conv2d { filters, kernel: 3, activation };
        NetworkSpec {
            input_size,
            input_channels: 1,
            layers: vec![
                conv(32, ActivationFunction::ReLU),
                LayerSpec::MaxPool { size: 2 },
                conv(64, ActivationFunction::ReLU),
                LayerSpec::MaxPool { size: 2 },
                conv(64, ActivationFunction::ReLU),
                LayerSpec::UpSample { factor: 2 },
                conv(32, ActivationFunction::ReLU),
                LayerSpec::UpSample { factor: 2 },
                conv(1, ActivationFunction::Sigmoid),
            ],
            metadata: None,
        }
    }

    /// Checks that every layer accepts the shape produced by the one before it
    /// and that the network maps its input shape back onto itself.
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 || self.input_channels == 0 {
            return Err(HealError::InputShape("input size and channels must be positive".into()));
        }
        let input = (self.input_channels, self.input_size, self.input_size);
        let mut shape = input;
        for spec in &self.layers {
            shape = match *spec {
                LayerSpec::Conv2d { filters, kernel, .. } => {
                    if filters == 0 || kernel % 2 == 0 {
                        return Err(HealError::InputShape(format!(
                            "conv needs at least one filter and an odd kernel, got {} / {}",
                            filters, kernel
                        )));
                    }
                    (filters, shape.1, shape.2)
                }
                LayerSpec::MaxPool { size } => {
                    if size == 0 || shape.1 % size != 0 || shape.2 % size != 0 {
                        return Err(HealError::InputShape(format!(
                            "{}x{} is not divisible by pool size {}", shape.1, shape.2, size
                        )));
                    }
                    (shape.0, shape.1 / size, shape.2 / size)
                }
                LayerSpec::UpSample { factor } => (shape.0, shape.1 * factor, shape.2 * factor),
            };
        }
        if shape != input {
            return Err(HealError::InputShape(format!(
                "network maps {:?} to {:?}; restoration needs matching shapes", input, shape
            )));
        }
        Ok(())
    }

    /// Instantiates concrete layers with freshly initialized weights.
    pub(crate) fn build_layers<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Vec<Layer> {
        let mut channels = self.input_channels;
        self.layers.iter().map(|spec| match *spec {
            LayerSpec::Conv2d { filters, kernel, activation } => {
                let conv = Conv2d::new(channels, filters, kernel, activation, rng);
                channels = filters;
                Layer::Conv2d(conv)
            }
            LayerSpec::MaxPool { size } => Layer::MaxPool(MaxPool2d::new(size)),
            LayerSpec::UpSample { factor } => Layer::UpSample(UpSample2d::new(factor)),
        }).collect()
    }
}
