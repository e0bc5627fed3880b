use serde::{Serialize, Deserialize};

use crate::error::{HealError, Result};
use crate::layers::{conv2d::Conv2d, pool::MaxPool2d, upsample::UpSample2d, Gradients};
use crate::math::tensor::Tensor;

/// One stage of the restoration network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    Conv2d(Conv2d),
    MaxPool(MaxPool2d),
    UpSample(UpSample2d),
}

impl Layer {
    /// Pure inference pass.
    pub fn forward(&self, input: &Tensor) -> Tensor {
        match self {
            Layer::Conv2d(conv) => conv.forward(input),
            Layer::MaxPool(pool) => pool.forward(input),
            Layer::UpSample(up) => up.forward(input),
        }
    }

    /// Returns parameter gradients (if the layer has parameters) and ∂L/∂input.
    ///
    /// `output` is what `forward` produced for `input`.
    pub fn backward(
        &self,
        input: &Tensor,
        output: &Tensor,
        delta: &Tensor,
    ) -> (Option<Gradients>, Tensor) {
        match self {
            Layer::Conv2d(conv) => {
                let (grads, input_delta) = conv.backward(input, output, delta);
                (Some(grads), input_delta)
            }
            Layer::MaxPool(pool) => (None, pool.backward(input, delta)),
            Layer::UpSample(up) => (None, up.backward(delta)),
        }
    }

    /// Shape produced by this layer for a `(channels, height, width)` input.
    pub fn output_shape(&self, (c, h, w): (usize, usize, usize)) -> Result<(usize, usize, usize)> {
        match self {
            Layer::Conv2d(conv) => {
                if conv.in_channels != c {
                    return Err(HealError::InputShape(format!(
                        "conv expects {} channels, got {}", conv.in_channels, c
                    )));
                }
                Ok((conv.filters, h, w))
            }
            Layer::MaxPool(pool) => {
                if pool.size == 0 || h % pool.size != 0 || w % pool.size != 0 {
                    return Err(HealError::InputShape(format!(
                        "{}x{} is not divisible by pool size {}", h, w, pool.size
                    )));
                }
                Ok((c, h / pool.size, w / pool.size))
            }
            Layer::UpSample(up) => Ok((c, h * up.factor, w * up.factor)),
        }
    }

    pub fn as_conv_mut(&mut self) -> Option<&mut Conv2d> {
        match self {
            Layer::Conv2d(conv) => Some(conv),
            _ => None,
        }
    }

    pub fn param_count(&self) -> usize {
        match self {
            Layer::Conv2d(conv) => conv.param_count(),
            _ => 0,
        }
    }
}
