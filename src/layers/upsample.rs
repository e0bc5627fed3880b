use serde::{Serialize, Deserialize};

use crate::math::tensor::Tensor;

/// Nearest-neighbour upsampling by an integer factor on both axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpSample2d {
    pub factor: usize,
}

impl UpSample2d {
    pub fn new(factor: usize) -> UpSample2d {
        UpSample2d { factor }
    }

    pub fn forward(&self, input: &Tensor) -> Tensor {
        let f = self.factor;
        let (c, h, w) = (input.channels, input.height * f, input.width * f);
        let mut out = Tensor::zeros(c, h, w);
        for ch in 0..c {
            for y in 0..h {
                for x in 0..w {
                    out.data[(ch * h + y) * w + x] = input.get(ch, y / f, x / f);
                }
            }
        }
        out
    }

    /// Each input cell fed `factor²` outputs, so its delta is their sum.
    pub fn backward(&self, delta: &Tensor) -> Tensor {
        let f = self.factor;
        let (c, h, w) = (delta.channels, delta.height / f, delta.width / f);
        let mut input_delta = Tensor::zeros(c, h, w);
        for ch in 0..c {
            for y in 0..delta.height {
                for x in 0..delta.width {
                    input_delta.data[(ch * h + y / f) * w + x / f] += delta.get(ch, y, x);
                }
            }
        }
        input_delta
    }
}
