use serde::{Serialize, Deserialize};

use crate::math::tensor::Tensor;

/// Non-overlapping max pooling with a square `size × size` window.
///
/// Input height and width must be multiples of `size`; the network spec
/// enforces this before any layer is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxPool2d {
    pub size: usize,
}

impl MaxPool2d {
    pub fn new(size: usize) -> MaxPool2d {
        MaxPool2d { size }
    }

    /// Flat input index of the maximum inside the window of output cell
    /// `(c, oy, ox)`. Ties resolve to the first position in scan order.
    fn argmax(&self, input: &Tensor, c: usize, oy: usize, ox: usize) -> usize {
        let base = c * input.plane_len();
        let mut best = base + (oy * self.size) * input.width + ox * self.size;
        for dy in 0..self.size {
            for dx in 0..self.size {
                let idx = base + (oy * self.size + dy) * input.width + ox * self.size + dx;
                if input.data[idx] > input.data[best] {
                    best = idx;
                }
            }
        }
        best
    }

    pub fn forward(&self, input: &Tensor) -> Tensor {
        let (c, h, w) = (input.channels, input.height / self.size, input.width / self.size);
        let mut out = Tensor::zeros(c, h, w);
        for ch in 0..c {
            for oy in 0..h {
                for ox in 0..w {
                    out.data[(ch * h + oy) * w + ox] = input.data[self.argmax(input, ch, oy, ox)];
                }
            }
        }
        out
    }

    /// Routes each output delta back to the input position that won the max.
    pub fn backward(&self, input: &Tensor, delta: &Tensor) -> Tensor {
        let mut input_delta = Tensor::zeros(input.channels, input.height, input.width);
        let (h, w) = (delta.height, delta.width);
        for ch in 0..delta.channels {
            for oy in 0..h {
                for ox in 0..w {
                    let idx = self.argmax(input, ch, oy, ox);
                    input_delta.data[idx] += delta.data[(ch * h + oy) * w + ox];
                }
            }
        }
        input_delta
    }
}
