pub mod conv2d;
pub mod layer;
pub mod pool;
pub mod upsample;

pub use conv2d::Conv2d;
pub use layer::Layer;
pub use pool::MaxPool2d;
pub use upsample::UpSample2d;

/// Parameter gradients of one convolution layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

impl Gradients {
    pub fn zeros_like(conv: &Conv2d) -> Gradients {
        Gradients {
            weights: vec![0.0; conv.weights.len()],
            biases: vec![0.0; conv.biases.len()],
        }
    }

    /// `self += other`, element-wise.
    pub fn accumulate(&mut self, other: &Gradients) {
        for (a, b) in self.weights.iter_mut().zip(other.weights.iter()) {
            *a += b;
        }
        for (a, b) in self.biases.iter_mut().zip(other.biases.iter()) {
            *a += b;
        }
    }

    pub fn scale(&mut self, factor: f64) {
        self.weights.iter_mut().for_each(|w| *w *= factor);
        self.biases.iter_mut().for_each(|b| *b *= factor);
    }
}
