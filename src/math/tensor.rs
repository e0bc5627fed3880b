use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

/// Dense 3-D tensor stored channel-major: `data[(c * height + y) * width + x]`.
///
/// Every activation flowing through the restoration network is a `Tensor`;
/// a grayscale image entering the model is `1 × R × R`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub data: Vec<f64>,
}

impl Tensor {
    pub fn zeros(channels: usize, height: usize, width: usize) -> Tensor {
        Tensor {
            channels,
            height,
            width,
            data: vec![0.0; channels * height * width],
        }
    }

    /// Wraps an existing buffer. Panics if the length does not match the shape.
    pub fn from_data(channels: usize, height: usize, width: usize, data: Vec<f64>) -> Tensor {
        assert_eq!(
            data.len(),
            channels * height * width,
            "tensor data length does not match shape {}x{}x{}",
            channels, height, width
        );
        Tensor { channels, height, width, data }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.channels, self.height, self.width)
    }

    /// Number of values in one channel plane.
    pub fn plane_len(&self) -> usize {
        self.height * self.width
    }

    pub fn channel(&self, c: usize) -> &[f64] {
        let n = self.plane_len();
        &self.data[c * n..(c + 1) * n]
    }

    pub fn get(&self, c: usize, y: usize, x: usize) -> f64 {
        self.data[(c * self.height + y) * self.width + x]
    }

    pub fn map<F>(&self, functor: F) -> Tensor
    where
        F: Fn(f64) -> f64,
    {
        Tensor {
            channels: self.channels,
            height: self.height,
            width: self.width,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Element-wise (Hadamard) product of two same-shape tensors.
    pub fn hadamard(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.shape(), other.shape(), "Tensors are of incorrect shapes");
        Tensor {
            channels: self.channels,
            height: self.height,
            width: self.width,
            data: self.data.iter().zip(other.data.iter()).map(|(a, b)| a * b).collect(),
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Both uniforms in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// He initialization: `count` samples from N(0, sqrt(2 / fan_in)).
    ///
    /// Used for kernels feeding a ReLU. For a `k × k` convolution over
    /// `c` input channels the fan-in is `c * k * k`.
    pub fn he_weights<R: Rng + ?Sized>(count: usize, fan_in: usize, rng: &mut R) -> Vec<f64> {
        let std_dev = (2.0 / fan_in as f64).sqrt();
        (0..count).map(|_| Tensor::sample_standard_normal(rng) * std_dev).collect()
    }

    /// Xavier (Glorot) initialization: `count` samples from N(0, sqrt(1 / fan_in)).
    ///
    /// Used for kernels feeding a Sigmoid or Identity output.
    pub fn xavier_weights<R: Rng + ?Sized>(count: usize, fan_in: usize, rng: &mut R) -> Vec<f64> {
        let std_dev = (1.0 / fan_in as f64).sqrt();
        (0..count).map(|_| Tensor::sample_standard_normal(rng) * std_dev).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn indexing_is_channel_major() {
        let t = Tensor::from_data(2, 2, 3, (0..12).map(|v| v as f64).collect());
        assert_eq!(t.get(0, 0, 0), 0.0);
        assert_eq!(t.get(0, 1, 2), 5.0);
        assert_eq!(t.get(1, 0, 0), 6.0);
        assert_eq!(t.channel(1), &[6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    #[should_panic]
    fn from_data_rejects_wrong_length() {
        Tensor::from_data(1, 2, 2, vec![0.0; 3]);
    }

    #[test]
    fn he_weights_have_expected_spread() {
        let mut rng = StdRng::seed_from_u64(7);
        let w = Tensor::he_weights(20_000, 8, &mut rng);
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / w.len() as f64;
        assert!(mean.abs() < 0.02);
        assert!((var - 0.25).abs() < 0.02, "variance was {}", var);
    }
}
