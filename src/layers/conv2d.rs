use rand::Rng;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, math::tensor::Tensor};
use crate::layers::Gradients;

/// Square 2-D convolution with stride 1 and "same" zero padding, followed by
/// an element-wise activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conv2d {
    pub in_channels: usize,
    pub filters: usize,
    pub kernel: usize,
    /// Layout `[filter][in_channel][ky][kx]`.
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
}

impl Conv2d {
    pub fn new<R: Rng + ?Sized>(
        in_channels: usize,
        filters: usize,
        kernel: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Conv2d {
        let fan_in = in_channels * kernel * kernel;
        let count = filters * fan_in;
        let weights = match activation {
            ActivationFunction::ReLU => Tensor::he_weights(count, fan_in, rng),
            _ => Tensor::xavier_weights(count, fan_in, rng),
        };
        Conv2d {
            in_channels,
            filters,
            kernel,
            weights,
            biases: vec![0.0; filters],
            activator: activation,
        }
    }

    /// Weights of one filter, `in_channels * kernel * kernel` values.
    fn filter_weights(&self, f: usize) -> &[f64] {
        let fan_in = self.fan_in();
        &self.weights[f * fan_in..(f + 1) * fan_in]
    }

    pub fn fan_in(&self) -> usize {
        self.in_channels * self.kernel * self.kernel
    }

    pub fn param_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Offsets `(dy, dx)` of every kernel tap relative to the output pixel,
    /// in `[ky][kx]` order.
    fn taps(&self) -> impl Iterator<Item = (isize, isize)> + '_ {
        let pad = (self.kernel / 2) as isize;
        (0..self.kernel).flat_map(move |ky| {
            (0..self.kernel).map(move |kx| (ky as isize - pad, kx as isize - pad))
        })
    }

    /// Linear part `z = W * x + b`.
    fn pre_activation(&self, input: &Tensor) -> Tensor {
        assert_eq!(input.channels, self.in_channels, "conv input channel mismatch");
        let (h, w) = (input.height, input.width);
        let mut out = Tensor::zeros(self.filters, h, w);

        out.data.par_chunks_mut(h * w).enumerate().for_each(|(f, out_plane)| {
            out_plane.fill(self.biases[f]);
            let fw = self.filter_weights(f);
            let taps_per_channel = self.kernel * self.kernel;
            for c in 0..self.in_channels {
                let in_plane = input.channel(c);
                for (t, (dy, dx)) in self.taps().enumerate() {
                    let wv = fw[c * taps_per_channel + t];
                    shifted_axpy(out_plane, in_plane, h, w, dy, dx, wv);
                }
            }
        });
        out
    }

    /// Pure forward pass used at inference time.
    pub fn forward(&self, input: &Tensor) -> Tensor {
        let act = self.activator;
        self.pre_activation(input).map(|x| act.function(x))
    }

    /// Backpropagates `delta` (∂L/∂a for this layer's output).
    ///
    /// `output` is the activation this layer produced for `input`.
    /// Returns the parameter gradients and ∂L/∂input.
    pub fn backward(&self, input: &Tensor, output: &Tensor, delta: &Tensor) -> (Gradients, Tensor) {
        let (h, w) = (input.height, input.width);
        let plane = h * w;
        let act = self.activator;

        // δ = error ⊙ σ'(z), with σ'(z) read off a = σ(z)
        let dz = delta.hadamard(&output.map(|a| act.derivative_from_output(a)));

        let biases: Vec<f64> = (0..self.filters)
            .map(|f| dz.channel(f).iter().sum())
            .collect();

        let fan_in = self.fan_in();
        let taps_per_channel = self.kernel * self.kernel;
        let mut weights = vec![0.0; self.weights.len()];
        weights.par_chunks_mut(fan_in).enumerate().for_each(|(f, grad)| {
            let dz_plane = dz.channel(f);
            for c in 0..self.in_channels {
                let in_plane = input.channel(c);
                for (t, (dy, dx)) in self.taps().enumerate() {
                    grad[c * taps_per_channel + t] = shifted_dot(dz_plane, in_plane, h, w, dy, dx);
                }
            }
        });

        let mut input_delta = Tensor::zeros(self.in_channels, h, w);
        input_delta.data.par_chunks_mut(plane).enumerate().for_each(|(c, dst)| {
            for f in 0..self.filters {
                let fw = self.filter_weights(f);
                let dz_plane = dz.channel(f);
                for (t, (dy, dx)) in self.taps().enumerate() {
                    let wv = fw[c * taps_per_channel + t];
                    shifted_axpy(dst, dz_plane, h, w, -dy, -dx, wv);
                }
            }
        });

        (Gradients { weights, biases }, input_delta)
    }
}

/// Valid destination range for a shift of `d` along an axis of length `n`.
fn shift_range(n: usize, d: isize) -> std::ops::Range<usize> {
    let start = (-d).max(0) as usize;
    let end = (n as isize - d).clamp(0, n as isize) as usize;
    start..end.max(start)
}

/// `dst[y, x] += scale * src[y + dy, x + dx]` over every in-bounds position.
fn shifted_axpy(dst: &mut [f64], src: &[f64], h: usize, w: usize, dy: isize, dx: isize, scale: f64) {
    let xs = shift_range(w, dx);
    if scale == 0.0 || xs.is_empty() {
        return;
    }
    for y in shift_range(h, dy) {
        let sy = (y as isize + dy) as usize;
        let d_row = &mut dst[y * w + xs.start..y * w + xs.end];
        let s_start = (sy * w) as isize + xs.start as isize + dx;
        let s_row = &src[s_start as usize..s_start as usize + d_row.len()];
        for (d, s) in d_row.iter_mut().zip(s_row.iter()) {
            *d += scale * s;
        }
    }
}

/// `Σ a[y, x] * b[y + dy, x + dx]` over every in-bounds position.
fn shifted_dot(a: &[f64], b: &[f64], h: usize, w: usize, dy: isize, dx: isize) -> f64 {
    let xs = shift_range(w, dx);
    let mut sum = 0.0;
    if xs.is_empty() {
        return sum;
    }
    for y in shift_range(h, dy) {
        let sy = (y as isize + dy) as usize;
        let a_row = &a[y * w + xs.start..y * w + xs.end];
        let b_start = ((sy * w) as isize + xs.start as isize + dx) as usize;
        let b_row = &b[b_start..b_start + a_row.len()];
        sum += a_row.iter().zip(b_row.iter()).map(|(p, q)| p * q).sum::<f64>();
    }
    sum
}
