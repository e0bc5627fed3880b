use serde::{Serialize, Deserialize};
use std::f64::consts::E;

/// Element-wise activation applied after a convolution.
///
/// The restoration network only needs ReLU for its hidden convolutions and
/// Sigmoid for the output plane; `Identity` is kept for gradient checks and
/// for experimenting with linear heads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
        }
    }

    /// Derivative expressed through the activation's own output `a = f(x)`.
    pub fn derivative_from_output(&self, a: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => a * (1.0 - a),
            ActivationFunction::ReLU => if a > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
        }
    }
}
