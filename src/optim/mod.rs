pub mod adam;
pub mod sgd;

pub use adam::Adam;
pub use sgd::Sgd;

use crate::layers::Gradients;
use crate::network::network::Network;

/// Applies one parameter update to a network given per-layer gradients
/// (one entry per layer, `None` for layers without parameters).
pub trait Optimizer {
    fn step(&mut self, network: &mut Network, grads: &[Option<Gradients>]);
}
