use crate::{layers::Gradients, network::network::Network, optim::Optimizer};

/// Plain stochastic gradient descent.
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, network: &mut Network, grads: &[Option<Gradients>]) {
        let lr = self.learning_rate;
        for (layer, grad) in network.layers.iter_mut().zip(grads.iter()) {
            if let (Some(conv), Some(g)) = (layer.as_conv_mut(), grad) {
                conv.weights.iter_mut().zip(g.weights.iter()).for_each(|(w, d)| *w -= lr * d);
                conv.biases.iter_mut().zip(g.biases.iter()).for_each(|(b, d)| *b -= lr * d);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::spec::NetworkSpec;

    #[test]
    fn step_moves_against_the_gradient() {
        let mut net = Network::from_spec(&NetworkSpec::qr_autoencoder(8)).unwrap();
        let before = net.clone();
        let grads: Vec<Option<Gradients>> = net.layers.iter_mut()
            .map(|l| l.as_conv_mut().map(|c| {
                let mut g = Gradients::zeros_like(c);
                g.biases.iter_mut().for_each(|b| *b = 1.0);
                g
            }))
            .collect();
        Sgd::new(0.5).step(&mut net, &grads);

        for (new, old) in net.layers.iter_mut().zip(before.layers.iter()) {
            let mut old = old.clone();
            if let (Some(n), Some(o)) = (new.as_conv_mut(), old.as_conv_mut()) {
                assert_eq!(n.weights, o.weights);
                assert!(n.biases.iter().zip(o.biases.iter()).all(|(a, b)| (a - (b - 0.5)).abs() < 1e-12));
            }
        }
    }
}
