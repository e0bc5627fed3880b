use crate::{layers::Gradients, network::network::Network, optim::Optimizer};

/// First and second moment estimates for one parameter vector.
#[derive(Debug, Clone)]
struct Moments {
    m: Vec<f64>,
    v: Vec<f64>,
}

impl Moments {
    fn zeros(len: usize) -> Moments {
        Moments { m: vec![0.0; len], v: vec![0.0; len] }
    }
}

/// Adam optimizer (Kingma & Ba) with bias-corrected moment estimates.
///
/// Defaults match the usual Keras settings: lr = 0.001, β1 = 0.9,
/// β2 = 0.999, ε = 1e-7. Moment buffers are allocated lazily on the first
/// step, one pair per parameterised layer.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: u64,
    state: Vec<Option<(Moments, Moments)>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            t: 0,
            state: Vec::new(),
        }
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> u64 {
        self.t
    }

    fn update(&self, params: &mut [f64], grads: &[f64], moments: &mut Moments, lr_t: f64) {
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        for i in 0..params.len() {
            let g = grads[i];
            moments.m[i] = b1 * moments.m[i] + (1.0 - b1) * g;
            moments.v[i] = b2 * moments.v[i] + (1.0 - b2) * g * g;
            params[i] -= lr_t * moments.m[i] / (moments.v[i].sqrt() + eps);
        }
    }
}

impl Default for Adam {
    fn default() -> Self {
        Adam::new(0.001)
    }
}

impl Optimizer for Adam {
    fn step(&mut self, network: &mut Network, grads: &[Option<Gradients>]) {
        if self.state.len() != network.layers.len() {
            self.state = vec![None; network.layers.len()];
        }
        self.t += 1;
        let t = self.t as i32;
        // Bias correction folded into the step size.
        let lr_t = self.learning_rate * (1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t));

        for (i, (layer, grad)) in network.layers.iter_mut().zip(grads.iter()).enumerate() {
            let (Some(conv), Some(g)) = (layer.as_conv_mut(), grad) else {
                continue;
            };
            let mut moments = self.state[i].take().unwrap_or_else(|| {
                (Moments::zeros(conv.weights.len()), Moments::zeros(conv.biases.len()))
            });
            self.update(&mut conv.weights, &g.weights, &mut moments.0, lr_t);
            self.update(&mut conv.biases, &g.biases, &mut moments.1, lr_t);
            self.state[i] = Some(moments);
        }
    }
}
