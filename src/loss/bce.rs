/// Per-pixel binary cross-entropy, treating each target intensity in [0, 1]
/// as a pseudo-probability.
pub struct BceLoss;

/// Predictions are clipped to [EPS, 1 - EPS] before the log.
const EPS: f64 = 1e-7;

impl BceLoss {
    /// Scalar BCE: -mean(y·log(p) + (1-y)·log(1-p)), p clipped.
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| {
                let p = p.clamp(EPS, 1.0 - EPS);
                -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
            })
            .sum::<f64>() / n
    }

    /// Gradient of the mean loss w.r.t. each prediction:
    /// (p - y) / (p · (1 - p) · n), p clipped.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| {
                let p = p.clamp(EPS, 1.0 - EPS);
                (p - y) / (p * (1.0 - p) * n)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_prediction_is_near_zero() {
        let loss = BceLoss::loss(&[1.0, 0.0, 1.0], &[1.0, 0.0, 1.0]);
        assert!(loss < 1e-6);
    }

    #[test]
    fn uniform_guess_costs_ln2() {
        let loss = BceLoss::loss(&[0.5, 0.5], &[1.0, 0.0]);
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let p = [0.3, 0.8, 0.55];
        let y = [0.0, 1.0, 0.4];
        let grad = BceLoss::derivative(&p, &y);
        let eps = 1e-6;
        for i in 0..p.len() {
            let mut plus = p;
            plus[i] += eps;
            let mut minus = p;
            minus[i] -= eps;
            let numeric = (BceLoss::loss(&plus, &y) - BceLoss::loss(&minus, &y)) / (2.0 * eps);
            assert!((numeric - grad[i]).abs() < 1e-6);
        }
    }
}
