use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Deterministic shuffled train/validation split of `0..n`.
///
/// The validation side gets `ceil(n * val_fraction)` indices, capped so
/// the training side keeps at least one. The same `(n, val_fraction, seed)`
/// always yields the same split.
pub fn train_val_split(n: usize, val_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let fraction = if val_fraction.is_nan() { 0.0 } else { val_fraction.clamp(0.0, 1.0) };
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let n_val = ((n as f64 * fraction).ceil() as usize).min(n.saturating_sub(1));
    let train = indices.split_off(n_val);
    (train, indices)
}
