use image::GrayImage;
use rand::Rng;

/// Flips `floor(W * H * fraction)` randomly chosen pixels of a copy of
/// `image` (`new = 255 - old`).
///
/// Positions are drawn independently and uniformly *with replacement*: a
/// pixel picked twice is flipped back. `fraction` is clamped to [0, 1].
pub fn damage(image: &GrayImage, fraction: f64) -> GrayImage {
    damage_with_rng(image, fraction, &mut rand::thread_rng())
}

pub fn damage_with_rng<R: Rng + ?Sized>(image: &GrayImage, fraction: f64, rng: &mut R) -> GrayImage {
    let mut damaged = image.clone();
    let (w, h) = damaged.dimensions();
    if w == 0 || h == 0 {
        return damaged;
    }
    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    let count = (w as f64 * h as f64 * fraction).floor() as u64;

    for _ in 0..count {
        let x = rng.gen_range(0..w);
        let y = rng.gen_range(0..h);
        let p = damaged.get_pixel_mut(x, y);
        p[0] = 255 - p[0];
    }
    damaged
}
