use image::GrayImage;

/// Contrast-based confidence for a healed image.
///
/// Population standard deviation of the pixel intensities divided by 128,
/// clamped to [0, 1]. A crisp black/white symbol scores near 1, a flat or
/// washed-out image near 0. Empty images score 0.
pub fn contrast_confidence(img: &GrayImage) -> f64 {
    let pixels = img.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    let n = pixels.len() as f64;
    let mean = pixels.iter().map(|&p| p as f64).sum::<f64>() / n;
    let var = pixels.iter().map(|&p| (p as f64 - mean).powi(2)).sum::<f64>() / n;
    (var.sqrt() / 128.0).clamp(0.0, 1.0)
}
