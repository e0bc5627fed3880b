use image::imageops::FilterType;
use image::GrayImage;

/// Resizes with area averaging: every destination pixel is the mean of the
/// source pixels it covers, weighted by fractional overlap. This is the
/// interpolation used to shrink rendered barcodes to the model size.
pub fn resize_area(img: &GrayImage, width: u32, height: u32) -> GrayImage {
    let (src_w, src_h) = img.dimensions();
    if (src_w, src_h) == (width, height) {
        return img.clone();
    }
    let cols = area_weights(src_w as usize, width as usize);
    let rows = area_weights(src_h as usize, height as usize);
    let src = img.as_raw();

    // Horizontal pass: src_h × width.
    let mut horizontal = vec![0.0f64; src_h as usize * width as usize];
    for y in 0..src_h as usize {
        let row = &src[y * src_w as usize..(y + 1) * src_w as usize];
        for (x, taps) in cols.iter().enumerate() {
            horizontal[y * width as usize + x] = taps.iter().map(|&(s, wt)| row[s] as f64 * wt).sum();
        }
    }

    // Vertical pass: height × width.
    GrayImage::from_fn(width, height, |x, y| {
        let v: f64 = rows[y as usize].iter()
            .map(|&(s, wt)| horizontal[s * width as usize + x as usize] * wt)
            .sum();
        image::Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// Bilinear resize, used for arbitrary inputs at healing time.
pub fn resize_bilinear(img: &GrayImage, width: u32, height: u32) -> GrayImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    image::imageops::resize(img, width, height, FilterType::Triangle)
}

/// For each destination index, the `(source index, weight)` pairs it averages.
/// Weights of one destination index sum to 1.
fn area_weights(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f64)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len).map(|d| {
        let start = d as f64 * scale;
        let end = start + scale;
        let first = start.floor() as usize;
        let last = (end.ceil() as usize).min(src_len);
        (first..last)
            .filter_map(|s| {
                let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                (overlap > 1e-12).then(|| (s, overlap / scale))
            })
            .collect()
    }).collect()
}
