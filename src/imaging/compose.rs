use image::{GrayImage, Luma};

/// Lays images out left to right on a white canvas, `gap` pixels apart,
/// top-aligned. Used for clean | damaged | healed comparison strips.
pub fn side_by_side(images: &[&GrayImage], gap: u32) -> GrayImage {
    let width = images.iter().map(|i| i.width()).sum::<u32>()
        + gap * images.len().saturating_sub(1) as u32;
    let height = images.iter().map(|i| i.height()).max().unwrap_or(0);
    let mut canvas = GrayImage::from_pixel(width.max(1), height.max(1), Luma([255]));

    let mut offset = 0;
    for img in images {
        for (x, y, p) in img.enumerate_pixels() {
            canvas.put_pixel(offset + x, y, *p);
        }
        offset += img.width() + gap;
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_images_with_gap() {
        let a = GrayImage::from_pixel(2, 2, Luma([0]));
        let b = GrayImage::from_pixel(3, 1, Luma([50]));
        let strip = side_by_side(&[&a, &b], 1);
        assert_eq!(strip.dimensions(), (6, 2));
        assert_eq!(strip.get_pixel(1, 1)[0], 0);
        assert_eq!(strip.get_pixel(2, 0)[0], 255);
        assert_eq!(strip.get_pixel(3, 0)[0], 50);
        assert_eq!(strip.get_pixel(3, 1)[0], 255);
    }
}
