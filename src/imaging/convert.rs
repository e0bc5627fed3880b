use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, GrayImage, ImageEncoder};

use crate::error::{HealError, Result};
use crate::math::tensor::Tensor;

/// Decodes PNG/JPEG/BMP/GIF bytes.
pub fn load_from_memory(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Collapses any color layout (RGB, RGBA, LA, 16-bit) to 8-bit luma.
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    match img {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => other.to_luma8(),
    }
}

/// Maps a grayscale image to a `1 × H × W` tensor with values in [0, 1].
pub fn normalize(img: &GrayImage) -> Tensor {
    let (w, h) = img.dimensions();
    let data = img.as_raw().iter().map(|&p| p as f64 / 255.0).collect();
    Tensor::from_data(1, h as usize, w as usize, data)
}

/// Maps the first channel of a [0, 1] tensor back to 8-bit intensities.
///
/// Values are scaled by 255 and truncated toward zero, so only an exact 1.0
/// becomes 255.
pub fn denormalize(tensor: &Tensor) -> Result<GrayImage> {
    let pixels: Vec<u8> = tensor.channel(0).iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0) as u8)
        .collect();
    GrayImage::from_raw(tensor.width as u32, tensor.height as u32, pixels)
        .ok_or_else(|| HealError::InputShape("tensor plane does not match its dimensions".into()))
}

pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(img.as_raw(), img.width(), img.height(), ColorType::L8)?;
    Ok(buf)
}

/// PNG-encodes `img` as a `data:image/png;base64,...` URL.
pub fn png_data_url(img: &GrayImage) -> Result<String> {
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(encode_png(img)?)))
}
