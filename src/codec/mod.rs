//! Barcode encode/decode capability.
//!
//! The core never depends on a concrete barcode library: sample generation
//! talks to a `BarcodeEncoder`, request handling to a `DecodeAdapter` that
//! wraps an optional `BarcodeDecoder`.

pub mod adapter;
pub mod qr;

pub use adapter::{DecodeAdapter, DecodeOutcome};
pub use qr::{QrEncoder, RqrrDecoder};

use image::GrayImage;

use crate::error::Result;

/// Renders a payload string as a grayscale barcode image.
pub trait BarcodeEncoder: Send + Sync {
    fn encode(&self, payload: &str) -> Result<GrayImage>;
}

/// Finds and decodes every barcode in an image.
///
/// Payloads are returned in the decoder's native enumeration order; an image
/// without a readable symbol yields an empty vector.
pub trait BarcodeDecoder: Send + Sync {
    fn decode(&self, image: &GrayImage) -> Vec<String>;
}
