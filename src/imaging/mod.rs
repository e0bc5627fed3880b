//! Image preprocessing shared by sample generation, training and healing.
//!
//! These functions decode image bytes (PNG/JPEG/BMP/GIF), convert them to
//! single-channel grayscale, resize them, and move pixel values between the
//! raw [0, 255] domain and the normalized [0, 1] domain used by the model.

pub mod compose;
pub mod convert;
pub mod resize;

pub use compose::side_by_side;
pub use convert::{denormalize, encode_png, load_from_memory, normalize, png_data_url, to_grayscale};
pub use resize::{resize_area, resize_bilinear};
