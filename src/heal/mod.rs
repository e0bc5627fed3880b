//! Model-backed restoration of damaged QR images and the scan flow built on
//! top of it.

pub mod confidence;
pub mod pipeline;
pub mod service;

pub use confidence::contrast_confidence;
pub use pipeline::{decode_image_payload, ScanResult, Scanner};
pub use service::{HealingResult, HealingService};
