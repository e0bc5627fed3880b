use thiserror::Error;

/// Every failure the healing pipeline can report.
///
/// All variants are recoverable at the `heal_and_decode` boundary, where they
/// are folded into a `ScanResult`. `DataIntegrity` is the exception during
/// training: it aborts the run before any weights are written.
#[derive(Error, Debug)]
pub enum HealError {
    #[error("no trained model is loaded")]
    ModelUnavailable,
    #[error("input cannot be coerced to the model shape: {0}")]
    InputShape(String),
    #[error("no barcode decoder is available on this platform")]
    DecodeUnsupported,
    #[error("training data integrity error: {0}")]
    DataIntegrity(String),
    #[error("healed image still does not decode (confidence {confidence:.3})")]
    ReconstructionFailed { confidence: f64 },
    #[error("barcode encoding failed: {0}")]
    Encode(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

pub type Result<T> = std::result::Result<T, HealError>;
