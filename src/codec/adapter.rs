use std::fmt;
use std::sync::Arc;

use image::GrayImage;

use crate::codec::{BarcodeDecoder, RqrrDecoder};
use crate::error::{HealError, Result};

/// Result of one decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub payload: Option<String>,
    pub success: bool,
}

impl DecodeOutcome {
    pub fn found(payload: String) -> Self {
        DecodeOutcome { payload: Some(payload), success: true }
    }

    pub fn failed() -> Self {
        DecodeOutcome { payload: None, success: false }
    }
}

/// Wraps whichever barcode decoder the platform provides.
///
/// Without a decoder every call reports failure instead of erroring, so the
/// healing flow keeps working in a degraded mode.
#[derive(Clone)]
pub struct DecodeAdapter {
    decoder: Option<Arc<dyn BarcodeDecoder>>,
}

impl DecodeAdapter {
    pub fn new<D: BarcodeDecoder + 'static>(decoder: D) -> Self {
        DecodeAdapter { decoder: Some(Arc::new(decoder)) }
    }

    /// An adapter with no decoding capability.
    pub fn unsupported() -> Self {
        DecodeAdapter { decoder: None }
    }

    /// The built-in QR decoder.
    pub fn platform_default() -> Self {
        DecodeAdapter::new(RqrrDecoder)
    }

    pub fn is_available(&self) -> bool {
        self.decoder.is_some()
    }

    /// First decoded payload, `Ok(None)` if nothing decodes, or
    /// `DecodeUnsupported` when no decoder is present.
    pub fn try_decode(&self, image: &GrayImage) -> Result<Option<String>> {
        let decoder = self.decoder.as_ref().ok_or(HealError::DecodeUnsupported)?;
        Ok(decoder.decode(image).into_iter().next())
    }

    pub fn decode(&self, image: &GrayImage) -> DecodeOutcome {
        match self.try_decode(image) {
            Ok(Some(payload)) => DecodeOutcome::found(payload),
            Ok(None) => DecodeOutcome::failed(),
            Err(e) => {
                log::debug!("decode skipped: {}", e);
                DecodeOutcome::failed()
            }
        }
    }
}

impl fmt::Debug for DecodeAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeAdapter")
            .field("available", &self.is_available())
            .finish()
    }
}
