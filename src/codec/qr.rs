use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};

use crate::codec::{BarcodeDecoder, BarcodeEncoder};
use crate::error::{HealError, Result};

/// QR encoder backed by the `qrcode` crate.
///
/// The symbol version is the smallest that fits the payload. Each module is
/// drawn as a `module_px × module_px` square, black on white, surrounded by a
/// `quiet_zone`-module white border.
#[derive(Debug, Clone, Copy)]
pub struct QrEncoder {
    pub ec_level: EcLevel,
    pub module_px: u32,
    pub quiet_zone: u32,
}

impl Default for QrEncoder {
    fn default() -> Self {
        QrEncoder { ec_level: EcLevel::M, module_px: 10, quiet_zone: 4 }
    }
}

impl BarcodeEncoder for QrEncoder {
    fn encode(&self, payload: &str) -> Result<GrayImage> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.ec_level)
            .map_err(|e| HealError::Encode(e.to_string()))?;
        let modules = code.width() as u32;
        let colors = code.to_colors();
        let side = (modules + 2 * self.quiet_zone) * self.module_px;

        Ok(GrayImage::from_fn(side, side, |x, y| {
            let mx = (x / self.module_px) as i64 - self.quiet_zone as i64;
            let my = (y / self.module_px) as i64 - self.quiet_zone as i64;
            let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
            if inside && colors[(my as u32 * modules + mx as u32) as usize] == Color::Dark {
                Luma([0])
            } else {
                Luma([255])
            }
        }))
    }
}

/// QR decoder backed by `rqrr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl BarcodeDecoder for RqrrDecoder {
    fn decode(&self, image: &GrayImage) -> Vec<String> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Vec::new();
        }
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
            image.get_pixel(x as u32, y as u32)[0]
        });
        prepared.detect_grids()
            .into_iter()
            .filter_map(|grid| match grid.decode() {
                Ok((_meta, content)) => Some(content),
                Err(e) => {
                    log::debug!("grid found but not decodable: {:?}", e);
                    None
                }
            })
            .collect()
    }
}
