use image::GrayImage;

/// A matched training example: `damaged` is `clean` after damage synthesis.
///
/// `name` is the shared file name under the store's `clean/` and `damaged/`
/// directories (e.g. `qr_17.png`).
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePair {
    pub name: String,
    pub clean: GrayImage,
    pub damaged: GrayImage,
}

impl SamplePair {
    /// Conventional file name of the `index`-th generated pair.
    pub fn file_name(index: usize) -> String {
        format!("qr_{}.png", index)
    }
}
