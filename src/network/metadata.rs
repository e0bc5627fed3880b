use serde::{Deserialize, Serialize};

/// Optional annotations attached to a saved weights artifact.
/// All fields are Option<> so artifacts written without them deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModelMetadata {
    pub description: Option<String>,
    /// Side length R of the square grayscale images the model was trained on.
    pub image_size: Option<usize>,
    /// Damage fraction used when the training pairs were synthesized.
    pub damage_fraction: Option<f64>,
    /// Number of epochs actually completed (may be lower than requested if stopped).
    pub epochs_trained: Option<usize>,
    pub final_train_loss: Option<f64>,
    pub final_val_loss: Option<f64>,
}
