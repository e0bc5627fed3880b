use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HealError, Result};
use crate::loss::loss_type::LossType;
use crate::train::TrainConfig;

pub const ENV_MODEL: &str = "QR_HEALER_MODEL";
pub const ENV_DATA: &str = "QR_HEALER_DATA";
pub const ENV_PORT: &str = "PORT";

/// Settings shared by the CLI and the server.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// changes. Resolution order: defaults, then the file, then environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealerConfig {
    /// Side length R of samples and of the model input.
    pub image_size: usize,
    pub num_samples: usize,
    pub damage_fraction: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub val_fraction: f64,
    pub seed: u64,
    pub loss: LossType,
    pub data_root: PathBuf,
    pub model_path: PathBuf,
    pub bind_addr: String,
}

impl Default for HealerConfig {
    fn default() -> Self {
        HealerConfig {
            image_size: 128,
            num_samples: 1000,
            damage_fraction: 0.25,
            epochs: 20,
            batch_size: 32,
            learning_rate: 0.001,
            val_fraction: 0.2,
            seed: 42,
            loss: LossType::BinaryCrossEntropy,
            data_root: PathBuf::from("qrcodes"),
            model_path: PathBuf::from("qr_healer_model.json"),
            bind_addr: "127.0.0.1:5000".into(),
        }
    }
}

impl HealerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<HealerConfig> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Defaults or `path`, then environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<HealerConfig> {
        let mut config = match path {
            Some(p) => HealerConfig::from_file(p)?,
            None => HealerConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `QR_HEALER_MODEL`, `QR_HEALER_DATA` and `PORT` as returned by
    /// `lookup`. `PORT` keeps the configured host.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup(ENV_MODEL) {
            self.model_path = PathBuf::from(model);
        }
        if let Some(data) = lookup(ENV_DATA) {
            self.data_root = PathBuf::from(data);
        }
        if let Some(port) = lookup(ENV_PORT) {
            let port: u16 = port.trim().parse()
                .map_err(|_| HealError::Config(format!("{} is not a valid port: {:?}", ENV_PORT, port)))?;
            let host = self.bind_addr.rsplit_once(':').map(|(h, _)| h).unwrap_or("127.0.0.1");
            self.bind_addr = format!("{}:{}", host, port);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.image_size == 0 || self.image_size % 4 != 0 {
            return Err(HealError::Config(format!(
                "image_size must be a positive multiple of 4, got {}", self.image_size
            )));
        }
        if !(0.0..=1.0).contains(&self.damage_fraction) {
            return Err(HealError::Config(format!("damage_fraction {} is outside [0, 1]", self.damage_fraction)));
        }
        if !(0.0..1.0).contains(&self.val_fraction) {
            return Err(HealError::Config(format!("val_fraction {} is outside [0, 1)", self.val_fraction)));
        }
        if self.batch_size == 0 {
            return Err(HealError::Config("batch_size must be at least 1".into()));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(HealError::Config(format!("learning_rate must be positive, got {}", self.learning_rate)));
        }
        Ok(())
    }

    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            learning_rate: self.learning_rate,
            image_size: self.image_size,
            val_fraction: self.val_fraction,
            seed: self.seed,
            damage_fraction: Some(self.damage_fraction),
            ..TrainConfig::new(self.epochs, self.batch_size, self.loss)
        }
    }
}
