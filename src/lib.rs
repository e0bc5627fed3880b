pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod imaging;
pub mod codec;
pub mod data;
pub mod heal;
pub mod eval;
pub mod config;
pub mod error;

// Convenience re-exports
pub use math::tensor::Tensor;
pub use activation::activation::ActivationFunction;
pub use layers::Layer;
pub use network::{Network, NetworkSpec};
pub use loss::loss_type::LossType;
pub use optim::{Adam, Optimizer, Sgd};
pub use train::{train, train_from_store, TrainConfig, TrainOutcome};
pub use codec::{BarcodeDecoder, BarcodeEncoder, DecodeAdapter, DecodeOutcome, QrEncoder, RqrrDecoder};
pub use data::{damage, SampleGenerator, SamplePair, SampleStore};
pub use heal::{HealingResult, HealingService, ScanResult, Scanner};
pub use eval::{evaluate_pairs, DecodeReport};
pub use config::HealerConfig;
pub use error::{HealError, Result};
