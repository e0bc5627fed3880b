pub mod damage;
pub mod generator;
pub mod payload;
pub mod sample;
pub mod store;

pub use damage::{damage, damage_with_rng};
pub use generator::{GenerationReport, SampleGenerator};
pub use payload::random_payload;
pub use sample::SamplePair;
pub use store::SampleStore;
