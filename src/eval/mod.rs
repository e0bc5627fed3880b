pub mod evaluate;

pub use evaluate::{comparison_strip, evaluate_pair, evaluate_pairs, DecodeReport, PairEvaluation};
