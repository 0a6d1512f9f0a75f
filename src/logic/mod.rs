pub mod condition;
pub mod energy;
pub mod engine;
pub mod seed;

pub use energy::estimate_tdee;
pub use engine::{infer, InferenceEngine};
