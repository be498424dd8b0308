//! Inference pipeline: raw record -> encoded vector -> prediction, with
//! optional explanation and market-reference comparison.

pub mod encoder;
pub mod explain;
pub mod prediction;
pub mod reference;

pub use encoder::encode;
pub use explain::PathExplainer;
pub use prediction::{predict, PredictionResult};
pub use reference::{compare, ReferenceKey};
