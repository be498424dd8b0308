pub mod artifacts;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

// Re-export common types
pub use artifacts::InferenceContext;
pub use error::{AppError, Result};
