// Core data structures shared by the frame and the statistics modules
pub mod data_value;
pub mod error;

// Re-exports for convenience
pub use data_value::Value;
pub use error::{Error, Result};
