pub mod cache;
pub mod convert;
pub mod core;
pub mod extract;
pub mod fetch;

// --- Primary exports ---
pub use convert::convert;
pub use core::types;
pub use core::types::*;
pub use core::{AppState, ConvertError};
pub use fetch::orchestrator::orchestrate;
pub use fetch::{LiveStrategyRunner, StrategyRunner};
