pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::BazaarConfig;
pub use error::{BazaarError, Result};
pub use types::*;
