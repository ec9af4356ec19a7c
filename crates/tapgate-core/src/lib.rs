pub mod constants;
pub mod error;
pub mod timestamp;
pub mod types;
pub mod workday;

pub use error::{Error, Result};
pub use timestamp::parse_device_timestamp;
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
