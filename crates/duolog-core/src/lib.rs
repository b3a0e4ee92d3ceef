//! duolog Core - Configuration, levels and error handling

pub mod config;
pub mod constants;
pub mod error;
pub mod level;

pub use config::*;
pub use constants::*;
pub use error::{Error, Result};
pub use level::{Level, Mode};
