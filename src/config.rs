//! Configuration loading and types for folio.
//!
//! - Type definitions (`types`)
//! - Layered loading from defaults, file, environment and flags (`load`)

mod load;
mod types;

use std::path::PathBuf;

pub use types::{BuildConfig, ConfigOverrides};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("path is not valid UTF-8: {0}")]
    EncodePath(PathBuf),
}
