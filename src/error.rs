//! Error conditions callers need to tell apart.
//!
//! Everything else travels as a plain [`anyhow::Error`] with context attached. These
//! variants are wrapped in `anyhow` as well and can be recovered with
//! `err.downcast_ref::<CostsError>()`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CostsError {
    #[error("Claude directory not found: {}", .0.display())]
    NoClaudeDir(PathBuf),

    #[error("No JSONL files found under {}", .0.display())]
    NoJsonlFiles(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
