//! Core utilities and common types for Vigil.

pub mod config;
pub mod error;
pub mod types;

pub use config::VigilConfig;
pub use error::{Error, Result};
pub use types::*;
