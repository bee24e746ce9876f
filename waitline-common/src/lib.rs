//! Waitline Common - Shared configuration, logging, and errors for Waitline services.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Error types
//! - Logging setup and trace ID helpers

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{ClovaConfig, Config, NetworkConfig, ObservabilityConfig, ResponsesConfig};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};
