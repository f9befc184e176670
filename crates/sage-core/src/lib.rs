//! Shared vocabulary for the Sage study companion.
//!
//! Defines the domain types exchanged with external collaborators, the
//! transport-facing event and reply shapes, configuration, errors, and
//! UTF-8-safe text segmentation for chunked delivery.

pub mod config;
pub mod error;
pub mod text;
pub mod types;

pub use config::SageConfig;
pub use error::{Result, SageError};
pub use types::*;
