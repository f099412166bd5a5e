//! Error Types
//!
//! This module defines the error types used throughout vfog.
//!
//! # Overview
//!
//! Every failure in the fog core is either fatal at setup time (a bad
//! program, a bad configuration, an unusable camera target) or silently
//! skipped at frame time. There is no transient failure class, so nothing
//! here is retried.
//!
//! ```rust,ignore
//! use vfog_core::errors::{FogError, Result};
//!
//! fn setup() -> Result<()> {
//!     Err(FogError::MissingPass { pass: "Render Fog".into() })
//! }
//! ```

use thiserror::Error;

/// The main error type for vfog.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FogError {
    // ========================================================================
    // Setup Errors
    // ========================================================================
    /// A named pass could not be resolved in the fog program.
    #[error("Fog program has no pass named '{pass}'")]
    MissingPass {
        /// The stable pass name that was looked up
        pass: String,
    },

    /// The fog program descriptor is unusable.
    #[error("Invalid fog program: {0}")]
    InvalidProgram(String),

    /// A pipeline configuration value violates a hard invariant.
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// The camera target cannot back the fog targets.
    #[error("Invalid camera target: {width}x{height}")]
    InvalidTarget {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },

    /// The device cannot render one of the fog target formats.
    #[error("Unsupported device: {0}")]
    UnsupportedDevice(String),

    // ========================================================================
    // Frame Errors
    // ========================================================================
    /// The camera data supplied for a frame is unusable.
    #[error("Invalid camera: {0}")]
    InvalidCamera(String),
}

/// Alias for `Result<T, FogError>`.
pub type Result<T> = std::result::Result<T, FogError>;
