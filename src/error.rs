// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for kernel density estimation
//!
//! Every fallible operation in the crate returns [`Result`]. Errors are raised at the
//! point of first detection (usually `fit` or the start of `evaluate`) and are never
//! produced after a partial computation.

use thiserror::Error;

/// Error type for density estimation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KdeError {
    /// Fewer samples than the operation needs
    #[error("Insufficient data: expected at least {expected} samples, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Malformed or contradictory samples, weights, queries, grids or bandwidths
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Kernel identifier not present in the kernel registry
    #[error("Invalid kernel: unknown kernel `{0}`")]
    InvalidKernel(String),

    /// Backend identifier not present in the backend registry
    #[error("Invalid backend: unknown backend `{0}`")]
    InvalidBackend(String),

    /// Data-driven bandwidth selection did not produce a usable bandwidth
    #[error("Bandwidth selection failed: {0}")]
    BandwidthSelectionFailed(String),
}

/// Result type alias using [`KdeError`]
pub type Result<T> = std::result::Result<T, KdeError>;

impl KdeError {
    /// Error for an empty sample set
    pub fn empty_input() -> Self {
        Self::InsufficientData {
            expected: 1,
            actual: 0,
        }
    }

    /// Error for a length or dimension mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::InvalidInput(format!("{context} contains NaN or infinite values"))
    }
}
