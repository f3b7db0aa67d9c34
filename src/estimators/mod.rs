// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod approaches;
pub mod config;
pub mod density;
pub mod traits;
pub mod utils;

pub use config::{Backend, BandwidthSpec, BoundaryCorrection, KdeBuilder, KdeConfig};
pub use density::{DensityEstimate, EvaluateOptions, FittedKde, KernelDensity};
pub use traits::{BandwidthSelector, DensityBackend, KernelFunction};
