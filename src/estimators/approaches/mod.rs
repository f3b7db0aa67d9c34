// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod common_nd;
pub mod convolution;
pub mod direct;
pub mod kernel;
pub mod selection;
pub mod tree;

// Unified re-exports so tests and users can import
// kernel_density::estimators::approaches::* ergonomically.
pub use common_nd::dataset::{SampleData, SampleSet};
pub use common_nd::grid::{Grid, GridSpec};
pub use convolution::{ConvolutionKde, Convolver, DenseConvolver, FftConvolver};
pub use direct::DirectKde;
pub use kernel::{Bandwidth, Kernel, KernelFamily, Metric, ScaledBandwidth};
pub use selection::BandwidthMethod;
pub use tree::{TreeKde, TreeStats};
