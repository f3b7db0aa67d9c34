// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use ndarray::Array1;

use crate::error::Result;
use crate::estimators::approaches::common_nd::dataset::SampleSet;
use crate::estimators::approaches::kernel::{Bandwidth, Kernel, ScaledBandwidth};

/// One-dimensional view of a smoothing kernel.
pub trait KernelFunction {
    /// Unnormalized weight at a bandwidth-scaled distance.
    fn weight(&self, scaled_distance: f64) -> f64;

    /// Scaled radius beyond which the weight is zero (`f64::INFINITY` if never).
    fn support_radius(&self) -> f64;

    /// Integral of the unnormalized multivariate kernel over `R^dim`.
    fn normalization(&self, dim: usize) -> f64;

    fn has_finite_support(&self) -> bool {
        self.support_radius().is_finite()
    }
}

/// Strategy computing `f̂(q) = Σ_i w_i K_H(q − x_i)` at a set of query points.
///
/// Backends receive validated samples (finite, weights non-negative) and a resolved
/// bandwidth. Results are returned in query order.
pub trait DensityBackend<const D: usize> {
    /// Registry name of the backend.
    fn name(&self) -> &'static str;

    /// Evaluate the density at every query point.
    fn evaluate(
        &self,
        samples: &SampleSet<D>,
        kernel: &Kernel,
        bandwidth: &ScaledBandwidth<D>,
        queries: &[[f64; D]],
    ) -> Result<Array1<f64>>;
}

/// Data-driven bandwidth selection.
pub trait BandwidthSelector {
    /// Select a bandwidth for the samples, smoothed with `kernel`.
    fn select<const D: usize>(&self, samples: &SampleSet<D>, kernel: &Kernel) -> Result<Bandwidth>;
}
