// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Direct Backend
//!
//! Exact summation over every (query, sample) pair:
//!
//! f̂(q) = (1 / c) Σ_i w_i |H_i|^(-1) K(H_i^(-1) (q − x_i))
//!
//! Cost is `O(M·N·D)`. This is the reference the other backends are measured against and
//! the only backend with no approximation at all.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use ndarray::Array1;
use tracing::instrument;

use crate::error::Result;
use crate::estimators::approaches::common_nd::dataset::SampleSet;
use crate::estimators::approaches::kernel::{Kernel, ScaledBandwidth};
use crate::estimators::traits::DensityBackend;

/// Exact O(M·N) density backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectKde;

impl DirectKde {
    pub fn new() -> Self {
        DirectKde
    }

    fn density_at<const D: usize>(
        samples: &SampleSet<D>,
        kernel: &Kernel,
        bandwidth: &ScaledBandwidth<D>,
        query: &[f64; D],
    ) -> f64 {
        samples
            .points
            .iter()
            .zip(samples.weights.iter())
            .enumerate()
            .filter(|(_, (_, w))| **w != 0.0)
            .map(|(i, (point, w))| w * bandwidth.contribution(kernel, i, query, point))
            .sum()
    }
}

impl<const D: usize> DensityBackend<D> for DirectKde {
    fn name(&self) -> &'static str {
        "direct"
    }

    #[instrument(skip_all, fields(samples = samples.len(), queries = queries.len()))]
    fn evaluate(
        &self,
        samples: &SampleSet<D>,
        kernel: &Kernel,
        bandwidth: &ScaledBandwidth<D>,
        queries: &[[f64; D]],
    ) -> Result<Array1<f64>> {
        let norm = kernel.normalization(D);

        #[cfg(feature = "parallel")]
        let sums: Vec<f64> = queries
            .par_iter()
            .map(|q| Self::density_at(samples, kernel, bandwidth, q))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let sums: Vec<f64> = queries
            .iter()
            .map(|q| Self::density_at(samples, kernel, bandwidth, q))
            .collect();

        Ok(Array1::from(sums) / norm)
    }
}
