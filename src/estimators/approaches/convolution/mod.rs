// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Convolution Backend
//!
//! Grid-based density estimation: samples are linearly binned onto a regular grid, the binned
//! mass is convolved with the kernel sampled on the same spacing, and densities at arbitrary
//! query points are read back by multilinear interpolation.
//!
//! ## Algorithm
//!
//! 1. Choose a grid covering every sample, extended by the kernel reach
//!    `ρ_j = reach_j(H, r_eff)` on each side of axis `j`; queries outside it read as zero
//! 2. Bin sample weights onto the grid nodes (total mass preserved)
//! 3. Sample `K_H` on the node offsets `(m − P) Δ` with half-width `P_j = ⌈ρ_j / Δ_j⌉`
//! 4. Convolve (FFT by default) and clamp round-off negatives to zero
//! 5. Interpolate at the query points
//!
//! Per-sample bandwidths cannot be expressed as a single convolution and are rejected.
//! The approximation error shrinks as the grid is refined and is exact at grid nodes for
//! samples that lie on nodes.

pub mod fft;

use std::collections::BTreeMap;

use ndarray::{Array1, ArrayD, IxDyn};
use tracing::{debug, instrument, warn};

use crate::error::{KdeError, Result};
use crate::estimators::approaches::common_nd::dataset::SampleSet;
use crate::estimators::approaches::common_nd::grid::{default_convolution_points, Grid, GridSpec};
use crate::estimators::approaches::kernel::{Kernel, ScaledBandwidth, DEFAULT_TRUNCATION_EPS};
use crate::estimators::traits::DensityBackend;

pub use fft::{Convolver, DenseConvolver, FftConvolver};

/// Binned, grid-based density backend
#[derive(Debug, Clone, PartialEq)]
pub struct ConvolutionKde<C = FftConvolver> {
    convolver: C,
    grid: Option<GridSpec>,
    grid_points: Option<usize>,
    truncation_eps: f64,
}

impl ConvolutionKde<FftConvolver> {
    pub fn new() -> Self {
        Self {
            convolver: FftConvolver,
            grid: None,
            grid_points: None,
            truncation_eps: DEFAULT_TRUNCATION_EPS,
        }
    }
}

impl Default for ConvolutionKde<FftConvolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Convolver> ConvolutionKde<C> {
    /// Replace the convolution engine
    pub fn with_convolver<E: Convolver>(self, convolver: E) -> ConvolutionKde<E> {
        ConvolutionKde {
            convolver,
            grid: self.grid,
            grid_points: self.grid_points,
            truncation_eps: self.truncation_eps,
        }
    }

    /// Use a fixed grid instead of one derived from the data
    pub fn with_grid(mut self, grid: GridSpec) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Nodes per axis for derived grids
    pub fn with_grid_points(mut self, points: usize) -> Self {
        self.grid_points = Some(points);
        self
    }

    pub fn with_truncation(mut self, eps: f64) -> Self {
        self.truncation_eps = eps;
        self
    }

    /// Grid used for the given samples
    ///
    /// Derived grids cover the samples plus the kernel reach only; queries outside them lie
    /// beyond every kernel and read back as zero.
    pub fn resolve_grid<const D: usize>(
        &self,
        samples: &SampleSet<D>,
        kernel: &Kernel,
        bandwidth: &ScaledBandwidth<D>,
    ) -> Result<Grid<D>> {
        let reach = bandwidth.reach(kernel.search_radius(D, self.truncation_eps)?);
        match &self.grid {
            Some(spec) => {
                let grid = Grid::from_spec(spec)?;
                if !grid.covers(&samples.points, &reach) {
                    warn!(
                        lower = ?grid.lower(),
                        upper = ?grid.upper(),
                        "grid does not cover the kernel reach around every sample; mass near the edges is lost"
                    );
                }
                Ok(grid)
            }
            None => {
                let points = self
                    .grid_points
                    .unwrap_or_else(|| default_convolution_points(D));
                if points < 2 {
                    return Err(KdeError::InvalidInput(format!(
                        "grid needs at least 2 nodes per axis, got {points}"
                    )));
                }
                Grid::covering(&samples.points, &reach, points)
            }
        }
    }

    /// Kernel `K_H` of `sample` sampled on the node offsets of `grid`, normalized
    fn kernel_grid<const D: usize>(
        &self,
        kernel: &Kernel,
        bandwidth: &ScaledBandwidth<D>,
        sample: usize,
        grid: &Grid<D>,
    ) -> Result<ArrayD<f64>> {
        let rho = kernel.search_radius(D, self.truncation_eps)?;
        let spacing = grid.spacing();
        let shape = grid.shape();
        let half: [usize; D] = std::array::from_fn(|j| {
            let steps = (bandwidth.axis_reach(j, rho) / spacing[j]).ceil();
            (steps as usize).min(shape[j] - 1)
        });
        let extent: Vec<usize> = half.iter().map(|p| 2 * p + 1).collect();
        let scale = bandwidth.inverse_determinant(sample) / kernel.normalization(D);

        Ok(ArrayD::from_shape_fn(IxDyn(&extent), |index: IxDyn| {
            let offset: [f64; D] =
                std::array::from_fn(|j| (index[j] as f64 - half[j] as f64) * spacing[j]);
            kernel.evaluate(&bandwidth.scale(sample, &offset)) * scale
        }))
    }

    /// Density at every node of `grid`
    ///
    /// Samples whose kernels are mirrored copies of a correlated bandwidth are binned and
    /// convolved per mirror class.
    pub fn density_on_grid<const D: usize>(
        &self,
        samples: &SampleSet<D>,
        kernel: &Kernel,
        bandwidth: &ScaledBandwidth<D>,
        grid: &Grid<D>,
    ) -> Result<ArrayD<f64>> {
        if bandwidth.is_per_sample() {
            return Err(KdeError::InvalidInput(
                "per-sample bandwidths are not supported by the convolution backend".to_string(),
            ));
        }
        let mut classes: BTreeMap<Option<[bool; D]>, (usize, Vec<[f64; D]>, Vec<f64>)> =
            BTreeMap::new();
        for (i, (point, weight)) in samples.points.iter().zip(samples.weights.iter()).enumerate() {
            let (_, points, weights) = classes
                .entry(bandwidth.mirrored_axes(i))
                .or_insert_with(|| (i, Vec::new(), Vec::new()));
            points.push(*point);
            weights.push(*weight);
        }

        let mut density = ArrayD::<f64>::zeros(IxDyn(&grid.shape()));
        for (representative, points, weights) in classes.into_values() {
            let binned = grid.linear_binning(&points, &weights)?;
            let kernel_grid = self.kernel_grid(kernel, bandwidth, representative, grid)?;
            debug!(
                grid = ?grid.shape(),
                kernel = ?kernel_grid.shape(),
                samples = points.len(),
                "convolving binned samples"
            );
            density += &self.convolver.convolve(&binned, &kernel_grid)?;
        }
        density.mapv_inplace(|v| v.max(0.0));
        Ok(density)
    }
}

impl<C: Convolver, const D: usize> DensityBackend<D> for ConvolutionKde<C> {
    fn name(&self) -> &'static str {
        "convolution"
    }

    #[instrument(skip_all, fields(samples = samples.len(), queries = queries.len()))]
    fn evaluate(
        &self,
        samples: &SampleSet<D>,
        kernel: &Kernel,
        bandwidth: &ScaledBandwidth<D>,
        queries: &[[f64; D]],
    ) -> Result<Array1<f64>> {
        if bandwidth.is_per_sample() {
            return Err(KdeError::InvalidInput(
                "per-sample bandwidths are not supported by the convolution backend".to_string(),
            ));
        }
        let grid = self.resolve_grid(samples, kernel, bandwidth)?;
        let density = self.density_on_grid(samples, kernel, bandwidth, &grid)?;
        Ok(queries.iter().map(|q| grid.interpolate(&density, q)).collect())
    }
}
