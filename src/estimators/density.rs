// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Kernel Density Estimation Facade
//!
//! The uniform fit/evaluate contract over the three density backends.
//!
//! f̂(q) = Σ_i w_i |H_i|^(-1) K(H_i^(-1) (q − x_i)) / c_K,D
//!
//! with weights normalized to sum to one, so the estimate integrates to one up to
//! truncation and grid error.
//!
//! ## Workflow
//!
//! 1. Configure a [`KernelDensity`] (kernel, backend, bandwidth or selection method, grid)
//! 2. [`KernelDensity::fit`] validates and stores the samples; nothing is computed yet
//! 3. [`FittedKde::evaluate`] resolves the bandwidth (selected once, then cached), builds the
//!    query set (an automatic grid when none is given) and dispatches to the backend
//!
//! ## Example
//!
//! ```
//! use kernel_density::KernelDensity;
//! use ndarray::array;
//!
//! let kde = KernelDensity::<1>::builder()
//!     .kernel("epanechnikov")
//!     .backend("direct")
//!     .bandwidth(0.5)
//!     .build()
//!     .unwrap();
//! let fitted = kde.fit(array![-1.0, 0.0, 1.0], None).unwrap();
//! let estimate = fitted.evaluate_at(array![0.0, 2.0]).unwrap();
//! assert_eq!(estimate.len(), 2);
//! assert!(estimate.values()[0] > estimate.values()[1]);
//! ```

use std::borrow::Cow;
use std::sync::OnceLock;

use ndarray::{Array1, ArrayD, IxDyn};
use tracing::{debug, instrument};

use crate::error::{KdeError, Result};
use crate::estimators::approaches::common_nd::dataset::{SampleData, SampleSet};
use crate::estimators::approaches::common_nd::grid::{default_evaluation_points, Grid};
use crate::estimators::approaches::convolution::ConvolutionKde;
use crate::estimators::approaches::direct::DirectKde;
use crate::estimators::approaches::kernel::{Bandwidth, Kernel, ScaledBandwidth};
use crate::estimators::approaches::tree::TreeKde;
use crate::estimators::config::{Backend, BandwidthSpec, BoundaryCorrection, KdeBuilder, KdeConfig};
use crate::estimators::traits::{BandwidthSelector, DensityBackend};

/// Configured, unfitted kernel density estimator over `D` dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct KernelDensity<const D: usize> {
    config: KdeConfig,
}

impl<const D: usize> Default for KernelDensity<D> {
    fn default() -> Self {
        Self {
            config: KdeConfig::default(),
        }
    }
}

impl<const D: usize> KernelDensity<D> {
    /// Estimator with the default configuration: Gaussian kernel, tree backend, Silverman
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> KdeBuilder<D> {
        KdeBuilder::new()
    }

    /// Create an estimator from an explicit configuration
    ///
    /// # Errors
    ///
    /// Returns [`KdeError::InvalidInput`] if the configuration is inconsistent with `D`.
    pub fn with_config(config: KdeConfig) -> Result<Self> {
        config.validate::<D>()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &KdeConfig {
        &self.config
    }

    /// Validate and store the samples
    ///
    /// # Arguments
    ///
    /// * `samples` - Sample points (1D array for `D = 1`, or rows of a 2D array)
    /// * `weights` - Optional non-negative weights, normalized to sum to one
    ///
    /// # Returns
    ///
    /// A fitted estimator; no bandwidth or density is computed yet
    ///
    /// # Errors
    ///
    /// - [`KdeError::InsufficientData`] for an empty sample set
    /// - [`KdeError::InvalidInput`] for malformed samples or weights, or a per-sample
    ///   bandwidth whose length differs from the number of samples
    pub fn fit(
        &self,
        samples: impl Into<SampleData>,
        weights: Option<Array1<f64>>,
    ) -> Result<FittedKde<D>> {
        self.config.validate::<D>()?;
        let samples = SampleSet::<D>::new(samples, weights)?;
        if let BandwidthSpec::Fixed(bandwidth) = &self.config.bandwidth {
            bandwidth.resolve::<D>(samples.len())?;
        }
        debug!(n = samples.len(), dim = D, "fitted samples");
        Ok(FittedKde {
            config: self.config.clone(),
            samples,
            selected: OnceLock::new(),
        })
    }
}

/// Per-call overrides for [`FittedKde::evaluate_with`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluateOptions {
    pub bandwidth: Option<Bandwidth>,
    pub kernel: Option<String>,
}

impl EvaluateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bandwidth(mut self, bandwidth: impl Into<Bandwidth>) -> Self {
        self.bandwidth = Some(bandwidth.into());
        self
    }

    pub fn with_kernel(mut self, name: &str) -> Self {
        self.kernel = Some(name.to_string());
        self
    }
}

/// Estimator holding validated samples
#[derive(Debug)]
pub struct FittedKde<const D: usize> {
    config: KdeConfig,
    samples: SampleSet<D>,
    /// Bandwidth selected for the configured kernel
    selected: OnceLock<Bandwidth>,
}

impl<const D: usize> FittedKde<D> {
    pub fn samples(&self) -> &SampleSet<D> {
        &self.samples
    }

    pub fn config(&self) -> &KdeConfig {
        &self.config
    }

    /// Bandwidth used when no per-call override is given
    ///
    /// Data-driven selections are computed on first use and cached.
    pub fn bandwidth(&self) -> Result<Bandwidth> {
        self.bandwidth_for(&self.config.kernel)
    }

    fn bandwidth_for(&self, kernel: &Kernel) -> Result<Bandwidth> {
        match &self.config.bandwidth {
            BandwidthSpec::Fixed(bandwidth) => Ok(bandwidth.clone()),
            BandwidthSpec::Method(method) if *kernel == self.config.kernel => {
                if let Some(bandwidth) = self.selected.get() {
                    return Ok(bandwidth.clone());
                }
                let bandwidth = method.select(&self.samples, kernel)?;
                Ok(self.selected.get_or_init(|| bandwidth).clone())
            }
            BandwidthSpec::Method(method) => method.select(&self.samples, kernel),
        }
    }

    /// Density on the automatic (or configured) evaluation grid
    pub fn evaluate_grid(&self) -> Result<DensityEstimate<D>> {
        self.evaluate_with(None, EvaluateOptions::default())
    }

    /// Density at the given query points
    pub fn evaluate_at(&self, queries: impl Into<SampleData>) -> Result<DensityEstimate<D>> {
        self.evaluate_with(Some(queries.into()), EvaluateOptions::default())
    }

    /// Density at `queries`, or on the evaluation grid when `None`
    pub fn evaluate(&self, queries: Option<SampleData>) -> Result<DensityEstimate<D>> {
        self.evaluate_with(queries, EvaluateOptions::default())
    }

    /// Evaluate with per-call bandwidth and kernel overrides
    ///
    /// # Arguments
    ///
    /// * `queries` - Query points, or `None` for a grid covering the samples plus the kernel
    ///   reach (the configured [`crate::GridSpec`] if one was given)
    /// * `options` - Bandwidth and kernel overrides for this call only
    ///
    /// # Returns
    ///
    /// One non-negative density per query, in query order
    ///
    /// # Errors
    ///
    /// - [`KdeError::InvalidKernel`] for an unknown kernel override
    /// - [`KdeError::InvalidInput`] for query dimension mismatches, NaN/Inf queries, invalid
    ///   bandwidths, or per-sample bandwidths with the convolution backend
    /// - [`KdeError::InsufficientData`] / [`KdeError::BandwidthSelectionFailed`] when the
    ///   bandwidth has to be selected and selection fails
    #[instrument(skip_all, fields(backend = self.config.backend.name()))]
    pub fn evaluate_with(
        &self,
        queries: Option<SampleData>,
        options: EvaluateOptions,
    ) -> Result<DensityEstimate<D>> {
        let kernel = match &options.kernel {
            Some(name) => self.config.kernel_named(name)?,
            None => self.config.kernel,
        };
        let queries = queries
            .map(|q| q.to_points::<D>("queries"))
            .transpose()?;
        let bandwidth = match options.bandwidth {
            Some(bandwidth) => bandwidth,
            None => self.bandwidth_for(&kernel)?,
        };
        let scaled = bandwidth.resolve::<D>(self.samples.len())?;
        if scaled.is_per_sample() && self.config.backend == Backend::Convolution {
            return Err(KdeError::InvalidInput(
                "per-sample bandwidths are not supported by the convolution backend".to_string(),
            ));
        }

        let (grid, points) = match queries {
            Some(points) => (None, points),
            None => {
                let grid = self.evaluation_grid(&kernel, &scaled)?;
                let nodes = grid.nodes();
                (Some(grid), nodes)
            }
        };

        let (working, scaled): (Cow<'_, SampleSet<D>>, ScaledBandwidth<D>) = match &self.config.boundary {
            BoundaryCorrection::None => (Cow::Borrowed(&self.samples), scaled),
            BoundaryCorrection::Reflect { lower, upper } => {
                let (lower, upper) = bounds::<D>(lower, upper);
                let (reflected, origin, flips) = self.samples.reflected(&lower, &upper)?;
                (Cow::Owned(reflected), scaled.replicate(&origin, &flips))
            }
        };

        debug!(
            kernel = kernel.name(),
            samples = working.len(),
            queries = points.len(),
            "dispatching density evaluation"
        );
        let mut values = self.dispatch(&working, &kernel, &scaled, &points)?;

        if let BoundaryCorrection::Reflect { lower, upper } = &self.config.boundary {
            let (lower, upper) = bounds::<D>(lower, upper);
            for (value, p) in values.iter_mut().zip(&points) {
                if (0..D).any(|j| p[j] < lower[j] || p[j] > upper[j]) {
                    *value = 0.0;
                }
            }
        }

        Ok(DensityEstimate {
            points,
            values,
            bandwidth,
            grid,
        })
    }

    fn dispatch(
        &self,
        samples: &SampleSet<D>,
        kernel: &Kernel,
        bandwidth: &ScaledBandwidth<D>,
        points: &[[f64; D]],
    ) -> Result<Array1<f64>> {
        let eps = self.config.truncation_eps;
        match self.config.backend {
            Backend::Direct => DirectKde.evaluate(samples, kernel, bandwidth, points),
            Backend::Tree => TreeKde::new()
                .with_truncation(eps)
                .evaluate(samples, kernel, bandwidth, points),
            Backend::Convolution => {
                let backend = ConvolutionKde::new().with_truncation(eps);
                match (&self.config.grid, &self.config.boundary) {
                    (Some(spec), BoundaryCorrection::None) => backend
                        .with_grid(spec.clone())
                        .evaluate(samples, kernel, bandwidth, points),
                    _ => backend.evaluate(samples, kernel, bandwidth, points),
                }
            }
        }
    }

    /// Explicit grid, or the samples' bounding box widened by the kernel reach
    fn evaluation_grid(&self, kernel: &Kernel, bandwidth: &ScaledBandwidth<D>) -> Result<Grid<D>> {
        if let Some(spec) = &self.config.grid {
            return Grid::from_spec(spec);
        }
        let reach = bandwidth.reach(kernel.search_radius(D, self.config.truncation_eps)?);
        let points = self
            .config
            .grid_points
            .unwrap_or_else(|| default_evaluation_points(D));
        let grid = Grid::covering(&self.samples.points, &reach, points)?;
        match &self.config.boundary {
            BoundaryCorrection::None => Ok(grid),
            BoundaryCorrection::Reflect { lower, upper } => {
                let (lower, upper) = bounds::<D>(lower, upper);
                let lo: [f64; D] = std::array::from_fn(|j| grid.lower()[j].max(lower[j]));
                let hi: [f64; D] = std::array::from_fn(|j| grid.upper()[j].min(upper[j]));
                Grid::new(lo, hi, grid.shape())
            }
        }
    }
}

fn bounds<const D: usize>(lower: &[f64], upper: &[f64]) -> ([f64; D], [f64; D]) {
    (
        std::array::from_fn(|j| lower.get(j).copied().unwrap_or(f64::NEG_INFINITY)),
        std::array::from_fn(|j| upper.get(j).copied().unwrap_or(f64::INFINITY)),
    )
}

/// Densities at a set of query points
#[derive(Debug, Clone, PartialEq)]
pub struct DensityEstimate<const D: usize> {
    points: Vec<[f64; D]>,
    values: Array1<f64>,
    bandwidth: Bandwidth,
    grid: Option<Grid<D>>,
}

impl<const D: usize> DensityEstimate<D> {
    /// Query points, in evaluation order
    pub fn points(&self) -> &[[f64; D]] {
        &self.points
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn into_values(self) -> Array1<f64> {
        self.values
    }

    /// Bandwidth the estimate was computed with
    pub fn bandwidth(&self) -> &Bandwidth {
        &self.bandwidth
    }

    /// Evaluation grid, when the queries were generated automatically
    pub fn grid(&self) -> Option<&Grid<D>> {
        self.grid.as_ref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Densities reshaped to the grid shape
    pub fn grid_values(&self) -> Option<ArrayD<f64>> {
        let grid = self.grid.as_ref()?;
        ArrayD::from_shape_vec(IxDyn(&grid.shape()), self.values.to_vec()).ok()
    }

    /// Trapezoidal integral of the estimate over its grid
    pub fn grid_integral(&self) -> Option<f64> {
        let grid = self.grid.as_ref()?;
        Some(grid.integrate(&self.values.to_vec()))
    }
}
