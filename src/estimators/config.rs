// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Estimator configuration, registries and the builder.

use crate::error::{KdeError, Result};
use crate::estimators::approaches::common_nd::grid::{Grid, GridSpec};
use crate::estimators::approaches::kernel::{Bandwidth, Kernel, Metric, DEFAULT_TRUNCATION_EPS};
use crate::estimators::approaches::selection::BandwidthMethod;
use crate::estimators::density::KernelDensity;

pub const DEFAULT_KERNEL: &str = "gaussian";
pub const DEFAULT_BACKEND: &str = "tree";

/// Density backend selected by the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Exact pairwise summation
    Direct,
    /// KD-tree pruned summation
    Tree,
    /// Linear binning and FFT convolution
    Convolution,
}

/// Registry of backend names, matched case-insensitively
pub const BACKEND_REGISTRY: &[(&str, Backend)] = &[
    ("direct", Backend::Direct),
    ("naive", Backend::Direct),
    ("exact", Backend::Direct),
    ("tree", Backend::Tree),
    ("kdtree", Backend::Tree),
    ("convolution", Backend::Convolution),
    ("fft", Backend::Convolution),
    ("grid", Backend::Convolution),
];

impl Backend {
    /// # Errors
    ///
    /// Returns [`KdeError::InvalidBackend`] for names not present in [`BACKEND_REGISTRY`].
    pub fn from_name(name: &str) -> Result<Self> {
        let key = name.trim().to_lowercase();
        BACKEND_REGISTRY
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, backend)| *backend)
            .ok_or_else(|| KdeError::InvalidBackend(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Direct => "direct",
            Backend::Tree => "tree",
            Backend::Convolution => "convolution",
        }
    }
}

/// Where the bandwidth comes from
#[derive(Debug, Clone, PartialEq)]
pub enum BandwidthSpec {
    Fixed(Bandwidth),
    Method(BandwidthMethod),
}

impl Default for BandwidthSpec {
    fn default() -> Self {
        BandwidthSpec::Method(BandwidthMethod::Silverman)
    }
}

/// Boundary handling for bounded domains
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BoundaryCorrection {
    /// Mass beyond the data domain is lost to the tails
    #[default]
    None,
    /// Mirror samples across every finite bound; densities outside the bounds are zero.
    /// Use `f64::NEG_INFINITY` / `f64::INFINITY` for unbounded sides.
    Reflect { lower: Vec<f64>, upper: Vec<f64> },
}

/// Resolved estimator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct KdeConfig {
    pub kernel: Kernel,
    /// Metric forced onto every kernel, including per-call overrides
    pub metric: Option<Metric>,
    pub backend: Backend,
    pub bandwidth: BandwidthSpec,
    /// Nodes per axis of the automatic evaluation grid
    pub grid_points: Option<usize>,
    /// Explicit evaluation grid
    pub grid: Option<GridSpec>,
    /// Truncation threshold for Gaussian and exponential kernels
    pub truncation_eps: f64,
    pub boundary: BoundaryCorrection,
}

impl Default for KdeConfig {
    fn default() -> Self {
        Self {
            kernel: Kernel::default(),
            metric: None,
            backend: Backend::Tree,
            bandwidth: BandwidthSpec::default(),
            grid_points: None,
            grid: None,
            truncation_eps: DEFAULT_TRUNCATION_EPS,
            boundary: BoundaryCorrection::None,
        }
    }
}

impl KdeConfig {
    /// Kernel for a registry name, with the configured metric override applied
    pub fn kernel_named(&self, name: &str) -> Result<Kernel> {
        let kernel = Kernel::from_name(name)?;
        match self.metric {
            Some(metric) => kernel.with_metric(metric),
            None => Ok(kernel),
        }
    }

    /// Check every dimension-dependent setting against `D`
    pub fn validate<const D: usize>(&self) -> Result<()> {
        if D == 0 {
            return Err(KdeError::InvalidInput(
                "dimension must be at least 1".to_string(),
            ));
        }
        if !(self.truncation_eps > 0.0 && self.truncation_eps < 1.0) {
            return Err(KdeError::InvalidInput(format!(
                "truncation threshold must lie in (0, 1), got {}",
                self.truncation_eps
            )));
        }
        if let Some(metric) = &self.metric {
            metric.validate()?;
        }
        if let Some(points) = self.grid_points {
            if points < 2 {
                return Err(KdeError::InvalidInput(format!(
                    "grid needs at least 2 nodes per axis, got {points}"
                )));
            }
        }
        if let Some(spec) = &self.grid {
            Grid::<D>::from_spec(spec)?;
        }
        if let BandwidthSpec::Fixed(bandwidth) = &self.bandwidth {
            match bandwidth {
                Bandwidth::PerSample(widths) => {
                    if self.backend == Backend::Convolution {
                        return Err(KdeError::InvalidInput(
                            "per-sample bandwidths are not supported by the convolution backend"
                                .to_string(),
                        ));
                    }
                    if widths.iter().any(|h| !(h.is_finite() && *h > 0.0)) {
                        return Err(KdeError::InvalidInput(
                            "per-sample bandwidth must be positive and finite".to_string(),
                        ));
                    }
                }
                other => {
                    other.resolve::<D>(0)?;
                }
            }
        }
        if let BoundaryCorrection::Reflect { lower, upper } = &self.boundary {
            if lower.len() != D {
                return Err(KdeError::size_mismatch(D, lower.len(), "reflection lower bounds"));
            }
            if upper.len() != D {
                return Err(KdeError::size_mismatch(D, upper.len(), "reflection upper bounds"));
            }
            for (lo, hi) in lower.iter().zip(upper) {
                if lo.is_nan() || hi.is_nan() || lo >= hi {
                    return Err(KdeError::InvalidInput(format!(
                        "reflection bounds must satisfy lower < upper, got [{lo}, {hi}]"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Builder for [`KernelDensity`]
///
/// Identifiers are resolved in [`KdeBuilder::build`], so an unknown kernel or backend name
/// is reported there.
#[derive(Debug, Clone)]
pub struct KdeBuilder<const D: usize> {
    kernel: String,
    metric: Option<Metric>,
    backend: String,
    bandwidth: Option<Bandwidth>,
    method: Option<String>,
    grid_points: Option<usize>,
    grid: Option<GridSpec>,
    truncation_eps: f64,
    boundary: BoundaryCorrection,
}

impl<const D: usize> Default for KdeBuilder<D> {
    fn default() -> Self {
        Self {
            kernel: DEFAULT_KERNEL.to_string(),
            metric: None,
            backend: DEFAULT_BACKEND.to_string(),
            bandwidth: None,
            method: None,
            grid_points: None,
            grid: None,
            truncation_eps: DEFAULT_TRUNCATION_EPS,
            boundary: BoundaryCorrection::None,
        }
    }
}

impl<const D: usize> KdeBuilder<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kernel name or alias (see [`crate::estimators::approaches::kernel::KERNEL_REGISTRY`])
    pub fn kernel(mut self, name: &str) -> Self {
        self.kernel = name.to_string();
        self
    }

    pub fn metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Radial kernel on the p-norm
    pub fn norm(self, p: f64) -> Self {
        self.metric(Metric::Radial { p })
    }

    /// Backend name (see [`BACKEND_REGISTRY`])
    pub fn backend(mut self, name: &str) -> Self {
        self.backend = name.to_string();
        self
    }

    pub fn bandwidth(mut self, bandwidth: impl Into<Bandwidth>) -> Self {
        self.bandwidth = Some(bandwidth.into());
        self
    }

    /// Selection method name: `silverman`, `scott` or `isj`
    pub fn bandwidth_method(mut self, name: &str) -> Self {
        self.method = Some(name.to_string());
        self
    }

    pub fn grid_points(mut self, points: usize) -> Self {
        self.grid_points = Some(points);
        self
    }

    pub fn grid(mut self, grid: GridSpec) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn truncation_eps(mut self, eps: f64) -> Self {
        self.truncation_eps = eps;
        self
    }

    pub fn reflect(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.boundary = BoundaryCorrection::Reflect { lower, upper };
        self
    }

    /// Validate the settings and create the estimator
    ///
    /// # Errors
    ///
    /// - [`KdeError::InvalidKernel`] / [`KdeError::InvalidBackend`] for unknown identifiers
    /// - [`KdeError::InvalidInput`] for unknown bandwidth methods, conflicting bandwidth
    ///   settings, invalid bandwidths, grids, metrics or bounds
    pub fn build(self) -> Result<KernelDensity<D>> {
        let mut kernel = Kernel::from_name(&self.kernel)?;
        if let Some(metric) = self.metric {
            kernel = kernel.with_metric(metric)?;
        }
        let backend = Backend::from_name(&self.backend)?;
        let bandwidth = match (self.bandwidth, self.method) {
            (Some(_), Some(_)) => {
                return Err(KdeError::InvalidInput(
                    "set either a fixed bandwidth or a selection method, not both".to_string(),
                ));
            }
            (Some(bandwidth), None) => BandwidthSpec::Fixed(bandwidth),
            (None, Some(name)) => BandwidthSpec::Method(BandwidthMethod::from_name(&name)?),
            (None, None) => BandwidthSpec::default(),
        };
        KernelDensity::with_config(KdeConfig {
            kernel,
            metric: self.metric,
            backend,
            bandwidth,
            grid_points: self.grid_points,
            grid: self.grid,
            truncation_eps: self.truncation_eps,
            boundary: self.boundary,
        })
    }
}
