// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # kernel-density
//!
//! Non-parametric density estimation from weighted samples in one or more dimensions, with
//! interchangeable backends sharing one kernel library and automatic bandwidth selection.
//!
//! ## Quick Start
//!
//! ```rust
//! use kernel_density::KernelDensity;
//! use ndarray::array;
//!
//! // Gaussian kernel, KD-tree backend, Silverman bandwidth
//! let fitted = KernelDensity::<1>::new()
//!     .fit(array![-1.2, -0.4, 0.1, 0.3, 1.7], None)
//!     .unwrap();
//! let at_points = fitted.evaluate_at(array![0.0, 1.0]).unwrap();
//! let on_grid = fitted.evaluate_grid().unwrap();
//! assert_eq!(at_points.len(), 2);
//! assert!((on_grid.grid_integral().unwrap() - 1.0).abs() < 1e-3);
//! ```
//!
//! ## Backends
//!
//! | Backend       | Names                        | Cost           | Result                     |
//! |---------------|------------------------------|----------------|----------------------------|
//! | Direct        | `direct`, `naive`, `exact`   | O(M·N·D)       | exact                      |
//! | Tree          | `tree`, `kdtree`             | sub-quadratic  | exact for finite kernels   |
//! | Convolution   | `convolution`, `fft`, `grid` | O(G log G)     | grid approximation         |
//!
//! ## Kernels
//!
//! Gaussian, exponential, box, triangular, Epanechnikov, biweight, triweight, tricube and
//! cosine, all standardized to unit variance. Finite kernels have a closed support: a sample
//! at exactly the support radius still contributes `f(R)`.
//!
//! ## Bandwidths
//!
//! Scalar, per-dimension, full covariance matrix and per-sample bandwidths, or selection by
//! Silverman's rule, Scott's rule or the improved Sheather-Jones plug-in (1D).
//!
//! ## Feature Flags
//!
//! - `parallel`: data-parallel per-query summation and chunked binning with rayon

pub mod error;
pub mod estimators;

pub use error::{KdeError, Result};
pub use estimators::approaches::{
    Bandwidth, BandwidthMethod, Grid, GridSpec, Kernel, KernelFamily, Metric, SampleData,
};
pub use estimators::{
    Backend, BoundaryCorrection, DensityEstimate, EvaluateOptions, FittedKde, KdeBuilder,
    KdeConfig, KernelDensity,
};
