// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Bandwidths
//!
//! A [`Bandwidth`] is what the caller supplies or a selector returns. Before evaluation it is
//! resolved against the dimension `D` into a [`ScaledBandwidth`], which maps a raw offset
//! `q − x_i` to the scaled offset `z` fed to the kernel:
//!
//! - `Scalar(h)`: `z = (q − x_i) / h`, `|H|^(-1) = h^(-D)`
//! - `PerDimension(h)`: `z_j = (q_j − x_ij) / h_j`
//! - `Matrix(Σ)`: `z = L⁻¹ (q − x_i)` with `Σ = L Lᵀ`, `|H|^(-1) = 1 / ∏ L_jj`
//! - `PerSample(h)`: `z = (q − x_i) / h_i`, `|H_i|^(-1) = h_i^(-D)`
//!
//! The matrix form is a covariance: its Cholesky factor plays the role of `h`, so
//! `Matrix(h² I)` behaves exactly like `Scalar(h)`. A sample mirrored across axis `j` uses
//! `S Σ S` with `S = diag(±1)`, which equals evaluating `Σ` on the offset with axis `j`
//! negated, since every kernel is symmetric in each coordinate.

use nalgebra::DMatrix;
use ndarray::Array2;

use crate::error::{KdeError, Result};
use crate::estimators::approaches::kernel::Kernel;

/// Relative tolerance for the symmetry check of matrix bandwidths
const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// Caller-facing bandwidth specification
#[derive(Debug, Clone, PartialEq)]
pub enum Bandwidth {
    /// One positive width shared by every dimension
    Scalar(f64),
    /// One positive width per dimension
    PerDimension(Vec<f64>),
    /// Symmetric positive-definite `D × D` covariance
    Matrix(Array2<f64>),
    /// One positive width per sample (variable-bandwidth KDE)
    PerSample(Vec<f64>),
}

impl From<f64> for Bandwidth {
    fn from(h: f64) -> Self {
        Bandwidth::Scalar(h)
    }
}

impl From<Vec<f64>> for Bandwidth {
    fn from(h: Vec<f64>) -> Self {
        Bandwidth::PerDimension(h)
    }
}

impl From<Array2<f64>> for Bandwidth {
    fn from(h: Array2<f64>) -> Self {
        Bandwidth::Matrix(h)
    }
}

impl Bandwidth {
    /// The scalar width, if this is a scalar bandwidth
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Bandwidth::Scalar(h) => Some(*h),
            _ => None,
        }
    }

    pub fn is_per_sample(&self) -> bool {
        matches!(self, Bandwidth::PerSample(_))
    }

    /// Resolve against dimension `D` and `n_samples` samples
    ///
    /// # Errors
    ///
    /// Returns [`KdeError::InvalidInput`] for non-positive or non-finite widths, length
    /// mismatches, and matrices that are not symmetric positive-definite.
    pub fn resolve<const D: usize>(&self, n_samples: usize) -> Result<ScaledBandwidth<D>> {
        let scale = match self {
            Bandwidth::Scalar(h) => {
                check_width(*h, "bandwidth")?;
                Scale::Isotropic(*h)
            }
            Bandwidth::PerDimension(h) => {
                if h.len() != D {
                    return Err(KdeError::size_mismatch(D, h.len(), "per-dimension bandwidth"));
                }
                let mut widths = [0.0; D];
                for (slot, &value) in widths.iter_mut().zip(h) {
                    check_width(value, "per-dimension bandwidth")?;
                    *slot = value;
                }
                Scale::Diagonal(widths)
            }
            Bandwidth::Matrix(m) => cholesky_scale(m)?,
            Bandwidth::PerSample(h) => {
                if h.len() != n_samples {
                    return Err(KdeError::size_mismatch(
                        n_samples,
                        h.len(),
                        "per-sample bandwidth",
                    ));
                }
                for &value in h {
                    check_width(value, "per-sample bandwidth")?;
                }
                Scale::PerSample(h.clone())
            }
        };
        Ok(ScaledBandwidth::new(scale))
    }
}

fn check_width(h: f64, context: &str) -> Result<()> {
    if h.is_finite() && h > 0.0 {
        Ok(())
    } else {
        Err(KdeError::InvalidInput(format!(
            "{context} must be positive and finite, got {h}"
        )))
    }
}

fn cholesky_scale<const D: usize>(m: &Array2<f64>) -> Result<Scale<D>> {
    if m.dim() != (D, D) {
        return Err(KdeError::InvalidInput(format!(
            "bandwidth matrix must be {D}x{D}, got {}x{}",
            m.nrows(),
            m.ncols()
        )));
    }
    if m.iter().any(|v| !v.is_finite()) {
        return Err(KdeError::non_finite("bandwidth matrix"));
    }
    for i in 0..D {
        for j in (i + 1)..D {
            let (a, b) = (m[[i, j]], m[[j, i]]);
            if (a - b).abs() > SYMMETRY_TOLERANCE * a.abs().max(b.abs()).max(1.0) {
                return Err(KdeError::InvalidInput(
                    "bandwidth matrix must be symmetric".to_string(),
                ));
            }
        }
    }

    let dense = DMatrix::<f64>::from_fn(D, D, |i, j| m[[i, j]]);
    let spectral = dense.symmetric_eigenvalues().max();
    let cholesky = dense.cholesky().ok_or_else(|| {
        KdeError::InvalidInput("bandwidth matrix must be positive-definite".to_string())
    })?;
    let l = cholesky.l();

    let mut factor = [[0.0; D]; D];
    for (i, row) in factor.iter_mut().enumerate() {
        for (j, slot) in row.iter_mut().enumerate().take(i + 1) {
            *slot = l[(i, j)];
        }
    }
    if factor.iter().enumerate().any(|(i, row)| row[i] <= 0.0) {
        return Err(KdeError::InvalidInput(
            "bandwidth matrix must be positive-definite".to_string(),
        ));
    }
    Ok(Scale::Cholesky {
        factor,
        stretch: spectral.sqrt(),
        mirrors: Vec::new(),
    })
}

#[derive(Debug, Clone, PartialEq)]
enum Scale<const D: usize> {
    Isotropic(f64),
    Diagonal([f64; D]),
    Cholesky {
        factor: [[f64; D]; D],
        stretch: f64,
        /// Axes each sample is mirrored across; empty when no sample is mirrored
        mirrors: Vec<[bool; D]>,
    },
    PerSample(Vec<f64>),
}

/// Bandwidth resolved for dimension `D`
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledBandwidth<const D: usize> {
    scale: Scale<D>,
    /// `|H|^(-1)`; unused for per-sample widths
    inverse_determinant: f64,
    /// Largest stretch `σ_max(H)` over all samples
    max_stretch: f64,
}

impl<const D: usize> ScaledBandwidth<D> {
    fn new(scale: Scale<D>) -> Self {
        let (inverse_determinant, max_stretch) = match &scale {
            Scale::Isotropic(h) => (h.powi(D as i32).recip(), *h),
            Scale::Diagonal(h) => (
                h.iter().product::<f64>().recip(),
                h.iter().cloned().fold(0.0, f64::max),
            ),
            Scale::Cholesky { factor, stretch, .. } => (
                (0..D).map(|i| factor[i][i]).product::<f64>().recip(),
                *stretch,
            ),
            Scale::PerSample(h) => (f64::NAN, h.iter().cloned().fold(0.0, f64::max)),
        };
        Self {
            scale,
            inverse_determinant,
            max_stretch,
        }
    }

    pub fn is_per_sample(&self) -> bool {
        matches!(self.scale, Scale::PerSample(_))
    }

    /// Scaled offset for `diff = q − x_sample`
    #[inline]
    pub fn scale(&self, sample: usize, diff: &[f64; D]) -> [f64; D] {
        let mut z = [0.0; D];
        match &self.scale {
            Scale::Isotropic(h) => {
                for (zj, dj) in z.iter_mut().zip(diff) {
                    *zj = dj / h;
                }
            }
            Scale::Diagonal(h) => {
                for j in 0..D {
                    z[j] = diff[j] / h[j];
                }
            }
            Scale::Cholesky { factor, mirrors, .. } => {
                let mut diff = *diff;
                if let Some(axes) = mirrors.get(sample) {
                    for (dj, &flip) in diff.iter_mut().zip(axes) {
                        if flip {
                            *dj = -*dj;
                        }
                    }
                }
                // forward substitution L z = diff
                for i in 0..D {
                    let mut acc = diff[i];
                    for k in 0..i {
                        acc -= factor[i][k] * z[k];
                    }
                    z[i] = acc / factor[i][i];
                }
            }
            Scale::PerSample(h) => {
                let h = h[sample];
                for (zj, dj) in z.iter_mut().zip(diff) {
                    *zj = dj / h;
                }
            }
        }
        z
    }

    /// `|H_sample|^(-1)`
    #[inline]
    pub fn inverse_determinant(&self, sample: usize) -> f64 {
        match &self.scale {
            Scale::PerSample(h) => h[sample].powi(D as i32).recip(),
            _ => self.inverse_determinant,
        }
    }

    /// Largest factor by which `H` stretches a unit vector
    pub fn max_stretch(&self) -> f64 {
        self.max_stretch
    }

    /// Largest `|v_j|` over offsets `v = H z` with `‖z‖₂ ≤ rho`
    pub fn axis_reach(&self, axis: usize, rho: f64) -> f64 {
        match &self.scale {
            Scale::Isotropic(h) => h * rho,
            Scale::Diagonal(h) => h[axis] * rho,
            Scale::Cholesky { factor, .. } => {
                factor[axis].iter().map(|v| v * v).sum::<f64>().sqrt() * rho
            }
            Scale::PerSample(_) => self.max_stretch * rho,
        }
    }

    /// Per-axis reach for every axis
    pub fn reach(&self, rho: f64) -> [f64; D] {
        std::array::from_fn(|axis| self.axis_reach(axis, rho))
    }

    /// Bandwidth-weighted kernel contribution of one sample at a query point
    #[inline]
    pub fn contribution(&self, kernel: &Kernel, sample: usize, query: &[f64; D], point: &[f64; D]) -> f64 {
        let mut diff = [0.0; D];
        for j in 0..D {
            diff[j] = query[j] - point[j];
        }
        let weight = kernel.evaluate(&self.scale(sample, &diff));
        if weight == 0.0 {
            0.0
        } else {
            weight * self.inverse_determinant(sample)
        }
    }

    /// Axes the given sample's kernel is mirrored across, if any
    pub fn mirrored_axes(&self, sample: usize) -> Option<[bool; D]> {
        match &self.scale {
            Scale::Cholesky { mirrors, .. } => mirrors.get(sample).copied(),
            _ => None,
        }
    }

    /// Bandwidth for reflected copies: `origin` is the sample index each copy came from and
    /// `flips` the axes it was mirrored across
    pub(crate) fn replicate(&self, origin: &[usize], flips: &[[bool; D]]) -> Self {
        match &self.scale {
            Scale::PerSample(h) => Self::new(Scale::PerSample(origin.iter().map(|&i| h[i]).collect())),
            Scale::Cholesky { factor, stretch, .. } => Self::new(Scale::Cholesky {
                factor: *factor,
                stretch: *stretch,
                mirrors: flips.to_vec(),
            }),
            _ => self.clone(),
        }
    }
}
