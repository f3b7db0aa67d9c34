// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Kernel Library
//!
//! This module provides the smoothing kernels used by every density backend. All kernels are
//! symmetric, non-negative and standardized so that their one-dimensional variance is one;
//! a bandwidth of `h` therefore always means "kernel standard deviation `h`", whichever
//! family is selected.
//!
//! ## Theoretical Background
//!
//! A kernel is described by a radial profile `f(r)` on the scaled distance `r ≥ 0`.
//! Finite-support families are written as a canonical profile `f_c(t)` on `[0, 1]`, stretched
//! to the standardized support radius `R`:
//!
//! f(r) = f_c(r / R)  for r ≤ R,   0 otherwise
//!
//! The boundary is closed: a point at exactly `r = R` receives `f_c(1)` (non-zero for the box
//! kernel, zero for every other finite family).
//!
//! ## Multivariate Combination
//!
//! The profile is lifted to `D` dimensions by a [`Metric`]:
//!
//! - [`Metric::Product`]: `K(z) = ∏_j f(|z_j|)`
//! - [`Metric::Radial`]: `K(z) = f(‖z‖_p)` for a p-norm with `p ≥ 1` (including `p = ∞`)
//!
//! ## Normalization
//!
//! Normalization constants are closed-form. With the canonical radial moments
//! `M_D = ∫₀¹ f_c(t) t^(D-1) dt` and the volume of the unit p-ball
//! `V_{D,p} = (2 Γ(1/p + 1))^D / Γ(D/p + 1)`:
//!
//! - Product metric: `c = (2 R M_1)^D`
//! - Radial metric:  `c = D · V_{D,p} · R^D · M_D`
//!
//! The Gaussian and exponential families use their analytic radial integrals instead.
//!
//! ## Supported Kernel Families
//!
//! | Family       | Aliases            | Support radius       |
//! |--------------|--------------------|----------------------|
//! | gaussian     | normal             | ∞                    |
//! | exponential  | laplace            | ∞                    |
//! | box          | uniform, tophat    | √3                   |
//! | triangular   | tri                | √6                   |
//! | epanechnikov | epa                | √5                   |
//! | biweight     | quartic            | √7                   |
//! | triweight    |                    | 3                    |
//! | tricube      |                    | √(243/35)            |
//! | cosine       |                    | 1/√(1 − 8/π²)        |

use std::f64::consts::{FRAC_PI_2, PI, SQRT_2};

use statrs::function::gamma::gamma;

use crate::error::{KdeError, Result};
use crate::estimators::traits::KernelFunction;

/// Default truncation threshold for infinite-support kernels
pub const DEFAULT_TRUNCATION_EPS: f64 = 1e-12;

/// Kernel family of a smoothing kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelFamily {
    Gaussian,
    Exponential,
    Box,
    Triangular,
    Epanechnikov,
    Biweight,
    Triweight,
    Tricube,
    Cosine,
}

/// Registry of kernel names and aliases, matched case-insensitively
pub const KERNEL_REGISTRY: &[(&str, KernelFamily)] = &[
    ("gaussian", KernelFamily::Gaussian),
    ("normal", KernelFamily::Gaussian),
    ("exponential", KernelFamily::Exponential),
    ("laplace", KernelFamily::Exponential),
    ("box", KernelFamily::Box),
    ("uniform", KernelFamily::Box),
    ("tophat", KernelFamily::Box),
    ("triangular", KernelFamily::Triangular),
    ("tri", KernelFamily::Triangular),
    ("epanechnikov", KernelFamily::Epanechnikov),
    ("epa", KernelFamily::Epanechnikov),
    ("biweight", KernelFamily::Biweight),
    ("quartic", KernelFamily::Biweight),
    ("triweight", KernelFamily::Triweight),
    ("tricube", KernelFamily::Tricube),
    ("cosine", KernelFamily::Cosine),
];

impl KernelFamily {
    /// All families in registry order
    pub const ALL: [KernelFamily; 9] = [
        KernelFamily::Gaussian,
        KernelFamily::Exponential,
        KernelFamily::Box,
        KernelFamily::Triangular,
        KernelFamily::Epanechnikov,
        KernelFamily::Biweight,
        KernelFamily::Triweight,
        KernelFamily::Tricube,
        KernelFamily::Cosine,
    ];

    /// Resolve a kernel name or alias (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns [`KdeError::InvalidKernel`] for names not present in [`KERNEL_REGISTRY`].
    pub fn from_name(name: &str) -> Result<Self> {
        let key = name.trim().to_lowercase();
        KERNEL_REGISTRY
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, family)| *family)
            .ok_or_else(|| KdeError::InvalidKernel(name.to_string()))
    }

    /// Canonical name of the family
    pub fn name(&self) -> &'static str {
        match self {
            KernelFamily::Gaussian => "gaussian",
            KernelFamily::Exponential => "exponential",
            KernelFamily::Box => "box",
            KernelFamily::Triangular => "triangular",
            KernelFamily::Epanechnikov => "epanechnikov",
            KernelFamily::Biweight => "biweight",
            KernelFamily::Triweight => "triweight",
            KernelFamily::Tricube => "tricube",
            KernelFamily::Cosine => "cosine",
        }
    }

    /// Standardized support radius (`f64::INFINITY` for infinite-support kernels)
    pub fn support_radius(&self) -> f64 {
        match self {
            KernelFamily::Gaussian | KernelFamily::Exponential => f64::INFINITY,
            KernelFamily::Box => 3.0_f64.sqrt(),
            KernelFamily::Triangular => 6.0_f64.sqrt(),
            KernelFamily::Epanechnikov => 5.0_f64.sqrt(),
            KernelFamily::Biweight => 7.0_f64.sqrt(),
            KernelFamily::Triweight => 3.0,
            KernelFamily::Tricube => (243.0_f64 / 35.0).sqrt(),
            KernelFamily::Cosine => 1.0 / (1.0 - 8.0 / (PI * PI)).sqrt(),
        }
    }

    /// Whether the family vanishes beyond a finite radius
    pub fn has_finite_support(&self) -> bool {
        self.support_radius().is_finite()
    }

    /// Unnormalized radial profile at scaled distance `r`
    #[inline]
    pub fn profile(&self, r: f64) -> f64 {
        let r = r.abs();
        match self {
            KernelFamily::Gaussian => (-0.5 * r * r).exp(),
            KernelFamily::Exponential => (-SQRT_2 * r).exp(),
            _ => {
                let radius = self.support_radius();
                if r <= radius {
                    self.canonical_profile(r / radius)
                } else {
                    0.0
                }
            }
        }
    }

    /// Canonical profile on `t ∈ [0, 1]` for finite-support families
    #[inline]
    fn canonical_profile(&self, t: f64) -> f64 {
        match self {
            KernelFamily::Box => 1.0,
            KernelFamily::Triangular => 1.0 - t,
            KernelFamily::Epanechnikov => 1.0 - t * t,
            KernelFamily::Biweight => {
                let u = 1.0 - t * t;
                u * u
            }
            KernelFamily::Triweight => {
                let u = 1.0 - t * t;
                u * u * u
            }
            KernelFamily::Tricube => {
                let u = 1.0 - t * t * t;
                u * u * u
            }
            KernelFamily::Cosine => (FRAC_PI_2 * t).cos(),
            KernelFamily::Gaussian | KernelFamily::Exponential => 0.0,
        }
    }

    /// Canonical radial moment `M_D = ∫₀¹ f_c(t) t^(D-1) dt`
    fn canonical_radial_moment(&self, dim: usize) -> f64 {
        let d = dim as f64;
        match self {
            KernelFamily::Box => 1.0 / d,
            KernelFamily::Triangular => 1.0 / (d * (d + 1.0)),
            KernelFamily::Epanechnikov => 2.0 / (d * (d + 2.0)),
            KernelFamily::Biweight => 1.0 / d - 2.0 / (d + 2.0) + 1.0 / (d + 4.0),
            KernelFamily::Triweight => {
                1.0 / d - 3.0 / (d + 2.0) + 3.0 / (d + 4.0) - 1.0 / (d + 6.0)
            }
            KernelFamily::Tricube => {
                1.0 / d - 3.0 / (d + 3.0) + 3.0 / (d + 6.0) - 1.0 / (d + 9.0)
            }
            KernelFamily::Cosine => cosine_moment(dim),
            KernelFamily::Gaussian | KernelFamily::Exponential => f64::NAN,
        }
    }

    /// `∫₀^∞ f(r) r^(D-1) dr` for the standardized profile
    fn radial_integral(&self, dim: usize) -> f64 {
        let d = dim as f64;
        match self {
            KernelFamily::Gaussian => 2.0_f64.powf(d / 2.0 - 1.0) * gamma(d / 2.0),
            KernelFamily::Exponential => gamma(d) / SQRT_2.powi(dim as i32),
            _ => self.support_radius().powi(dim as i32) * self.canonical_radial_moment(dim),
        }
    }

    /// `∫ f(|u|) du` over the real line
    fn line_integral(&self) -> f64 {
        2.0 * self.radial_integral(1)
    }

    /// Roughness `∫ K(u)² du` of the normalized, standardized one-dimensional kernel
    pub fn roughness(&self) -> f64 {
        let canonical = match self {
            KernelFamily::Gaussian => return 1.0 / (2.0 * PI.sqrt()),
            KernelFamily::Exponential => return SQRT_2 / 4.0,
            KernelFamily::Box => 0.5,
            KernelFamily::Triangular => 2.0 / 3.0,
            KernelFamily::Epanechnikov => 0.6,
            KernelFamily::Biweight => 5.0 / 7.0,
            KernelFamily::Triweight => 350.0 / 429.0,
            KernelFamily::Tricube => 175.0 / 247.0,
            KernelFamily::Cosine => PI * PI / 16.0,
        };
        canonical / self.support_radius()
    }

    /// Radius beyond which the standardized profile is below `eps`
    ///
    /// Finite families return their support radius regardless of `eps`.
    pub fn effective_radius(&self, eps: f64) -> Result<f64> {
        if self.has_finite_support() {
            return Ok(self.support_radius());
        }
        if !(eps > 0.0 && eps < 1.0) {
            return Err(KdeError::InvalidInput(format!(
                "truncation threshold must lie in (0, 1), got {eps}"
            )));
        }
        Ok(match self {
            KernelFamily::Gaussian => (-2.0 * eps.ln()).sqrt(),
            _ => -eps.ln() / SQRT_2,
        })
    }

    /// Metric used when none is requested explicitly
    pub fn default_metric(&self) -> Metric {
        match self {
            KernelFamily::Gaussian => Metric::EUCLIDEAN,
            _ => Metric::Product,
        }
    }
}

/// `∫₀¹ cos(πt/2) t^(D-1) dt` via the sine/cosine moment recursion
fn cosine_moment(dim: usize) -> f64 {
    let a = FRAC_PI_2;
    let (sin_a, cos_a) = a.sin_cos();
    // i_n = ∫₀¹ t^n cos(a t) dt, j_n = ∫₀¹ t^n sin(a t) dt
    let mut i_n = sin_a / a;
    let mut j_n = (1.0 - cos_a) / a;
    for n in 1..dim {
        let k = n as f64;
        let i_next = sin_a / a - (k / a) * j_n;
        let j_next = -cos_a / a + (k / a) * i_n;
        i_n = i_next;
        j_n = j_next;
    }
    i_n
}

/// Combination rule of per-axis scaled distances
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    /// Product of one-dimensional profiles
    Product,
    /// Profile of the p-norm of the scaled offset (`p = f64::INFINITY` allowed)
    Radial { p: f64 },
}

impl Metric {
    pub const EUCLIDEAN: Metric = Metric::Radial { p: 2.0 };

    /// Radial metric for a p-norm
    ///
    /// # Errors
    ///
    /// Returns [`KdeError::InvalidInput`] unless `p ≥ 1` (or `p = ∞`).
    pub fn radial(p: f64) -> Result<Self> {
        let metric = Metric::Radial { p };
        metric.validate()?;
        Ok(metric)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Metric::Product => Ok(()),
            Metric::Radial { p } if *p >= 1.0 => Ok(()),
            Metric::Radial { p } => Err(KdeError::InvalidInput(format!(
                "norm order p must be at least 1, got {p}"
            ))),
        }
    }

    /// p-norm of a scaled offset
    #[inline]
    fn norm<const D: usize>(p: f64, z: &[f64; D]) -> f64 {
        if p == 2.0 {
            z.iter().map(|v| v * v).sum::<f64>().sqrt()
        } else if p == 1.0 {
            z.iter().map(|v| v.abs()).sum()
        } else if p.is_infinite() {
            z.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
        } else {
            z.iter().map(|v| v.abs().powf(p)).sum::<f64>().powf(1.0 / p)
        }
    }

    /// Volume of the unit p-ball in `dim` dimensions
    fn unit_ball_volume(p: f64, dim: usize) -> f64 {
        let d = dim as f64;
        if p.is_infinite() {
            return 2.0_f64.powi(dim as i32);
        }
        (2.0 * gamma(1.0 / p + 1.0)).powi(dim as i32) / gamma(d / p + 1.0)
    }

    /// Bound on `‖z‖₂ / r` over the region where the kernel is non-zero at radius `r`
    ///
    /// Tree searches use Euclidean balls, so the search radius is inflated by this factor.
    pub fn euclidean_factor(&self, dim: usize) -> f64 {
        let d = dim as f64;
        match self {
            Metric::Product => d.sqrt(),
            Metric::Radial { p } if p.is_infinite() => d.sqrt(),
            Metric::Radial { p } if *p > 2.0 => d.powf(0.5 - 1.0 / p),
            Metric::Radial { .. } => 1.0,
        }
    }
}

/// Smoothing kernel: a family and the metric combining dimensions
///
/// # Examples
///
/// ```
/// use kernel_density::estimators::approaches::kernel::{Kernel, KernelFamily};
///
/// let kernel = Kernel::from_name("Epa").unwrap();
/// assert_eq!(kernel.family(), KernelFamily::Epanechnikov);
/// assert_eq!(kernel.evaluate(&[5.0_f64.sqrt()]), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    family: KernelFamily,
    metric: Metric,
}

impl Kernel {
    /// Kernel with the family's default metric
    pub fn new(family: KernelFamily) -> Self {
        Self {
            family,
            metric: family.default_metric(),
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::new(KernelFamily::from_name(name)?))
    }

    pub fn with_metric(self, metric: Metric) -> Result<Self> {
        metric.validate()?;
        Ok(Self { metric, ..self })
    }

    pub fn family(&self) -> KernelFamily {
        self.family
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn name(&self) -> &'static str {
        self.family.name()
    }

    /// Unnormalized weight `K(z)` of a bandwidth-scaled offset
    #[inline]
    pub fn evaluate<const D: usize>(&self, z: &[f64; D]) -> f64 {
        match self.metric {
            Metric::Product => {
                let mut weight = 1.0;
                for &v in z {
                    weight *= self.family.profile(v);
                    if weight == 0.0 {
                        break;
                    }
                }
                weight
            }
            Metric::Radial { p } => self.family.profile(Metric::norm(p, z)),
        }
    }

    /// Normalized kernel density at a scaled offset
    pub fn density<const D: usize>(&self, z: &[f64; D]) -> f64 {
        self.evaluate(z) / self.normalization(D)
    }

    /// Constant `c` such that `∫ K(z) dz = c` over `R^dim`
    pub fn normalization(&self, dim: usize) -> f64 {
        match self.metric {
            Metric::Product => self.family.line_integral().powi(dim as i32),
            Metric::Radial { p } => {
                dim as f64 * Metric::unit_ball_volume(p, dim) * self.family.radial_integral(dim)
            }
        }
    }

    /// Scaled Euclidean radius outside which every weight is below `eps` (or exactly zero)
    pub fn search_radius(&self, dim: usize, eps: f64) -> Result<f64> {
        Ok(self.family.effective_radius(eps)? * self.metric.euclidean_factor(dim))
    }

    pub fn effective_radius(&self, eps: f64) -> Result<f64> {
        self.family.effective_radius(eps)
    }

    pub fn roughness(&self) -> f64 {
        self.family.roughness()
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::new(KernelFamily::Gaussian)
    }
}

impl KernelFunction for Kernel {
    fn weight(&self, scaled_distance: f64) -> f64 {
        self.family.profile(scaled_distance)
    }

    fn support_radius(&self) -> f64 {
        self.family.support_radius()
    }

    fn normalization(&self, dim: usize) -> f64 {
        Kernel::normalization(self, dim)
    }
}
