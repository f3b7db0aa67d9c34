// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normal-reference rules of thumb.
//!
//! Both rules scale a per-axis spread estimate by `n^(-1/(D+4))`, with `n` the effective
//! sample size of the weights, and by the kernel factor
//!
//! c_K = (R(K) / R(φ))^(1/5)
//!
//! which converts a Gaussian-optimal width into the equivalent width for kernel `K`
//! (roughness `R`), all kernels being standardized to unit variance.

use crate::error::{KdeError, Result};
use crate::estimators::approaches::common_nd::dataset::SampleSet;
use crate::estimators::approaches::kernel::{Bandwidth, Kernel, KernelFamily};
use crate::estimators::utils::stats::{weighted_iqr, weighted_mean_variance};

/// Ratio between the interquartile range and the standard deviation of a normal
const NORMAL_IQR: f64 = 1.349;

const SILVERMAN_FACTOR: f64 = 0.9;
const SCOTT_FACTOR: f64 = 1.059;

/// Silverman's rule: `0.9 · min(σ_j, IQR_j / 1.349) · n^(-1/(D+4)) · c_K`
///
/// Axes with a zero interquartile range fall back to the standard deviation.
pub fn silverman<const D: usize>(samples: &SampleSet<D>, kernel: &Kernel) -> Result<Bandwidth> {
    rule_of_thumb(samples, kernel, |values, weights, sigma| {
        let iqr = weighted_iqr(values, weights) / NORMAL_IQR;
        let spread = if iqr > 0.0 { sigma.min(iqr) } else { sigma };
        SILVERMAN_FACTOR * spread
    })
}

/// Scott's rule: `1.059 · σ_j · n^(-1/(D+4)) · c_K`
pub fn scott<const D: usize>(samples: &SampleSet<D>, kernel: &Kernel) -> Result<Bandwidth> {
    rule_of_thumb(samples, kernel, |_, _, sigma| SCOTT_FACTOR * sigma)
}

/// Kernel-dependent multiplier relative to the Gaussian
pub fn kernel_factor(kernel: &Kernel) -> f64 {
    (kernel.roughness() / KernelFamily::Gaussian.roughness()).powf(0.2)
}

fn rule_of_thumb<const D: usize, F>(samples: &SampleSet<D>, kernel: &Kernel, spread: F) -> Result<Bandwidth>
where
    F: Fn(&[f64], &[f64], f64) -> f64,
{
    let n_eff = samples.effective_size();
    if samples.len() < 2 || n_eff < 2.0 - 1e-9 {
        return Err(KdeError::InsufficientData {
            expected: 2,
            actual: n_eff.floor() as usize,
        });
    }
    let weights = samples.weights.to_vec();
    let scale = n_eff.powf(-1.0 / (D as f64 + 4.0)) * kernel_factor(kernel);

    let mut widths = Vec::with_capacity(D);
    for axis in 0..D {
        let values = samples.axis(axis);
        let (_, variance) = weighted_mean_variance(&values, &weights);
        let sigma = variance.sqrt();
        if !(sigma > 0.0) || !sigma.is_finite() {
            return Err(KdeError::InsufficientData {
                expected: 2,
                actual: 1,
            });
        }
        widths.push(spread(&values, &weights, sigma) * scale);
    }

    Ok(if D == 1 {
        Bandwidth::Scalar(widths[0])
    } else {
        Bandwidth::PerDimension(widths)
    })
}
