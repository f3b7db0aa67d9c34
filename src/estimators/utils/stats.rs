// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weighted summary statistics used by the rule-of-thumb selectors.

/// Weighted mean and unbiased (reliability-weighted) variance
///
/// With normalized weights `w`, the variance is `Σ w (x − μ)² / (1 − Σ w²)`, which reduces to
/// the usual `n − 1` estimator for uniform weights. Returns a variance of zero when the
/// effective sample size is one.
pub fn weighted_mean_variance(values: &[f64], weights: &[f64]) -> (f64, f64) {
    let total: f64 = weights.iter().sum();
    if values.is_empty() || total <= 0.0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = values
        .iter()
        .zip(weights)
        .map(|(x, w)| x * w)
        .sum::<f64>()
        / total;
    let mut squares = 0.0;
    let mut w2 = 0.0;
    for (x, w) in values.iter().zip(weights) {
        let wn = w / total;
        squares += wn * (x - mean) * (x - mean);
        w2 += wn * wn;
    }
    let denom = 1.0 - w2;
    let variance = if denom > 0.0 { squares / denom } else { 0.0 };
    (mean, variance)
}

/// Weighted quantile with Hazen plotting positions
///
/// Sample `k` in sorted order sits at cumulative position `C_k − w_k / 2`; the quantile is
/// interpolated linearly between neighbouring positions and clamped to the extremes.
pub fn weighted_quantile(values: &[f64], weights: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut pairs: Vec<(f64, f64)> = values
        .iter()
        .cloned()
        .zip(weights.iter().cloned())
        .filter(|(_, w)| *w > 0.0)
        .collect();
    if pairs.is_empty() {
        return f64::NAN;
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let total: f64 = pairs.iter().map(|(_, w)| w).sum();

    let mut positions = Vec::with_capacity(pairs.len());
    let mut cumulative = 0.0;
    for (_, w) in &pairs {
        cumulative += w;
        positions.push((cumulative - 0.5 * w) / total);
    }

    let last = pairs.len() - 1;
    if q <= positions[0] {
        return pairs[0].0;
    }
    if q >= positions[last] {
        return pairs[last].0;
    }
    let k = positions.partition_point(|&p| p <= q);
    let (p0, p1) = (positions[k - 1], positions[k]);
    let (x0, x1) = (pairs[k - 1].0, pairs[k].0);
    if p1 <= p0 {
        return x1;
    }
    x0 + (q - p0) / (p1 - p0) * (x1 - x0)
}

/// Weighted interquartile range
pub fn weighted_iqr(values: &[f64], weights: &[f64]) -> f64 {
    weighted_quantile(values, weights, 0.75) - weighted_quantile(values, weights, 0.25)
}
