// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use ndarray::{Array1, Array2, ArrayView2};

use crate::error::{KdeError, Result};

/// Input data representation for samples and query points
///
/// Accepts both 1D and 2D arrays so callers can pass univariate data without reshaping.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    /// One-dimensional data: each element is a point
    OneDimensional(Array1<f64>),

    /// Two-dimensional data: rows are points, columns are dimensions
    TwoDimensional(Array2<f64>),
}

impl From<Array1<f64>> for SampleData {
    fn from(array: Array1<f64>) -> Self {
        SampleData::OneDimensional(array)
    }
}

impl From<Array2<f64>> for SampleData {
    fn from(array: Array2<f64>) -> Self {
        SampleData::TwoDimensional(array)
    }
}

impl From<Vec<f64>> for SampleData {
    fn from(values: Vec<f64>) -> Self {
        SampleData::OneDimensional(Array1::from(values))
    }
}

impl SampleData {
    /// Number of points
    pub fn len(&self) -> usize {
        match self {
            SampleData::OneDimensional(a) => a.len(),
            SampleData::TwoDimensional(a) => a.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of columns (1 for one-dimensional data)
    pub fn ncols(&self) -> usize {
        match self {
            SampleData::OneDimensional(_) => 1,
            SampleData::TwoDimensional(a) => a.ncols(),
        }
    }

    /// Convert into fixed-size points, rejecting dimension mismatches and NaN/Inf
    pub fn to_points<const K: usize>(&self, context: &str) -> Result<Vec<[f64; K]>> {
        if self.ncols() != K {
            return Err(KdeError::size_mismatch(K, self.ncols(), context));
        }
        let points: Vec<[f64; K]> = match self {
            SampleData::OneDimensional(arr) => arr
                .iter()
                .map(|&v| {
                    let mut p = [0.0; K];
                    p[0] = v;
                    p
                })
                .collect(),
            SampleData::TwoDimensional(arr) => rows_to_points(arr.view()),
        };
        if points.iter().flatten().any(|v: &f64| !v.is_finite()) {
            return Err(KdeError::non_finite(context));
        }
        Ok(points)
    }
}

fn rows_to_points<const K: usize>(data: ArrayView2<'_, f64>) -> Vec<[f64; K]> {
    let n = data.nrows();
    let mut points: Vec<[f64; K]> = Vec::with_capacity(n);
    if let Some(slice) = data.as_slice() {
        for chunk in slice.chunks_exact(K) {
            let mut p = [0.0; K];
            p.copy_from_slice(chunk);
            points.push(p);
        }
    } else {
        for r in 0..n {
            let mut p = [0.0; K];
            for (c, slot) in p.iter_mut().enumerate() {
                *slot = data[(r, c)];
            }
            points.push(p);
        }
    }
    points
}

/// Validated, weighted sample set of fixed dimension `K`
///
/// Weights are normalized to sum to one on construction. Reflected copies produced for
/// boundary correction keep the weights of their originals, so the total may exceed one.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet<const K: usize> {
    pub points: Vec<[f64; K]>,
    pub weights: Array1<f64>,
    pub n: usize,
}

impl<const K: usize> SampleSet<K> {
    /// Build a sample set from raw data and optional non-negative weights
    ///
    /// # Errors
    ///
    /// - [`KdeError::InsufficientData`] for zero samples
    /// - [`KdeError::InvalidInput`] for `K == 0`, column mismatches, NaN/Inf values, weights
    ///   of the wrong length, negative or non-finite weights, or weights summing to zero
    pub fn new(data: impl Into<SampleData>, weights: Option<Array1<f64>>) -> Result<Self> {
        let data = data.into();
        if K == 0 {
            return Err(KdeError::InvalidInput(
                "dimension must be at least 1".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(KdeError::empty_input());
        }
        let points = data.to_points::<K>("samples")?;
        Self::from_points(points, weights)
    }

    pub fn from_points(points: Vec<[f64; K]>, weights: Option<Array1<f64>>) -> Result<Self> {
        let n = points.len();
        if n == 0 {
            return Err(KdeError::empty_input());
        }
        if points.iter().flatten().any(|v| !v.is_finite()) {
            return Err(KdeError::non_finite("samples"));
        }
        let weights = match weights {
            None => Array1::from_elem(n, 1.0 / n as f64),
            Some(w) => {
                if w.len() != n {
                    return Err(KdeError::size_mismatch(n, w.len(), "weights"));
                }
                if w.iter().any(|v| !v.is_finite()) {
                    return Err(KdeError::non_finite("weights"));
                }
                if w.iter().any(|&v| v < 0.0) {
                    return Err(KdeError::InvalidInput(
                        "weights must be non-negative".to_string(),
                    ));
                }
                let total = w.sum();
                if total <= 0.0 {
                    return Err(KdeError::InvalidInput(
                        "weights must not all be zero".to_string(),
                    ));
                }
                w / total
            }
        };
        Ok(Self { points, weights, n })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn dim(&self) -> usize {
        K
    }

    /// Return a view of the samples as a 2D array (samples x dimensions)
    pub fn view(&self) -> ArrayView2<'_, f64> {
        ArrayView2::from_shape((self.n, K), self.points.as_flattened())
            .unwrap_or_else(|_| unreachable!("points are stored contiguously"))
    }

    /// Values of one coordinate
    pub fn axis(&self, axis: usize) -> Vec<f64> {
        self.points.iter().map(|p| p[axis]).collect()
    }

    /// Per-axis minimum and maximum
    pub fn bounds(&self) -> ([f64; K], [f64; K]) {
        let mut lower = [f64::INFINITY; K];
        let mut upper = [f64::NEG_INFINITY; K];
        for p in &self.points {
            for j in 0..K {
                lower[j] = lower[j].min(p[j]);
                upper[j] = upper[j].max(p[j]);
            }
        }
        (lower, upper)
    }

    /// Kish effective sample size `1 / Σ w_i²` (equals `n` for uniform weights)
    pub fn effective_size(&self) -> f64 {
        let total = self.weights.sum();
        total * total / self.weights.iter().map(|w| w * w).sum::<f64>()
    }

    /// Mirror samples across every finite bound
    ///
    /// Returns the augmented set and, for every augmented sample, the index of the sample it
    /// was copied from and the axes it was mirrored across. Infinite bounds leave that side
    /// unreflected.
    pub(crate) fn reflected(
        &self,
        lower: &[f64; K],
        upper: &[f64; K],
    ) -> Result<(Self, Vec<usize>, Vec<[bool; K]>)> {
        for p in &self.points {
            for j in 0..K {
                if p[j] < lower[j] || p[j] > upper[j] {
                    return Err(KdeError::InvalidInput(format!(
                        "sample coordinate {} lies outside the reflection bounds [{}, {}]",
                        p[j], lower[j], upper[j]
                    )));
                }
            }
        }

        let mut points = Vec::new();
        let mut weights = Vec::new();
        let mut origin = Vec::new();
        let mut flips = Vec::new();
        for (i, p) in self.points.iter().enumerate() {
            let mut images = vec![(*p, [false; K])];
            for j in 0..K {
                let mut mirrored = Vec::with_capacity(images.len() * 2);
                for (image, axes) in &images {
                    for bound in [lower[j], upper[j]] {
                        if bound.is_finite() {
                            let (mut m, mut a) = (*image, *axes);
                            m[j] = 2.0 * bound - p[j];
                            a[j] = true;
                            mirrored.push((m, a));
                        }
                    }
                }
                images.extend(mirrored);
            }
            for (image, axes) in images {
                points.push(image);
                weights.push(self.weights[i]);
                origin.push(i);
                flips.push(axes);
            }
        }
        let n = points.len();
        Ok((
            Self {
                points,
                weights: Array1::from(weights),
                n,
            },
            origin,
            flips,
        ))
    }
}
