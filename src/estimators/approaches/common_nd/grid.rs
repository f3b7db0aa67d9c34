// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Regular Grids
//!
//! Axis-aligned evaluation grids with linear binning and multilinear interpolation.
//!
//! A grid with `G_j` nodes on axis `j` spans `[lower_j, upper_j]` inclusive, so the node
//! spacing is `Δ_j = (upper_j − lower_j) / (G_j − 1)`. Node values are stored row-major
//! (last axis fastest).
//!
//! ## Linear Binning
//!
//! Each sample spreads its weight over the `2^D` corners of the cell containing it, each
//! corner receiving the product over axes of the linear (tent) fractions. The total mass on
//! the grid equals the total sample weight exactly, up to rounding.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use ndarray::{Array1, ArrayD, IxDyn};

use crate::error::{KdeError, Result};

/// Queries within this fraction of a spacing from a node read the node value directly
const NODE_SNAP: f64 = 1e-9;

/// Samples per worker chunk when binning in parallel
#[cfg(feature = "parallel")]
const BINNING_CHUNK: usize = 4096;

/// Default evaluation grid size per dimension: `2^floor(10 / D)`, at least 2
pub fn default_evaluation_points(dim: usize) -> usize {
    (1usize << (10 / dim.max(1)).min(30)).max(2)
}

/// Default convolution grid size per dimension: `2^floor(16 / D)`, in `[4, 4096]`
pub fn default_convolution_points(dim: usize) -> usize {
    (1usize << (16 / dim.max(1)).min(30)).clamp(4, 4096)
}

/// Caller-supplied grid description
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub points: Vec<usize>,
}

impl GridSpec {
    /// # Errors
    ///
    /// Returns [`KdeError::InvalidInput`] for mismatched lengths, non-finite or inverted
    /// bounds, or fewer than 2 nodes on an axis.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>, points: Vec<usize>) -> Result<Self> {
        let spec = Self { lower, upper, points };
        spec.validate()?;
        Ok(spec)
    }

    /// Same number of nodes on every axis
    pub fn uniform(lower: Vec<f64>, upper: Vec<f64>, points: usize) -> Result<Self> {
        let dim = lower.len();
        Self::new(lower, upper, vec![points; dim])
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    fn validate(&self) -> Result<()> {
        let dim = self.lower.len();
        if dim == 0 {
            return Err(KdeError::InvalidInput("grid must have at least one axis".to_string()));
        }
        if self.upper.len() != dim {
            return Err(KdeError::size_mismatch(dim, self.upper.len(), "grid upper bounds"));
        }
        if self.points.len() != dim {
            return Err(KdeError::size_mismatch(dim, self.points.len(), "grid node counts"));
        }
        for j in 0..dim {
            let (lo, hi) = (self.lower[j], self.upper[j]);
            if !lo.is_finite() || !hi.is_finite() {
                return Err(KdeError::non_finite("grid bounds"));
            }
            if lo >= hi {
                return Err(KdeError::InvalidInput(format!(
                    "grid axis {j}: lower bound {lo} must be below upper bound {hi}"
                )));
            }
            if self.points[j] < 2 {
                return Err(KdeError::InvalidInput(format!(
                    "grid axis {j} needs at least 2 nodes, got {}",
                    self.points[j]
                )));
            }
        }
        Ok(())
    }
}

/// Regular grid of fixed dimension `D`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid<const D: usize> {
    lower: [f64; D],
    upper: [f64; D],
    spacing: [f64; D],
    shape: [usize; D],
}

impl<const D: usize> Grid<D> {
    pub fn new(lower: [f64; D], upper: [f64; D], shape: [usize; D]) -> Result<Self> {
        GridSpec::new(lower.to_vec(), upper.to_vec(), shape.to_vec())?;
        let spacing = std::array::from_fn(|j| (upper[j] - lower[j]) / (shape[j] - 1) as f64);
        Ok(Self { lower, upper, spacing, shape })
    }

    pub fn from_spec(spec: &GridSpec) -> Result<Self> {
        if spec.dim() != D {
            return Err(KdeError::size_mismatch(D, spec.dim(), "grid dimension"));
        }
        spec.validate()?;
        Self::new(
            std::array::from_fn(|j| spec.lower[j]),
            std::array::from_fn(|j| spec.upper[j]),
            std::array::from_fn(|j| spec.points[j]),
        )
    }

    /// Grid spanning the points extended by `reach_j` on both sides of axis `j`
    pub fn covering<'a, I>(points: I, reach: &[f64; D], nodes_per_axis: usize) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [f64; D]>,
    {
        let mut lower = [f64::INFINITY; D];
        let mut upper = [f64::NEG_INFINITY; D];
        for p in points {
            for j in 0..D {
                lower[j] = lower[j].min(p[j]);
                upper[j] = upper[j].max(p[j]);
            }
        }
        if lower.iter().any(|v| !v.is_finite()) {
            return Err(KdeError::empty_input());
        }
        for j in 0..D {
            let pad = if reach[j] > 0.0 { reach[j] } else { 1.0 };
            lower[j] -= pad;
            upper[j] += pad;
        }
        Self::new(lower, upper, [nodes_per_axis.max(2); D])
    }

    pub fn spec(&self) -> GridSpec {
        GridSpec {
            lower: self.lower.to_vec(),
            upper: self.upper.to_vec(),
            points: self.shape.to_vec(),
        }
    }

    pub fn lower(&self) -> [f64; D] {
        self.lower
    }

    pub fn upper(&self) -> [f64; D] {
        self.upper
    }

    pub fn spacing(&self) -> [f64; D] {
        self.spacing
    }

    pub fn shape(&self) -> [usize; D] {
        self.shape
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cell_volume(&self) -> f64 {
        self.spacing.iter().product()
    }

    /// Coordinate of node `index` on `axis`; the last node sits exactly on the upper bound
    pub fn coordinate(&self, axis: usize, index: usize) -> f64 {
        if index + 1 == self.shape[axis] {
            self.upper[axis]
        } else {
            self.lower[axis] + index as f64 * self.spacing[axis]
        }
    }

    pub fn axis_coordinates(&self, axis: usize) -> Array1<f64> {
        (0..self.shape[axis]).map(|i| self.coordinate(axis, i)).collect()
    }

    fn strides(&self) -> [usize; D] {
        let mut strides = [1; D];
        for j in (0..D.saturating_sub(1)).rev() {
            strides[j] = strides[j + 1] * self.shape[j + 1];
        }
        strides
    }

    /// All nodes in row-major order
    pub fn nodes(&self) -> Vec<[f64; D]> {
        let strides = self.strides();
        (0..self.len())
            .map(|flat| {
                std::array::from_fn(|j| self.coordinate(j, (flat / strides[j]) % self.shape[j]))
            })
            .collect()
    }

    pub fn contains(&self, p: &[f64; D]) -> bool {
        (0..D).all(|j| p[j] >= self.lower[j] && p[j] <= self.upper[j])
    }

    /// Whether the grid extends at least `reach_j` beyond the points on every axis
    pub fn covers<'a, I>(&self, points: I, reach: &[f64; D]) -> bool
    where
        I: IntoIterator<Item = &'a [f64; D]>,
    {
        points.into_iter().all(|p| {
            (0..D).all(|j| p[j] - reach[j] >= self.lower[j] && p[j] + reach[j] <= self.upper[j])
        })
    }

    /// Cell index (clamped to `[0, G − 2]`) and fractional offset inside it
    #[inline]
    fn locate(&self, axis: usize, x: f64) -> (usize, f64) {
        let t = (x - self.lower[axis]) / self.spacing[axis];
        let last_cell = self.shape[axis] - 2;
        let cell = (t.floor().max(0.0) as usize).min(last_cell);
        (cell, (t - cell as f64).clamp(0.0, 1.0))
    }

    /// Spread weighted samples onto the grid nodes
    ///
    /// # Errors
    ///
    /// Returns [`KdeError::InvalidInput`] if a sample lies outside the grid or the number of
    /// weights differs from the number of samples.
    pub fn linear_binning(&self, points: &[[f64; D]], weights: &[f64]) -> Result<ArrayD<f64>> {
        if points.len() != weights.len() {
            return Err(KdeError::size_mismatch(points.len(), weights.len(), "binning weights"));
        }
        if let Some(p) = points.iter().find(|p| !self.contains(p)) {
            return Err(KdeError::InvalidInput(format!(
                "sample {p:?} lies outside the grid [{:?}, {:?}]",
                self.lower, self.upper
            )));
        }

        #[cfg(feature = "parallel")]
        let counts = points
            .par_chunks(BINNING_CHUNK)
            .zip(weights.par_chunks(BINNING_CHUNK))
            .map(|(pts, ws)| self.bin_into(vec![0.0; self.len()], pts, ws))
            .reduce(
                || vec![0.0; self.len()],
                |mut acc, part| {
                    for (a, b) in acc.iter_mut().zip(part) {
                        *a += b;
                    }
                    acc
                },
            );
        #[cfg(not(feature = "parallel"))]
        let counts = self.bin_into(vec![0.0; self.len()], points, weights);

        ArrayD::from_shape_vec(IxDyn(&self.shape), counts)
            .map_err(|e| KdeError::InvalidInput(format!("grid storage: {e}")))
    }

    fn bin_into(&self, mut counts: Vec<f64>, points: &[[f64; D]], weights: &[f64]) -> Vec<f64> {
        let strides = self.strides();
        for (p, &w) in points.iter().zip(weights) {
            if w == 0.0 {
                continue;
            }
            let located: [(usize, f64); D] = std::array::from_fn(|j| self.locate(j, p[j]));
            for corner in 0..(1usize << D) {
                let mut share = w;
                let mut flat = 0;
                for (j, &(cell, frac)) in located.iter().enumerate() {
                    let upper_side = (corner >> j) & 1 == 1;
                    share *= if upper_side { frac } else { 1.0 - frac };
                    flat += (cell + upper_side as usize) * strides[j];
                }
                counts[flat] += share;
            }
        }
        counts
    }

    /// Multilinear interpolation of node values; zero outside the grid
    pub fn interpolate(&self, values: &ArrayD<f64>, q: &[f64; D]) -> f64 {
        if !self.contains(q) {
            return 0.0;
        }
        let data = match values.as_slice() {
            Some(slice) if slice.len() == self.len() => slice,
            _ => return f64::NAN,
        };
        let strides = self.strides();
        let located: [(usize, f64); D] = std::array::from_fn(|j| {
            let (cell, frac) = self.locate(j, q[j]);
            if frac < NODE_SNAP {
                (cell, 0.0)
            } else if frac > 1.0 - NODE_SNAP {
                (cell, 1.0)
            } else {
                (cell, frac)
            }
        });
        let mut value = 0.0;
        for corner in 0..(1usize << D) {
            let mut share = 1.0;
            let mut flat = 0;
            for (j, &(cell, frac)) in located.iter().enumerate() {
                let upper_side = (corner >> j) & 1 == 1;
                share *= if upper_side { frac } else { 1.0 - frac };
                flat += (cell + upper_side as usize) * strides[j];
            }
            if share != 0.0 {
                value += share * data[flat];
            }
        }
        value
    }

    /// Trapezoidal integral of node values over the grid
    pub fn integrate(&self, values: &[f64]) -> f64 {
        let strides = self.strides();
        values
            .iter()
            .enumerate()
            .map(|(flat, v)| {
                let mut w = 1.0;
                for j in 0..D {
                    let i = (flat / strides[j]) % self.shape[j];
                    w *= if i == 0 || i + 1 == self.shape[j] {
                        0.5 * self.spacing[j]
                    } else {
                        self.spacing[j]
                    };
                }
                v * w
            })
            .sum()
    }
}
