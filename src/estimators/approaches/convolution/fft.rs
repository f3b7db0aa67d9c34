// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # N-D Convolution
//!
//! Both convolvers compute the "same"-aligned linear convolution of a grid signal with an
//! odd-shaped kernel grid centred on its middle node:
//!
//! out[i] = Σ_m s[m] · k[i − m + P]
//!
//! where `P_j = (k_j − 1) / 2`. [`FftConvolver`] zero-pads every axis to a power of two of
//! at least `s_j + k_j − 1` so the circular FFT product equals the linear convolution.
//! [`DenseConvolver`] evaluates the sum directly and serves as a reference.

use ndarray::{ArrayD, IxDyn};
use num_complex::Complex;
use rustfft::FftPlanner;
use tracing::trace;

use crate::error::{KdeError, Result};

/// Linear "same"-aligned convolution of a grid signal with a centred kernel grid
pub trait Convolver {
    fn convolve(&self, signal: &ArrayD<f64>, kernel: &ArrayD<f64>) -> Result<ArrayD<f64>>;
}

fn check_shapes(signal: &ArrayD<f64>, kernel: &ArrayD<f64>) -> Result<()> {
    if signal.ndim() != kernel.ndim() {
        return Err(KdeError::size_mismatch(
            signal.ndim(),
            kernel.ndim(),
            "convolution kernel rank",
        ));
    }
    if kernel.shape().iter().any(|&k| k % 2 == 0) {
        return Err(KdeError::InvalidInput(format!(
            "convolution kernel extents must be odd, got {:?}",
            kernel.shape()
        )));
    }
    Ok(())
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for j in (0..shape.len().saturating_sub(1)).rev() {
        strides[j] = strides[j + 1] * shape[j + 1];
    }
    strides
}

/// Frequency-domain convolver built on `rustfft`
#[derive(Debug, Clone, Copy, Default)]
pub struct FftConvolver;

impl FftConvolver {
    /// In-place N-D transform, one axis at a time
    fn transform(planner: &mut FftPlanner<f64>, buffer: &mut [Complex<f64>], shape: &[usize], inverse: bool) {
        let strides = row_major_strides(shape);
        let total: usize = shape.iter().product();
        for (axis, &len) in shape.iter().enumerate() {
            if len <= 1 {
                continue;
            }
            let fft = if inverse {
                planner.plan_fft_inverse(len)
            } else {
                planner.plan_fft_forward(len)
            };
            let stride = strides[axis];
            let mut lane = vec![Complex::new(0.0, 0.0); len];
            // every lane start: flat indices whose coordinate on `axis` is zero
            for start in (0..total).filter(|flat| (flat / stride) % len == 0) {
                for (k, slot) in lane.iter_mut().enumerate() {
                    *slot = buffer[start + k * stride];
                }
                fft.process(&mut lane);
                for (k, value) in lane.iter().enumerate() {
                    buffer[start + k * stride] = *value;
                }
            }
        }
    }

    fn embed(values: &ArrayD<f64>, padded_strides: &[usize], total: usize) -> Vec<Complex<f64>> {
        let mut buffer = vec![Complex::new(0.0, 0.0); total];
        for (index, &v) in values.indexed_iter() {
            let flat: usize = (0..values.ndim()).map(|j| index[j] * padded_strides[j]).sum();
            buffer[flat] = Complex::new(v, 0.0);
        }
        buffer
    }
}

impl Convolver for FftConvolver {
    fn convolve(&self, signal: &ArrayD<f64>, kernel: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        check_shapes(signal, kernel)?;
        let padded: Vec<usize> = signal
            .shape()
            .iter()
            .zip(kernel.shape())
            .map(|(&s, &k)| (s + k - 1).next_power_of_two())
            .collect();
        let padded_strides = row_major_strides(&padded);
        let total: usize = padded.iter().product();
        trace!(?padded, "fft convolution");

        let mut planner = FftPlanner::<f64>::new();
        let mut spectrum = Self::embed(signal, &padded_strides, total);
        let mut response = Self::embed(kernel, &padded_strides, total);
        Self::transform(&mut planner, &mut spectrum, &padded, false);
        Self::transform(&mut planner, &mut response, &padded, false);
        for (s, k) in spectrum.iter_mut().zip(&response) {
            *s *= *k;
        }
        Self::transform(&mut planner, &mut spectrum, &padded, true);

        // rustfft leaves transforms unnormalized
        let scale = 1.0 / total as f64;
        let half: Vec<usize> = kernel.shape().iter().map(|k| (k - 1) / 2).collect();
        Ok(ArrayD::from_shape_fn(IxDyn(signal.shape()), |index: IxDyn| {
            let flat: usize = (0..half.len())
                .map(|j| (index[j] + half[j]) * padded_strides[j])
                .sum();
            spectrum[flat].re * scale
        }))
    }
}

/// Direct-summation convolver
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseConvolver;

impl Convolver for DenseConvolver {
    fn convolve(&self, signal: &ArrayD<f64>, kernel: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        check_shapes(signal, kernel)?;
        let shape = signal.shape().to_vec();
        let half: Vec<isize> = kernel.shape().iter().map(|&k| ((k - 1) / 2) as isize).collect();
        let mut out = ArrayD::<f64>::zeros(IxDyn(&shape));
        let mut target = vec![0usize; shape.len()];
        for (m, &s) in signal.indexed_iter() {
            if s == 0.0 {
                continue;
            }
            'taps: for (k, &kv) in kernel.indexed_iter() {
                for j in 0..shape.len() {
                    let i = m[j] as isize + k[j] as isize - half[j];
                    if i < 0 || i >= shape[j] as isize {
                        continue 'taps;
                    }
                    target[j] = i as usize;
                }
                out[IxDyn(&target)] += s * kv;
            }
        }
        Ok(out)
    }
}
