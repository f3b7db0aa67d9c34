// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::test_helpers::{generate_uniform_data, max_abs_diff};
use approx::{assert_abs_diff_eq, assert_relative_eq};
use kernel_density::{Bandwidth, KdeError, KernelDensity};
use ndarray::{array, Array1};
use rstest::rstest;

fn unit_interval_samples() -> Array1<f64> {
    generate_uniform_data(200, 1, 1.0, 111).column(0).to_owned()
}

#[rstest]
fn test_reflected_estimate_integrates_to_one(
    #[values("direct", "tree", "convolution")] backend: &str,
) {
    let fitted = KernelDensity::<1>::builder()
        .backend(backend)
        .bandwidth(0.05)
        .reflect(vec![0.0], vec![1.0])
        .build()
        .unwrap()
        .fit(unit_interval_samples(), None)
        .unwrap();
    let estimate = fitted.evaluate_grid().unwrap();
    let grid = estimate.grid().unwrap();
    assert_eq!(grid.lower(), [0.0]);
    assert_eq!(grid.upper(), [1.0]);
    assert_abs_diff_eq!(estimate.grid_integral().unwrap(), 1.0, epsilon = 2e-3);
}

#[test]
fn test_boundary_density_doubles() {
    let samples = array![0.1, 0.4, 0.5, 1.2];
    let plain = KernelDensity::<1>::builder()
        .backend("direct")
        .bandwidth(0.3)
        .build()
        .unwrap()
        .fit(samples.clone(), None)
        .unwrap();
    let reflected = KernelDensity::<1>::builder()
        .backend("direct")
        .bandwidth(0.3)
        .reflect(vec![0.0], vec![f64::INFINITY])
        .build()
        .unwrap()
        .fit(samples, None)
        .unwrap();
    let at_zero = reflected.evaluate_at(array![0.0]).unwrap();
    let unreflected = plain.evaluate_at(array![0.0]).unwrap();
    assert_relative_eq!(at_zero.values()[0], 2.0 * unreflected.values()[0], max_relative = 1e-12);

    let outside = reflected.evaluate_at(array![-0.01, -3.0]).unwrap();
    assert_eq!(outside.values().as_slice().unwrap(), &[0.0, 0.0]);
}

#[test]
fn test_reflection_rejects_samples_outside_the_bounds() {
    let fitted = KernelDensity::<1>::builder()
        .bandwidth(0.2)
        .reflect(vec![0.0], vec![1.0])
        .build()
        .unwrap()
        .fit(array![0.2, 1.5], None)
        .unwrap();
    assert!(matches!(
        fitted.evaluate_at(array![0.5]),
        Err(KdeError::InvalidInput(_))
    ));
}

#[test]
fn test_reflection_in_two_dimensions() {
    let data = generate_uniform_data(150, 2, 1.0, 112);
    let queries = array![[0.0, 0.5], [0.3, 0.3], [0.99, 0.01], [0.5, 1.0]];
    let estimates: Vec<Array1<f64>> = ["direct", "tree"]
        .iter()
        .map(|backend| {
            KernelDensity::<2>::builder()
                .backend(backend)
                .kernel("biweight")
                .bandwidth(0.15)
                .reflect(vec![0.0, 0.0], vec![1.0, f64::INFINITY])
                .build()
                .unwrap()
                .fit(data.clone(), None)
                .unwrap()
                .evaluate_at(queries.clone())
                .unwrap()
                .into_values()
        })
        .collect();
    assert!(max_abs_diff(&estimates[0], &estimates[1]) < 1e-10);
    assert!(estimates[0].iter().all(|v| *v > 0.0));

    let fitted = KernelDensity::<2>::builder()
        .bandwidth(0.15)
        .grid_points(48)
        .reflect(vec![0.0, 0.0], vec![1.0, 1.0])
        .build()
        .unwrap()
        .fit(data, None)
        .unwrap();
    let estimate = fitted.evaluate_grid().unwrap();
    assert_abs_diff_eq!(estimate.grid_integral().unwrap(), 1.0, epsilon = 1e-2);
}

#[test]
fn test_reflection_with_per_sample_bandwidth() {
    let samples = array![0.05, 0.3, 0.8];
    let estimates: Vec<Array1<f64>> = ["direct", "tree"]
        .iter()
        .map(|backend| {
            KernelDensity::<1>::builder()
                .backend(backend)
                .kernel("triweight")
                .bandwidth(Bandwidth::PerSample(vec![0.1, 0.2, 0.3]))
                .reflect(vec![0.0], vec![1.0])
                .build()
                .unwrap()
                .fit(samples.clone(), None)
                .unwrap()
                .evaluate_at(array![0.0, 0.1, 0.5, 0.95])
                .unwrap()
                .into_values()
        })
        .collect();
    assert!(max_abs_diff(&estimates[0], &estimates[1]) < 1e-12);
}

fn bivariate_normal(diff: [f64; 2], cov: [[f64; 2]; 2]) -> f64 {
    let det = cov[0][0] * cov[1][1] - cov[0][1] * cov[1][0];
    let quad = (cov[1][1] * diff[0] * diff[0] - 2.0 * cov[0][1] * diff[0] * diff[1]
        + cov[0][0] * diff[1] * diff[1])
        / det;
    (-0.5 * quad).exp() / (2.0 * std::f64::consts::PI * det.sqrt())
}

#[test]
fn test_reflection_mirrors_correlated_bandwidth() {
    let sigma = [[0.04, 0.02], [0.02, 0.04]];
    let mirrored = [[0.04, -0.02], [-0.02, 0.04]];
    let sample = [0.1, 0.5];
    let queries = [[0.05, 0.6], [0.0, 0.45], [0.3, 0.3]];
    let estimates: Vec<Array1<f64>> = ["direct", "tree"]
        .iter()
        .map(|backend| {
            KernelDensity::<2>::builder()
                .backend(backend)
                .bandwidth(array![[0.04, 0.02], [0.02, 0.04]])
                .reflect(vec![0.0, f64::NEG_INFINITY], vec![f64::INFINITY, f64::INFINITY])
                .build()
                .unwrap()
                .fit(array![[0.1, 0.5]], None)
                .unwrap()
                .evaluate_at(array![[0.05, 0.6], [0.0, 0.45], [0.3, 0.3]])
                .unwrap()
                .into_values()
        })
        .collect();
    for (k, q) in queries.iter().enumerate() {
        let direct = [q[0] - sample[0], q[1] - sample[1]];
        let image = [q[0] + sample[0], q[1] - sample[1]];
        let expected = bivariate_normal(direct, sigma) + bivariate_normal(image, mirrored);
        assert_relative_eq!(estimates[0][k], expected, epsilon = 1e-10);
        assert_relative_eq!(estimates[1][k], expected, epsilon = 1e-9);
    }
}
