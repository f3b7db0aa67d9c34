// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::test_helpers::{generate_gaussian_data, max_abs_diff};
use approx::{assert_abs_diff_eq, assert_relative_eq};
use kernel_density::estimators::BandwidthSelector;
use kernel_density::{Bandwidth, BandwidthMethod, EvaluateOptions, KernelDensity, Kernel};
use ndarray::{array, Array1};
use rstest::rstest;

const BACKENDS: [&str; 3] = ["direct", "tree", "convolution"];

#[rstest]
#[case("direct", 1e-12)]
#[case("tree", 1e-12)]
#[case("convolution", 1e-4)]
fn test_three_point_gaussian(#[case] backend: &str, #[case] tolerance: f64) {
    let fitted = KernelDensity::<1>::builder()
        .backend(backend)
        .bandwidth(1.0)
        .build()
        .unwrap()
        .fit(array![-1.0, 0.0, 1.0], None)
        .unwrap();
    let estimate = fitted.evaluate_at(array![0.0]).unwrap();
    let phi = |x: f64| (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt();
    let expected = (phi(0.0) + 2.0 * phi(1.0)) / 3.0;
    assert_abs_diff_eq!(expected, 0.2943, epsilon = 1e-4);
    assert_abs_diff_eq!(estimate.values()[0], expected, epsilon = tolerance);
    assert!(estimate.grid().is_none());
}

#[rstest]
fn test_symmetric_samples_give_symmetric_estimates(
    #[values("direct", "tree", "convolution")] backend: &str,
) {
    let samples = array![-2.4, -1.1, -0.3, 0.3, 1.1, 2.4];
    let fitted = KernelDensity::<1>::builder()
        .backend(backend)
        .kernel("epanechnikov")
        .build()
        .unwrap()
        .fit(samples, None)
        .unwrap();
    let queries = array![0.1, 0.7, 1.9, 3.0];
    let positive = fitted.evaluate_at(queries.clone()).unwrap();
    let negative = fitted.evaluate_at(queries.mapv(|q| -q)).unwrap();
    assert!(max_abs_diff(positive.values(), negative.values()) < 1e-9);
}

#[rstest]
fn test_grid_estimate_integrates_to_one(
    #[values("direct", "tree", "convolution")] backend: &str,
    #[values("gaussian", "exponential", "box", "triangular", "epanechnikov", "biweight", "triweight", "tricube", "cosine")]
    kernel: &str,
) {
    let data = generate_gaussian_data(50, 1, 0.0, 1.0, 101).column(0).to_owned();
    let fitted = KernelDensity::<1>::builder()
        .backend(backend)
        .kernel(kernel)
        .grid_points(4096)
        .build()
        .unwrap()
        .fit(data, None)
        .unwrap();
    let estimate = fitted.evaluate_grid().unwrap();
    assert_eq!(estimate.len(), 4096);
    assert!(estimate.values().iter().all(|v| *v >= 0.0));
    let tolerance = if kernel == "box" { 1e-2 } else { 2e-3 };
    let integral = estimate.grid_integral().unwrap();
    assert!((integral - 1.0).abs() < tolerance, "{backend}/{kernel}: {integral}");
}

#[rstest]
fn test_two_dimensional_grid_integrates_to_one(#[values("tree", "convolution")] backend: &str) {
    let data = generate_gaussian_data(80, 2, 0.0, 1.0, 102);
    let fitted = KernelDensity::<2>::builder()
        .backend(backend)
        .grid_points(64)
        .build()
        .unwrap()
        .fit(data, None)
        .unwrap();
    let estimate = fitted.evaluate_grid().unwrap();
    assert_eq!(estimate.grid_values().unwrap().shape(), &[64, 64]);
    assert_abs_diff_eq!(estimate.grid_integral().unwrap(), 1.0, epsilon = 2e-3);
}

#[test]
fn test_backends_agree() {
    let data = generate_gaussian_data(150, 2, 0.0, 1.0, 103);
    let queries = generate_gaussian_data(25, 2, 0.0, 1.0, 104);
    let estimates: Vec<Array1<f64>> = BACKENDS
        .iter()
        .map(|backend| {
            KernelDensity::<2>::builder()
                .backend(backend)
                .bandwidth(vec![0.4, 0.5])
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
    assert!(max_abs_diff(&estimates[0], &estimates[2]) < 2e-3);
}

#[rstest]
fn test_weights_match_repeated_samples(#[values("direct", "tree")] backend: &str) {
    let kde = KernelDensity::<1>::builder()
        .backend(backend)
        .bandwidth(0.6)
        .build()
        .unwrap();
    let weighted = kde
        .fit(array![0.0, 1.0, 3.0], Some(array![2.0, 1.0, 1.0]))
        .unwrap();
    let repeated = kde.fit(array![0.0, 0.0, 1.0, 3.0], None).unwrap();
    let queries = array![-0.5, 0.2, 1.4, 2.9];
    let a = weighted.evaluate_at(queries.clone()).unwrap();
    let b = repeated.evaluate_at(queries).unwrap();
    assert!(max_abs_diff(a.values(), b.values()) < 1e-12);
}

#[test]
fn test_zero_weight_samples_are_ignored() {
    let kde = KernelDensity::<1>::builder().bandwidth(0.5).build().unwrap();
    let with_zero = kde
        .fit(array![0.0, 1.0, 50.0], Some(array![1.0, 1.0, 0.0]))
        .unwrap();
    let without = kde.fit(array![0.0, 1.0], None).unwrap();
    let queries = array![0.0, 0.5, 50.0];
    let a = with_zero.evaluate_at(queries.clone()).unwrap();
    let b = without.evaluate_at(queries).unwrap();
    assert!(max_abs_diff(a.values(), b.values()) < 1e-12);
    assert!(a.values()[2] < 1e-12);
}

#[test]
fn test_selected_bandwidth_is_reused() {
    let data = generate_gaussian_data(60, 1, 0.0, 2.0, 105).column(0).to_owned();
    let fitted = KernelDensity::<1>::builder()
        .bandwidth_method("scott")
        .build()
        .unwrap()
        .fit(data, None)
        .unwrap();
    let expected = BandwidthMethod::Scott
        .select(fitted.samples(), &Kernel::default())
        .unwrap();
    let first = fitted.evaluate_at(array![0.0]).unwrap();
    let second = fitted.evaluate_at(array![1.0]).unwrap();
    assert_eq!(first.bandwidth(), &expected);
    assert_eq!(second.bandwidth(), &expected);
    assert_eq!(fitted.bandwidth().unwrap(), expected);
}

#[test]
fn test_per_call_overrides() {
    let fitted = KernelDensity::<1>::builder()
        .bandwidth(1.0)
        .build()
        .unwrap()
        .fit(array![0.0], None)
        .unwrap();

    let narrow = fitted
        .evaluate_with(
            Some(array![0.0].into()),
            EvaluateOptions::new().with_bandwidth(0.5),
        )
        .unwrap();
    assert_relative_eq!(
        narrow.values()[0],
        1.0 / (0.5 * (2.0 * std::f64::consts::PI).sqrt()),
        max_relative = 1e-12
    );
    assert_eq!(narrow.bandwidth(), &Bandwidth::Scalar(0.5));

    let boxed = fitted
        .evaluate_with(Some(array![0.0].into()), EvaluateOptions::new().with_kernel("box"))
        .unwrap();
    assert_relative_eq!(boxed.values()[0], 1.0 / (2.0 * 3.0_f64.sqrt()), max_relative = 1e-12);

    // the fitted configuration is unchanged
    let plain = fitted.evaluate_at(array![0.0]).unwrap();
    assert_relative_eq!(
        plain.values()[0],
        1.0 / (2.0 * std::f64::consts::PI).sqrt(),
        max_relative = 1e-12
    );
}

#[test]
fn test_explicit_evaluation_grid() {
    let spec = kernel_density::GridSpec::uniform(vec![-4.0], vec![4.0], 81).unwrap();
    let fitted = KernelDensity::<1>::builder()
        .bandwidth(0.7)
        .grid(spec)
        .build()
        .unwrap()
        .fit(array![-0.5, 0.5], None)
        .unwrap();
    let estimate = fitted.evaluate(None).unwrap();
    let grid = estimate.grid().unwrap();
    assert_eq!(grid.lower(), [-4.0]);
    assert_eq!(estimate.len(), 81);
    assert_abs_diff_eq!(estimate.points()[40][0], 0.0, epsilon = 1e-12);
}
