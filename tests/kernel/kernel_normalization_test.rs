// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::test_helpers::ALL_KERNELS;
use approx::assert_abs_diff_eq;
use kernel_density::{Kernel, Metric};
use rstest::rstest;

/// Half-width of a box containing the kernel's mass up to round-off
fn integration_half_width(kernel: &Kernel) -> f64 {
    kernel.effective_radius(1e-15).unwrap()
}

fn tolerance(name: &str) -> f64 {
    match name {
        "box" => 5e-3,
        "exponential" => 2e-3,
        _ => 1e-3,
    }
}

/// Midpoint rule over `[-l, l]^2`
fn integrate_2d(kernel: &Kernel, n: usize) -> f64 {
    let l = integration_half_width(kernel);
    let h = 2.0 * l / n as f64;
    let mut total = 0.0;
    for i in 0..n {
        let x = -l + (i as f64 + 0.5) * h;
        for j in 0..n {
            let y = -l + (j as f64 + 0.5) * h;
            total += kernel.density(&[x, y]);
        }
    }
    total * h * h
}

#[rstest]
fn test_one_dimensional_density_integrates_to_one(
    #[values("gaussian", "exponential", "box", "triangular", "epanechnikov", "biweight", "triweight", "tricube", "cosine")]
    name: &str,
) {
    let kernel = Kernel::from_name(name).unwrap();
    let l = integration_half_width(&kernel);
    let n = 200_000;
    let h = 2.0 * l / n as f64;
    let (mass, variance) = (0..n).fold((0.0, 0.0), |(m, v), i| {
        let z = -l + (i as f64 + 0.5) * h;
        let k = kernel.density(&[z]);
        (m + k * h, v + z * z * k * h)
    });
    assert_abs_diff_eq!(mass, 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(variance, 1.0, epsilon = 1e-5);
}

#[rstest]
#[case(Metric::Product)]
#[case(Metric::Radial { p: 1.0 })]
#[case(Metric::Radial { p: 2.0 })]
#[case(Metric::Radial { p: f64::INFINITY })]
fn test_two_dimensional_density_integrates_to_one(#[case] metric: Metric) {
    for name in ALL_KERNELS {
        let kernel = Kernel::from_name(name).unwrap().with_metric(metric).unwrap();
        let mass = integrate_2d(&kernel, 1000);
        assert!(
            (mass - 1.0).abs() < tolerance(name),
            "{name} with {metric:?} integrates to {mass}"
        );
    }
}

#[rstest]
#[case("epanechnikov", Metric::Radial { p: 2.0 })]
#[case("biweight", Metric::Product)]
#[case("gaussian", Metric::Radial { p: 2.0 })]
#[case("cosine", Metric::Radial { p: 3.0 })]
fn test_three_dimensional_density_integrates_to_one(#[case] name: &str, #[case] metric: Metric) {
    let kernel = Kernel::from_name(name).unwrap().with_metric(metric).unwrap();
    let l = integration_half_width(&kernel);
    let n = 120;
    let h = 2.0 * l / n as f64;
    let centre = |i: usize| -l + (i as f64 + 0.5) * h;
    let mut total = 0.0;
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                total += kernel.density(&[centre(i), centre(j), centre(k)]);
            }
        }
    }
    assert_abs_diff_eq!(total * h * h * h, 1.0, epsilon = 2e-3);
}
