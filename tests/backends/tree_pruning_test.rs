// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::test_helpers::{backend_inputs, generate_gaussian_data, generate_uniform_data, max_abs_diff, to_points};
use kernel_density::estimators::approaches::{DirectKde, TreeKde};
use kernel_density::estimators::DensityBackend;
use kernel_density::Bandwidth;

#[test]
fn test_compact_kernel_prunes_distant_samples() {
    let data = generate_uniform_data(2000, 2, 100.0, 91);
    let queries = to_points::<2>(&generate_uniform_data(200, 2, 100.0, 92));
    let (samples, kernel, scaled) = backend_inputs::<2>(&data, "epanechnikov", Bandwidth::Scalar(0.5));
    let (values, stats) = TreeKde::new()
        .evaluate_with_stats(&samples, &kernel, &scaled, &queries)
        .unwrap();
    assert_eq!(stats.queries, 200);
    assert_eq!(stats.samples, 2000);
    // search ball of radius 0.5 √5 √2 covers under 10⁻³ of the square
    assert!(stats.visited_fraction() < 0.01, "{stats:?}");
    let direct = DirectKde.evaluate(&samples, &kernel, &scaled, &queries).unwrap();
    assert!(max_abs_diff(&values, &direct) < 1e-10);
}

#[test]
fn test_wide_bandwidth_visits_every_sample() {
    let data = generate_uniform_data(300, 2, 1.0, 93);
    let queries = to_points::<2>(&generate_uniform_data(20, 2, 1.0, 94));
    let (samples, kernel, scaled) = backend_inputs::<2>(&data, "box", Bandwidth::Scalar(50.0));
    let (values, stats) = TreeKde::new()
        .evaluate_with_stats(&samples, &kernel, &scaled, &queries)
        .unwrap();
    assert_eq!(stats.visited_fraction(), 1.0);
    let direct = DirectKde.evaluate(&samples, &kernel, &scaled, &queries).unwrap();
    assert!(max_abs_diff(&values, &direct) < 1e-12);
}

#[test]
fn test_high_dimension_degrades_gracefully() {
    // in 8 dimensions a bandwidth near the data spread leaves little to prune
    let data = generate_gaussian_data(400, 8, 0.0, 1.0, 95);
    let queries = to_points::<8>(&generate_gaussian_data(20, 8, 0.0, 1.0, 96));
    let (samples, kernel, scaled) = backend_inputs::<8>(&data, "biweight", Bandwidth::Scalar(1.0));
    let (values, stats) = TreeKde::new()
        .evaluate_with_stats(&samples, &kernel, &scaled, &queries)
        .unwrap();
    assert!(stats.visited_fraction() > 0.9, "{stats:?}");
    let direct = DirectKde.evaluate(&samples, &kernel, &scaled, &queries).unwrap();
    assert!(max_abs_diff(&values, &direct) < 1e-10);
}

#[test]
fn test_empty_query_set() {
    let data = generate_uniform_data(10, 1, 1.0, 97);
    let (samples, kernel, scaled) = backend_inputs::<1>(&data, "gaussian", Bandwidth::Scalar(0.1));
    let (values, stats) = TreeKde::new()
        .evaluate_with_stats(&samples, &kernel, &scaled, &[])
        .unwrap();
    assert!(values.is_empty());
    assert_eq!(stats.visited_fraction(), 0.0);
}
