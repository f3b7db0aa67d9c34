// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use kernel_density::KernelDensity;
use kernel_density::estimators::approaches::{Bandwidth, DirectKde, Kernel, SampleSet, TreeKde};
use kernel_density::estimators::DensityBackend;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> kernel_density::Result<()> {
    // RUST_LOG=kernel_density=debug shows bandwidths, grids and tree statistics
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut rng = StdRng::seed_from_u64(2024);
    let normal = Normal::new(0.0, 1.0).unwrap();

    // Example 1D data: a mixture of two normals
    let data: Array1<f64> = (0..5_000)
        .map(|i| normal.sample(&mut rng) + if i % 3 == 0 { 4.0 } else { 0.0 })
        .collect();
    let queries = Array1::linspace(-3.0, 7.0, 11);

    for backend in ["direct", "tree", "convolution"] {
        let fitted = KernelDensity::<1>::builder()
            .kernel("epanechnikov")
            .backend(backend)
            .build()?
            .fit(data.clone(), None)?;
        let start = Instant::now();
        let estimate = fitted.evaluate_at(queries.clone())?;
        let elapsed = start.elapsed();
        println!("{backend:>12}: {:?} ({elapsed:?})", estimate.values().mapv(|v| (v * 1e4).round() / 1e4));
    }

    // Grid estimate and its integral
    let fitted = KernelDensity::<1>::new().fit(data.clone(), None)?;
    let grid_estimate = fitted.evaluate_grid()?;
    println!(
        "Silverman bandwidth {:?}, grid of {} nodes integrates to {:.6}",
        grid_estimate.bandwidth(),
        grid_estimate.len(),
        grid_estimate.grid_integral().unwrap_or(f64::NAN)
    );

    // 2D data: how much of the sample set the tree actually visits
    let data_2d = Array2::from_shape_fn((20_000, 2), |_| normal.sample(&mut rng) * 3.0);
    let samples = SampleSet::<2>::new(data_2d, None)?;
    let kernel = Kernel::from_name("biweight")?;
    let queries_2d: Vec<[f64; 2]> = (0..500)
        .map(|_| [normal.sample(&mut rng), normal.sample(&mut rng)])
        .collect();
    for h in [0.1, 1.0, 10.0] {
        let bandwidth = Bandwidth::Scalar(h).resolve::<2>(samples.len())?;
        let (tree_values, stats) =
            TreeKde::new().evaluate_with_stats(&samples, &kernel, &bandwidth, &queries_2d)?;
        let direct_values = DirectKde.evaluate(&samples, &kernel, &bandwidth, &queries_2d)?;
        let max_diff = tree_values
            .iter()
            .zip(direct_values.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        println!(
            "h = {h:>5}: tree visited {:.2}% of pairs, max |tree - direct| = {max_diff:.2e}",
            100.0 * stats.visited_fraction()
        );
    }

    Ok(())
}
