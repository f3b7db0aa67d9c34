// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use kernel_density::{EvaluateOptions, KernelDensity};
use ndarray::{Array1, array};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use tracing_subscriber::EnvFilter;

fn main() -> kernel_density::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut rng = StdRng::seed_from_u64(7);
    let narrow = Normal::new(0.0, 0.3).unwrap();

    // Bimodal data: rules of thumb oversmooth, ISJ keeps the modes apart
    let data: Array1<f64> = (0..2_000)
        .map(|i| narrow.sample(&mut rng) + if i % 2 == 0 { -2.0 } else { 2.0 })
        .collect();

    for method in ["silverman", "scott", "isj"] {
        let fitted = KernelDensity::<1>::builder()
            .bandwidth_method(method)
            .build()?
            .fit(data.clone(), None)?;
        let bandwidth = fitted.bandwidth()?;
        let estimate = fitted.evaluate_at(array![-2.0, 0.0, 2.0])?;
        println!(
            "{method:>10}: h = {:.4}, f(-2) = {:.4}, f(0) = {:.4}, f(2) = {:.4}",
            bandwidth.as_scalar().unwrap_or(f64::NAN),
            estimate.values()[0],
            estimate.values()[1],
            estimate.values()[2]
        );
    }

    // The same fitted samples with different kernels
    let fitted = KernelDensity::<1>::new().fit(data, None)?;
    for kernel in ["gaussian", "box", "epanechnikov", "cosine"] {
        let estimate = fitted.evaluate_with(
            Some(array![-2.0].into()),
            EvaluateOptions::new().with_kernel(kernel),
        )?;
        println!(
            "{kernel:>12}: h = {:?}, f(-2) = {:.4}",
            estimate.bandwidth(),
            estimate.values()[0]
        );
    }

    Ok(())
}
