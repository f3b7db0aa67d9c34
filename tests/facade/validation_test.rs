// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use kernel_density::{Bandwidth, EvaluateOptions, KdeError, KernelDensity};
use ndarray::{array, Array1, Array2};
use rstest::rstest;

#[test]
fn test_empty_samples() {
    let result = KernelDensity::<1>::new().fit(Array1::<f64>::zeros(0), None);
    assert!(matches!(result, Err(KdeError::InsufficientData { .. })));
    let result = KernelDensity::<2>::new().fit(Array2::<f64>::zeros((0, 2)), None);
    assert!(matches!(result, Err(KdeError::InsufficientData { .. })));
}

#[test]
fn test_single_sample_needs_a_fixed_bandwidth() {
    let fitted = KernelDensity::<1>::new().fit(array![1.0], None).unwrap();
    assert!(matches!(
        fitted.evaluate_at(array![1.0]),
        Err(KdeError::InsufficientData { .. })
    ));
    let fixed = KernelDensity::<1>::builder()
        .bandwidth(0.5)
        .build()
        .unwrap()
        .fit(array![1.0], None)
        .unwrap();
    assert!(fixed.evaluate_at(array![1.0]).is_ok());
}

#[rstest]
#[case(-1.0)]
#[case(0.0)]
#[case(f64::NAN)]
fn test_invalid_fixed_bandwidth(#[case] h: f64) {
    assert!(matches!(
        KernelDensity::<1>::builder().bandwidth(h).build(),
        Err(KdeError::InvalidInput(_))
    ));
    let fitted = KernelDensity::<1>::new().fit(array![0.0, 1.0], None).unwrap();
    assert!(matches!(
        fitted.evaluate_with(Some(array![0.0].into()), EvaluateOptions::new().with_bandwidth(h)),
        Err(KdeError::InvalidInput(_))
    ));
}

#[test]
fn test_unknown_identifiers() {
    assert_eq!(
        KernelDensity::<1>::builder().kernel("triangle123").build().err(),
        Some(KdeError::InvalidKernel("triangle123".to_string()))
    );
    assert_eq!(
        KernelDensity::<1>::builder().backend("gpu").build().err(),
        Some(KdeError::InvalidBackend("gpu".to_string()))
    );
    assert!(matches!(
        KernelDensity::<1>::builder().bandwidth_method("lscv").build(),
        Err(KdeError::InvalidInput(_))
    ));
    let fitted = KernelDensity::<1>::new().fit(array![0.0, 1.0], None).unwrap();
    assert!(matches!(
        fitted.evaluate_with(None, EvaluateOptions::new().with_kernel("triangle123")),
        Err(KdeError::InvalidKernel(_))
    ));
}

#[test]
fn test_query_dimension_mismatch() {
    let fitted = KernelDensity::<2>::new()
        .fit(array![[0.0, 0.0], [1.0, 1.0], [0.5, 2.0]], None)
        .unwrap();
    assert!(matches!(
        fitted.evaluate_at(array![[0.0, 0.0, 0.0]]),
        Err(KdeError::InvalidInput(_))
    ));
    assert!(matches!(
        fitted.evaluate_at(array![0.0, 1.0]),
        Err(KdeError::InvalidInput(_))
    ));
    assert!(KernelDensity::<3>::new()
        .fit(array![[0.0, 0.0], [1.0, 1.0]], None)
        .is_err());
}

#[test]
fn test_non_finite_values() {
    assert!(matches!(
        KernelDensity::<1>::new().fit(array![0.0, f64::NAN], None),
        Err(KdeError::InvalidInput(_))
    ));
    let fitted = KernelDensity::<1>::new().fit(array![0.0, 1.0], None).unwrap();
    assert!(matches!(
        fitted.evaluate_at(array![f64::INFINITY]),
        Err(KdeError::InvalidInput(_))
    ));
}

#[rstest]
#[case(array![1.0, 1.0])]
#[case(array![1.0, -1.0, 1.0])]
#[case(array![0.0, 0.0, 0.0])]
#[case(array![1.0, f64::NAN, 1.0])]
fn test_invalid_weights(#[case] weights: Array1<f64>) {
    assert!(matches!(
        KernelDensity::<1>::new().fit(array![0.0, 1.0, 2.0], Some(weights)),
        Err(KdeError::InvalidInput(_))
    ));
}

#[test]
fn test_per_sample_bandwidth_checks() {
    let kde = KernelDensity::<1>::builder()
        .bandwidth(Bandwidth::PerSample(vec![0.2, 0.3]))
        .build()
        .unwrap();
    assert!(matches!(
        kde.fit(array![0.0, 1.0, 2.0], None),
        Err(KdeError::InvalidInput(_))
    ));
    assert!(kde.fit(array![0.0, 1.0], None).is_ok());

    let fitted = KernelDensity::<1>::builder()
        .backend("fft")
        .build()
        .unwrap()
        .fit(array![0.0, 1.0], None)
        .unwrap();
    assert!(matches!(
        fitted.evaluate_with(
            Some(array![0.5].into()),
            EvaluateOptions::new().with_bandwidth(Bandwidth::PerSample(vec![0.2, 0.3]))
        ),
        Err(KdeError::InvalidInput(_))
    ));
}

#[test]
fn test_zero_dimension_is_rejected() {
    assert!(matches!(
        KernelDensity::<0>::builder().build(),
        Err(KdeError::InvalidInput(_))
    ));
}

#[test]
fn test_bad_metric_and_reflection_bounds() {
    assert!(KernelDensity::<2>::builder().norm(0.5).build().is_err());
    assert!(KernelDensity::<1>::builder()
        .reflect(vec![1.0], vec![0.0])
        .build()
        .is_err());
}
