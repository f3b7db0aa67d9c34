// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::test_helpers::ALL_KERNELS;
use kernel_density::estimators::approaches::kernel::KERNEL_REGISTRY;
use kernel_density::estimators::KernelFunction;
use kernel_density::{KdeError, Kernel, KernelFamily, Metric};
use rstest::rstest;

#[rstest]
#[case("gaussian", KernelFamily::Gaussian)]
#[case("Normal", KernelFamily::Gaussian)]
#[case("laplace", KernelFamily::Exponential)]
#[case("TopHat", KernelFamily::Box)]
#[case("uniform", KernelFamily::Box)]
#[case(" epa ", KernelFamily::Epanechnikov)]
#[case("quartic", KernelFamily::Biweight)]
#[case("TRICUBE", KernelFamily::Tricube)]
fn test_names_and_aliases_resolve(#[case] name: &str, #[case] expected: KernelFamily) {
    assert_eq!(KernelFamily::from_name(name).unwrap(), expected);
}

#[rstest]
#[case("triangle123")]
#[case("")]
#[case("gauss ian")]
fn test_unknown_names_are_rejected(#[case] name: &str) {
    assert_eq!(
        Kernel::from_name(name),
        Err(KdeError::InvalidKernel(name.to_string()))
    );
}

#[test]
fn test_registry_covers_every_family() {
    for family in KernelFamily::ALL {
        assert!(
            KERNEL_REGISTRY.iter().any(|(_, f)| *f == family),
            "{} missing from registry",
            family.name()
        );
        assert_eq!(KernelFamily::from_name(family.name()).unwrap(), family);
    }
    assert_eq!(ALL_KERNELS.len(), KernelFamily::ALL.len());
}

#[test]
fn test_support_radius_is_closed() {
    for family in KernelFamily::ALL.iter().filter(|f| f.has_finite_support()) {
        let radius = family.support_radius();
        let kernel = Kernel::new(*family);
        // Box keeps its full height at the boundary, the others reach zero there
        let at_boundary = kernel.evaluate(&[radius]);
        if *family == KernelFamily::Box {
            assert_eq!(at_boundary, 1.0);
        } else {
            assert!(at_boundary.abs() < 1e-12);
        }
        assert_eq!(kernel.evaluate(&[radius * (1.0 + 1e-12)]), 0.0);
    }
}

#[test]
fn test_default_metrics() {
    assert_eq!(Kernel::from_name("gaussian").unwrap().metric(), Metric::EUCLIDEAN);
    assert_eq!(Kernel::from_name("box").unwrap().metric(), Metric::Product);
    assert!(Metric::radial(0.5).is_err());
    assert!(Metric::radial(f64::INFINITY).is_ok());
}

#[test]
fn test_gaussian_metrics_agree() {
    let product = Kernel::from_name("gaussian")
        .unwrap()
        .with_metric(Metric::Product)
        .unwrap();
    let radial = Kernel::from_name("gaussian").unwrap();
    for z in [[0.0, 0.0], [0.3, -1.2], [2.5, 1.0]] {
        approx::assert_relative_eq!(product.density(&z), radial.density(&z), max_relative = 1e-12);
    }
}

#[test]
fn test_kernel_function_contract() {
    for family in KernelFamily::ALL {
        let kernel = Kernel::new(family);
        let radius = KernelFunction::support_radius(&kernel);
        assert_eq!(kernel.has_finite_support(), radius.is_finite());
        assert!(kernel.weight(0.0) > 0.0);
        assert!(kernel.weight(-0.5) == kernel.weight(0.5));
        if radius.is_finite() {
            assert_eq!(kernel.weight(radius * 1.01), 0.0);
        }
        for dim in 1..=4 {
            assert!(KernelFunction::normalization(&kernel, dim) > 0.0);
        }
    }
}
