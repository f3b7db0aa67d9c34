// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Bandwidth Selection
//!
//! Data-driven choice of the smoothing bandwidth when the caller does not supply one.
//!
//! - [`BandwidthMethod::Silverman`] and [`BandwidthMethod::Scott`]: normal-reference rules of
//!   thumb, per dimension, adjusted for the kernel's roughness
//! - [`BandwidthMethod::ImprovedSheatherJones`]: Botev's plug-in selector, one-dimensional
//!
//! Rules of thumb are scale-equivariant: multiplying every coordinate by `c` multiplies the
//! returned bandwidth by `|c|`.

pub mod isj;
pub mod rules;

use tracing::debug;

use crate::error::{KdeError, Result};
use crate::estimators::approaches::common_nd::dataset::SampleSet;
use crate::estimators::approaches::kernel::{Bandwidth, Kernel};
use crate::estimators::traits::BandwidthSelector;

/// Bandwidth selection method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BandwidthMethod {
    #[default]
    Silverman,
    Scott,
    ImprovedSheatherJones,
}

/// Registry of bandwidth method names, matched case-insensitively
pub const BANDWIDTH_METHODS: &[(&str, BandwidthMethod)] = &[
    ("silverman", BandwidthMethod::Silverman),
    ("scott", BandwidthMethod::Scott),
    ("isj", BandwidthMethod::ImprovedSheatherJones),
    ("improved_sheather_jones", BandwidthMethod::ImprovedSheatherJones),
    ("botev", BandwidthMethod::ImprovedSheatherJones),
];

impl BandwidthMethod {
    /// # Errors
    ///
    /// Returns [`KdeError::InvalidInput`] for names not present in [`BANDWIDTH_METHODS`].
    pub fn from_name(name: &str) -> Result<Self> {
        let key = name.trim().to_lowercase();
        BANDWIDTH_METHODS
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, method)| *method)
            .ok_or_else(|| {
                KdeError::InvalidInput(format!("unknown bandwidth selection method `{name}`"))
            })
    }

    pub fn name(&self) -> &'static str {
        match self {
            BandwidthMethod::Silverman => "silverman",
            BandwidthMethod::Scott => "scott",
            BandwidthMethod::ImprovedSheatherJones => "isj",
        }
    }
}

impl BandwidthSelector for BandwidthMethod {
    fn select<const D: usize>(&self, samples: &SampleSet<D>, kernel: &Kernel) -> Result<Bandwidth> {
        let bandwidth = match self {
            BandwidthMethod::Silverman => rules::silverman(samples, kernel)?,
            BandwidthMethod::Scott => rules::scott(samples, kernel)?,
            BandwidthMethod::ImprovedSheatherJones => isj::improved_sheather_jones(samples)?,
        };
        debug!(method = self.name(), ?bandwidth, "selected bandwidth");
        Ok(bandwidth)
    }
}
