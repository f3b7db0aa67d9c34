// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

mod kernel; // kernel families, metrics and normalization
pub use kernel::*;

pub mod bandwidth;
pub use bandwidth::{Bandwidth, ScaledBandwidth};
