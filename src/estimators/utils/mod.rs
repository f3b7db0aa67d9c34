// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

// Numerical helpers shared by bandwidth selectors

pub mod roots;
pub mod stats;
