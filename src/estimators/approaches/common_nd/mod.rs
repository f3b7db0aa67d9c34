// SPDX-FileCopyrightText: 2025-2026 Carlson Büth <code@cbueth.de>
//
// SPDX-License-Identifier: MIT OR Apache-2.0

// Common N-D sample and grid utilities shared by the density backends

pub mod dataset;
pub mod grid;
