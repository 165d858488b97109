// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

pub mod budget_timing;
pub mod classify_mode;
pub mod map_correlator;
pub mod map_cubes;
pub mod plan_spectral;
pub mod synthesize_grid;
