// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Lowers typed JCMT heterodyne observation descriptors into ACSIS
//! correlator, IF, sequencer and cube configuration.

pub mod bandwidth_mode;
pub mod config;
pub mod descriptor;
mod error;
pub mod hardware_map;
pub mod headers;
pub mod passes;
pub mod settings;
pub mod translator;

pub use error::{Error, Result};
pub use translator::Translator;
