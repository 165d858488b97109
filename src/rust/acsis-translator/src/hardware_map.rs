// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Static correlator wiring.
//!
//! The map is loaded once by the surrounding tooling and shared read-only
//! (typically behind an `Arc`) by every translation.

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::descriptor::ReceptorId;

/// One hardware path a receptor's spectral window can be routed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSlot {
    /// Correlator module.
    pub cm_id: u32,
    /// Down-converter module.
    pub dcm_id: u32,
    /// Correlator quadrant the module belongs to.
    pub quadrant: u32,
    /// Subband mode the quadrant runs in when no spectral window is routed
    /// through it.
    pub sb_mode: String,
    /// Second local oscillator synthesizer feeding the down-converter.
    pub synth: u32,
}

/// Per-receptor ordered list of hardware slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardwareMap {
    receptors: IndexMap<ReceptorId, Vec<HardwareSlot>>,
}

impl HardwareMap {
    pub fn new(receptors: IndexMap<ReceptorId, Vec<HardwareSlot>>) -> Self {
        HardwareMap { receptors }
    }

    /// Parse a map from its JSON form: an object keyed by receptor id whose
    /// values are the ordered slot lists.
    pub fn from_json(json: &str) -> Result<Self> {
        let map: HardwareMap =
            serde_json::from_str(json).context("Failed to parse the correlator wiring map")?;
        Ok(map)
    }

    pub fn slots(&self, receptor: &ReceptorId) -> Option<&[HardwareSlot]> {
        self.receptors.get(receptor).map(Vec::as_slice)
    }

    pub fn receptors(&self) -> impl Iterator<Item = &ReceptorId> {
        self.receptors.keys()
    }

    /// All slots of all receptors, in map order.
    pub fn iter_slots(&self) -> impl Iterator<Item = (&ReceptorId, &HardwareSlot)> {
        self.receptors
            .iter()
            .flat_map(|(receptor, slots)| slots.iter().map(move |slot| (receptor, slot)))
    }
}
