// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Header keywords derived from a translated configuration.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::Configuration;
use crate::{Error, Result};

/// Synthesizer slots with an `LO2_<n>` keyword.
pub const LO2_SLOTS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKey {
    SamMode,
    SwMode,
    ObsType,
    StepTime,
    NumCyc,
    NCalSamples,
    JosMult,
    NumNods,
    JosMin,
    RowsPerRef,
    NRefSamples,
    NChnSubs,
    /// LO2 of the 1-based synthesizer slot.
    Lo2(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Text(text) => f.write_str(text),
            HeaderValue::Int(value) => write!(f, "{value}"),
            HeaderValue::Float(value) => write!(f, "{value}"),
        }
    }
}

fn int(value: u32) -> HeaderValue {
    HeaderValue::Int(value.into())
}

impl HeaderKey {
    pub const ALL: [HeaderKey; 16] = [
        HeaderKey::SamMode,
        HeaderKey::SwMode,
        HeaderKey::ObsType,
        HeaderKey::StepTime,
        HeaderKey::NumCyc,
        HeaderKey::NCalSamples,
        HeaderKey::JosMult,
        HeaderKey::NumNods,
        HeaderKey::JosMin,
        HeaderKey::RowsPerRef,
        HeaderKey::NRefSamples,
        HeaderKey::NChnSubs,
        HeaderKey::Lo2(1),
        HeaderKey::Lo2(2),
        HeaderKey::Lo2(3),
        HeaderKey::Lo2(4),
    ];

    /// Value of this keyword for `config`, `None` when it does not apply to
    /// the observing mode.
    pub fn value(&self, config: &Configuration) -> Option<HeaderValue> {
        let jos = &config.jos;
        match self {
            HeaderKey::SamMode => Some(HeaderValue::Text(config.mode.mapping.as_str().into())),
            HeaderKey::SwMode => Some(HeaderValue::Text(config.mode.switching.as_str().into())),
            HeaderKey::ObsType => Some(HeaderValue::Text(config.mode.obs_type.as_str().into())),
            HeaderKey::StepTime => Some(HeaderValue::Float(jos.step_time)),
            HeaderKey::NumCyc => Some(int(jos.num_cycles)),
            HeaderKey::NCalSamples => Some(int(jos.n_calsamples)),
            HeaderKey::JosMult => jos.jos_mult.map(int),
            HeaderKey::NumNods => jos.num_nod_sets.map(int),
            HeaderKey::JosMin => jos.jos_min.map(int),
            HeaderKey::RowsPerRef => jos.rows_per_ref.map(int),
            HeaderKey::NRefSamples => jos.n_refsamples.map(int),
            HeaderKey::NChnSubs => Some(int(subbands_per_subsystem(config))),
            HeaderKey::Lo2(slot) => slot
                .checked_sub(1)
                .and_then(|synth| config.if_block.lo2.get(&synth))
                .map(|lo2| HeaderValue::Float(*lo2)),
        }
    }
}

/// Largest subband count of any subsystem.
fn subbands_per_subsystem(config: &Configuration) -> u32 {
    config
        .spectral_windows
        .iter()
        .map(|spw| spw.subbands.len() as u32)
        .max()
        .unwrap_or(0)
        .max(1)
}

impl fmt::Display for HeaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HeaderKey::SamMode => "SAM_MODE",
            HeaderKey::SwMode => "SW_MODE",
            HeaderKey::ObsType => "OBS_TYPE",
            HeaderKey::StepTime => "STEPTIME",
            HeaderKey::NumCyc => "NUM_CYC",
            HeaderKey::NCalSamples => "N_CALSAMPLES",
            HeaderKey::JosMult => "JOS_MULT",
            HeaderKey::NumNods => "NUM_NODS",
            HeaderKey::JosMin => "JOS_MIN",
            HeaderKey::RowsPerRef => "ROWS_PER_REF",
            HeaderKey::NRefSamples => "NREFSAMPLES",
            HeaderKey::NChnSubs => "NCHNSUBS",
            HeaderKey::Lo2(slot) => return write!(f, "LO2_{slot}"),
        };
        f.write_str(name)
    }
}

impl FromStr for HeaderKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(slot) = s.strip_prefix("LO2_") {
            return match slot.parse::<u32>() {
                Ok(slot) if (1..=LO2_SLOTS).contains(&slot) => Ok(HeaderKey::Lo2(slot)),
                _ => Err(Error::unrecognized(format!("Unknown LO2 header keyword '{s}'"))),
            };
        }
        HeaderKey::ALL
            .into_iter()
            .find(|key| key.to_string() == s)
            .ok_or_else(|| Error::unrecognized(format!("Unknown header keyword '{s}'")))
    }
}

/// All keywords that apply to `config`, in keyword table order.
pub fn derive_headers(config: &Configuration) -> IndexMap<HeaderKey, HeaderValue> {
    HeaderKey::ALL
        .into_iter()
        .filter_map(|key| key.value(config).map(|value| (key, value)))
        .collect()
}
