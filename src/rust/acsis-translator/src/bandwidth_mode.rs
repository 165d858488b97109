// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Fixed table of correlator bandwidth modes.
//!
//! Each mode is named by its subband bandwidth without channel count,
//! upper-cased, e.g. `1GHZ` for a `1GHzx2048` subband.

use std::fmt;
use std::str::FromStr;

use jcmt_units::{Frequency, Hertz, hertz};

use crate::{Error, Result};

/// Passband edges and park frequency of one bandwidth class.
///
/// The edges are measured from the lower edge of the subband.
pub struct BandwidthModeTraits {
    pub f_low: Frequency<Hertz>,
    pub f_high: Frequency<Hertz>,
    pub f_park: Frequency<Hertz>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandwidthMode {
    Bw1Ghz,
    Bw500Mhz,
    Bw250Mhz,
}

impl BandwidthMode {
    pub const ALL: [BandwidthMode; 3] = [
        BandwidthMode::Bw1Ghz,
        BandwidthMode::Bw500Mhz,
        BandwidthMode::Bw250Mhz,
    ];

    pub fn traits(&self) -> &'static BandwidthModeTraits {
        match self {
            BandwidthMode::Bw1Ghz => &BW_1GHZ_TRAITS,
            BandwidthMode::Bw500Mhz => &BW_500MHZ_TRAITS,
            BandwidthMode::Bw250Mhz => &BW_250MHZ_TRAITS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BandwidthMode::Bw1Ghz => "1GHZ",
            BandwidthMode::Bw500Mhz => "500MHZ",
            BandwidthMode::Bw250Mhz => "250MHZ",
        }
    }

    /// Look up the mode for a label such as `250MHzx8192` or `250MHZ`.
    ///
    /// The channel count, if any, is dropped and the comparison is made on
    /// the upper-cased remainder. No nearby mode is ever substituted.
    pub fn from_label(label: &str) -> Result<Self> {
        let bandwidth = strip_channel_count(label).to_uppercase();
        BandwidthMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == bandwidth)
            .ok_or_else(|| {
                Error::unrecognized(format!(
                    "Bandwidth mode '{label}' is not a supported correlator bandwidth"
                ))
            })
    }
}

impl FromStr for BandwidthMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BandwidthMode::from_label(s)
    }
}

impl fmt::Display for BandwidthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part of a bandwidth label before the `x<channels>` suffix.
pub fn strip_channel_count(label: &str) -> &str {
    match label.rsplit_once(['x', 'X']) {
        Some((bandwidth, channels))
            if !channels.is_empty() && channels.bytes().all(|b| b.is_ascii_digit()) =>
        {
            bandwidth
        }
        _ => label,
    }
}

/// Format a subband bandwidth and channel count as a label, e.g. `1GHzx2048`.
pub fn format_label(bandwidth: Frequency<Hertz>, channels: u32) -> String {
    let hz = bandwidth.value();
    if hz >= 1e9 && (hz / 1e9).fract() == 0.0 {
        format!("{}GHzx{channels}", hz / 1e9)
    } else {
        format!("{}MHzx{channels}", hz / 1e6)
    }
}

pub const BW_1GHZ_TRAITS: BandwidthModeTraits = BandwidthModeTraits {
    f_low: hertz(40e6),
    f_high: hertz(960e6),
    f_park: hertz(2.5e9),
};

pub const BW_500MHZ_TRAITS: BandwidthModeTraits = BandwidthModeTraits {
    f_low: hertz(20e6),
    f_high: hertz(480e6),
    f_park: hertz(2.25e9),
};

pub const BW_250MHZ_TRAITS: BandwidthModeTraits = BandwidthModeTraits {
    f_low: hertz(10e6),
    f_high: hertz(240e6),
    f_park: hertz(2.125e9),
};
