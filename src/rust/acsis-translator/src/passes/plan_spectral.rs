// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Channel, bandwidth and second local oscillator plan per subsystem.
//!
//! A subsystem with a positive overlap is a hybrid of two subbands; the
//! overlap is the only indication of hybridisation that is read. All subbands
//! of a subsystem are assumed to be symmetric around reference channel 1.

use std::collections::BTreeMap;
use std::fmt;

use jcmt_log::diagnostic;
use jcmt_units::{Frequency, Hertz};

use crate::bandwidth_mode::{BandwidthMode, BandwidthModeTraits, format_label};
use crate::descriptor::SubsystemRequest;
use crate::settings::TranslatorSettings;
use crate::{Error, Result};

/// Identifier of a spectral window, ordered by subsystem then subband.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpectralWindowId {
    pub subsystem: u32,
    /// Subband of a hybrid subsystem, `None` for the subsystem itself.
    pub subband: Option<u32>,
}

impl SpectralWindowId {
    pub fn subsystem(subsystem: u32) -> Self {
        SpectralWindowId {
            subsystem,
            subband: None,
        }
    }

    pub fn subband(subsystem: u32, subband: u32) -> Self {
        SpectralWindowId {
            subsystem,
            subband: Some(subband),
        }
    }
}

impl fmt::Display for SpectralWindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subband {
            Some(subband) => write!(f, "SPW{}.{}", self.subsystem, subband),
            None => write!(f, "SPW{}", self.subsystem),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubbandPlan {
    pub spw_id: SpectralWindowId,
    pub index: usize,
    pub if_exact: Frequency<Hertz>,
    pub lo2_exact: Frequency<Hertz>,
    /// `lo2_exact` rounded down to the synthesizer step.
    pub lo2: Frequency<Hertz>,
    /// `lo2_exact - lo2`. Applied to every IF placed on this subband's
    /// channel grid.
    pub align_shift: Frequency<Hertz>,
}

impl SubbandPlan {
    /// Centre IF actually realised with the quantized LO2.
    pub fn if_aligned(&self) -> Frequency<Hertz> {
        self.if_exact - self.align_shift
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubsystemPlan {
    /// 1-based subsystem number.
    pub number: u32,
    pub spw_id: SpectralWindowId,
    pub rest_freq: Frequency<Hertz>,
    pub if_freq: Frequency<Hertz>,
    pub channel_width: Frequency<Hertz>,
    pub hybrid_bandwidth: Frequency<Hertz>,
    pub hybrid_channels: u32,
    pub overlap_channels: u32,
    /// Bandwidth before hybridisation, rounded to the bandwidth rounding step.
    pub full_bandwidth: Frequency<Hertz>,
    pub total_channels: u32,
    pub subband_bandwidth: Frequency<Hertz>,
    pub subband_channels: u32,
    /// Subband bandwidth and channel count, e.g. `1GHzx2048`.
    pub bandwidth_label: String,
    pub bandwidth_mode: BandwidthMode,
    pub subbands: Vec<SubbandPlan>,
}

impl SubsystemPlan {
    pub fn is_hybrid(&self) -> bool {
        self.subbands.len() > 1
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpectralPlan {
    pub subsystems: Vec<SubsystemPlan>,
}

impl SpectralPlan {
    /// Every subband in ascending spectral-window order.
    pub fn subbands(&self) -> impl Iterator<Item = (&SubsystemPlan, &SubbandPlan)> {
        self.subsystems
            .iter()
            .flat_map(|ss| ss.subbands.iter().map(move |sb| (ss, sb)))
    }

    /// Quantized LO2 per subband spectral window.
    pub fn lo2_by_window(&self) -> BTreeMap<SpectralWindowId, Frequency<Hertz>> {
        self.subbands().map(|(_, sb)| (sb.spw_id, sb.lo2)).collect()
    }

    pub fn subband(&self, spw_id: &SpectralWindowId) -> Option<(&SubsystemPlan, &SubbandPlan)> {
        self.subbands().find(|(_, sb)| sb.spw_id == *spw_id)
    }
}

/// Round a bandwidth to the nearest multiple of `rounding`, absorbing float
/// error accumulated while summing subbands.
pub fn round_bandwidth(bandwidth: Frequency<Hertz>, rounding: Frequency<Hertz>) -> Frequency<Hertz> {
    bandwidth.round_to_multiple(rounding)
}

/// Quantize an exact LO2 down to the synthesizer step.
///
/// Returns the quantized value and the alignment correction
/// `exact - quantized`, which lies in `[0, step)`.
pub fn quantize_lo2(
    exact: Frequency<Hertz>,
    step: Frequency<Hertz>,
) -> (Frequency<Hertz>, Frequency<Hertz>) {
    let quantized = exact.floor_to_multiple(step);
    (quantized, exact - quantized)
}

/// Refuse modes whose passband starts beyond the subband bandwidth; the
/// correlator cannot be parked there.
fn check_park(
    mode: BandwidthMode,
    traits: &BandwidthModeTraits,
    subband_bandwidth: Frequency<Hertz>,
) -> Result<()> {
    if traits.f_low > subband_bandwidth {
        return Err(Error::unrecognized(format!(
            "Cannot park bandwidth mode {mode}: low edge {} exceeds subband bandwidth {}",
            traits.f_low, subband_bandwidth
        )));
    }
    Ok(())
}

fn plan_subsystem(
    number: u32,
    request: &SubsystemRequest,
    settings: &TranslatorSettings,
) -> Result<SubsystemPlan> {
    let channel_width = request.bandwidth / request.channels as f64;
    let nsubbands: u32 = if request.overlap.value() > 0.0 { 2 } else { 1 };
    let overlap_channels = (request.overlap / channel_width).round() as u32;

    let full_bandwidth = round_bandwidth(
        request.bandwidth + request.overlap * (2.0 * (nsubbands - 1) as f64),
        settings.bandwidth_rounding(),
    );
    let total_channels = request.channels + 2 * overlap_channels * (nsubbands - 1);
    if total_channels % nsubbands != 0 {
        return Err(Error::unrecognized(format!(
            "Subsystem {number}: {total_channels} channels cannot be split into {nsubbands} equal subbands"
        )));
    }
    let subband_channels = total_channels / nsubbands;
    let subband_bandwidth = full_bandwidth / nsubbands as f64;

    let bandwidth_label = format_label(subband_bandwidth, subband_channels);
    let bandwidth_mode = BandwidthMode::from_label(&bandwidth_label)?;
    let traits = bandwidth_mode.traits();
    check_park(bandwidth_mode, traits, subband_bandwidth)?;

    // Spacing between the centres of adjacent subbands, in channels.
    let effective_channels = subband_channels as f64 - 2.0 * overlap_channels as f64;
    let midpoint = (nsubbands - 1) as f64 / 2.0;

    let subbands = (0..nsubbands)
        .map(|i| {
            let spw_id = if nsubbands > 1 {
                SpectralWindowId::subband(number, i + 1)
            } else {
                SpectralWindowId::subsystem(number)
            };
            let if_exact =
                request.if_freq - channel_width * ((midpoint - i as f64) * effective_channels);
            let lo2_exact = if_exact - traits.f_park;
            let (lo2, align_shift) = quantize_lo2(lo2_exact, settings.lo2_step());
            diagnostic!(
                "{}: IF {} LO2 {} (exact {}, alignment {})",
                spw_id,
                if_exact,
                lo2,
                lo2_exact,
                align_shift
            );
            SubbandPlan {
                spw_id,
                index: i as usize,
                if_exact,
                lo2_exact,
                lo2,
                align_shift,
            }
        })
        .collect();

    Ok(SubsystemPlan {
        number,
        spw_id: SpectralWindowId::subsystem(number),
        rest_freq: request.rest_freq,
        if_freq: request.if_freq,
        channel_width,
        hybrid_bandwidth: request.bandwidth,
        hybrid_channels: request.channels,
        overlap_channels,
        full_bandwidth,
        total_channels,
        subband_bandwidth,
        subband_channels,
        bandwidth_label,
        bandwidth_mode,
        subbands,
    })
}

/// Pass to plan channels, bandwidth modes and LO2 frequencies.
pub fn plan_spectral(
    requests: &[SubsystemRequest],
    settings: &TranslatorSettings,
) -> Result<SpectralPlan> {
    let subsystems = requests
        .iter()
        .zip(1..)
        .map(|(request, number)| plan_subsystem(number, request, settings))
        .collect::<Result<Vec<_>>>()?;
    Ok(SpectralPlan { subsystems })
}
