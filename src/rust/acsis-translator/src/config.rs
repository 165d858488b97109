// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Output configuration tree.
//!
//! Plain values only: frequencies in Hz, times in seconds, offsets and pixel
//! sizes in arcsec, angles in degrees. Serialization into the observatory's
//! document format is done by the caller.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::descriptor::FocusAxis;
use crate::passes::budget_timing::{ModeTiming, TimingBudget};
use crate::passes::classify_mode::ModeSummary;
use crate::passes::map_correlator::HardwareAssignment;
use crate::passes::map_cubes::CubeLayout;
use crate::passes::plan_spectral::{SpectralPlan, SubsystemPlan};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectralWindowConfig {
    pub id: String,
    /// Hybrid window this subband belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Subband windows of a hybrid window.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subbands: Vec<String>,
    pub bandwidth_label: String,
    pub bandwidth_mode: String,
    pub rest_freq: f64,
    /// Centre IF, with the LO2 alignment shift applied for subbands.
    pub if_freq: f64,
    pub channel_width: f64,
    pub nchan: u32,
    pub overlap_channels: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_shift: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lo2: Option<f64>,
}

impl SpectralWindowConfig {
    fn hybrid(subsystem: &SubsystemPlan) -> Self {
        SpectralWindowConfig {
            id: subsystem.spw_id.to_string(),
            parent: None,
            subbands: subsystem
                .subbands
                .iter()
                .map(|sb| sb.spw_id.to_string())
                .collect(),
            bandwidth_label: subsystem.bandwidth_label.clone(),
            bandwidth_mode: subsystem.bandwidth_mode.to_string(),
            rest_freq: subsystem.rest_freq.value(),
            if_freq: subsystem.if_freq.value(),
            channel_width: subsystem.channel_width.value(),
            nchan: subsystem.hybrid_channels,
            overlap_channels: subsystem.overlap_channels,
            align_shift: None,
            lo2: None,
        }
    }

    fn from_plan(spectral: &SpectralPlan) -> Vec<Self> {
        let mut windows = vec![];
        for subsystem in &spectral.subsystems {
            let hybrid = subsystem.is_hybrid();
            if hybrid {
                windows.push(SpectralWindowConfig::hybrid(subsystem));
            }
            for subband in &subsystem.subbands {
                windows.push(SpectralWindowConfig {
                    id: subband.spw_id.to_string(),
                    parent: hybrid.then(|| subsystem.spw_id.to_string()),
                    subbands: vec![],
                    bandwidth_label: subsystem.bandwidth_label.clone(),
                    bandwidth_mode: subsystem.bandwidth_mode.to_string(),
                    rest_freq: subsystem.rest_freq.value(),
                    if_freq: subband.if_aligned().value(),
                    channel_width: subsystem.channel_width.value(),
                    nchan: subsystem.subband_channels,
                    overlap_channels: subsystem.overlap_channels,
                    align_shift: Some(subband.align_shift.value()),
                    lo2: Some(subband.lo2.value()),
                });
            }
        }
        windows
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceptorRouting {
    pub receptor: String,
    pub spw_id: String,
    pub cm_id: u32,
    pub dcm_id: u32,
    pub quadrant: u32,
    pub synth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatorConfig {
    pub cm_modes: BTreeMap<u32, String>,
    pub quadrant_modes: BTreeMap<u32, String>,
    pub routing: Vec<ReceptorRouting>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfConfig {
    pub dcm_bandwidths: BTreeMap<u32, String>,
    pub synth_windows: BTreeMap<u32, String>,
    /// LO2 in Hz per synthesizer slot.
    pub lo2: BTreeMap<u32, f64>,
}

impl From<&HardwareAssignment> for CorrelatorConfig {
    fn from(assignment: &HardwareAssignment) -> Self {
        CorrelatorConfig {
            cm_modes: assignment.cm_modes.clone(),
            quadrant_modes: assignment.quadrant_modes.clone(),
            routing: assignment
                .assignments
                .iter()
                .map(|a| ReceptorRouting {
                    receptor: a.receptor.to_string(),
                    spw_id: a.spw_id.to_string(),
                    cm_id: a.slot.cm_id,
                    dcm_id: a.slot.dcm_id,
                    quadrant: a.slot.quadrant,
                    synth: a.slot.synth,
                })
                .collect(),
        }
    }
}

impl From<&HardwareAssignment> for IfConfig {
    fn from(assignment: &HardwareAssignment) -> Self {
        IfConfig {
            dcm_bandwidths: assignment.dcm_bandwidths.clone(),
            synth_windows: assignment
                .synth_windows
                .iter()
                .map(|(synth, spw_id)| (*synth, spw_id.to_string()))
                .collect(),
            lo2: assignment
                .lo2
                .iter()
                .map(|(synth, lo2)| (*synth, lo2.value()))
                .collect(),
        }
    }
}

/// Sequencer parameters. Fields that do not apply to the observing mode are
/// `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct JosConfig {
    pub step_time: f64,
    pub num_cycles: u32,
    pub steps_per_ref: u32,
    pub n_calsamples: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jos_mult: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_nod_sets: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jos_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jiggles_per_chop: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_per_ref: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_per_cal: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_to_cal_ratio: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_refsamples: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_velocity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_axis: Option<FocusAxis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_step_size: Option<f64>,
}

impl From<&TimingBudget> for JosConfig {
    fn from(budget: &TimingBudget) -> Self {
        let base = JosConfig {
            step_time: budget.step_time.get().value(),
            num_cycles: budget.num_cycles,
            steps_per_ref: budget.steps_per_ref,
            n_calsamples: budget.n_calsamples,
            ..Default::default()
        };
        match &budget.mode {
            ModeTiming::Raster {
                rows_per_ref,
                rows_per_cal,
                ref_to_cal_ratio,
                scan_velocity,
                n_refsamples,
                ..
            } => JosConfig {
                rows_per_ref: Some(*rows_per_ref),
                rows_per_cal: Some(*rows_per_cal),
                ref_to_cal_ratio: Some(*ref_to_cal_ratio),
                n_refsamples: Some(*n_refsamples),
                scan_velocity: Some(*scan_velocity),
                ..base
            },
            ModeTiming::ChopJiggle {
                jiggles_per_chop,
                num_nod_sets,
                jos_mult,
                ..
            } => JosConfig {
                jos_mult: Some(*jos_mult),
                num_nod_sets: Some(*num_nod_sets),
                jiggles_per_chop: Some(*jiggles_per_chop),
                ..base
            },
            ModeTiming::Grid { jos_min } | ModeTiming::FrequencySwitch { jos_min } => JosConfig {
                jos_min: Some(*jos_min),
                ..base
            },
            ModeTiming::Focus {
                axis,
                steps,
                step_size,
            } => JosConfig {
                focus_axis: Some(*axis),
                focus_steps: Some(*steps),
                focus_step_size: Some(*step_size),
                ..base
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CubeConfig {
    pub spw_id: String,
    pub nx: u32,
    pub ny: u32,
    pub pixel_x: f64,
    pub pixel_y: f64,
    pub centre_x: f64,
    pub centre_y: f64,
    pub position_angle: f64,
    pub rest_freq: f64,
    pub channel_width: f64,
    pub nchan: u32,
}

impl From<&CubeLayout> for CubeConfig {
    fn from(cube: &CubeLayout) -> Self {
        CubeConfig {
            spw_id: cube.spw_id.to_string(),
            nx: cube.grid.nx,
            ny: cube.grid.ny,
            pixel_x: cube.grid.pixel_x.value(),
            pixel_y: cube.grid.pixel_y.value(),
            centre_x: cube.grid.centre.x.value(),
            centre_y: cube.grid.centre.y.value(),
            position_angle: cube.grid.position_angle.value(),
            rest_freq: cube.rest_freq.value(),
            channel_width: cube.channel_width.value(),
            nchan: cube.nchan,
        }
    }
}

/// Everything produced for one observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    pub mode: ModeSummary,
    pub spectral_windows: Vec<SpectralWindowConfig>,
    pub correlator: CorrelatorConfig,
    pub if_block: IfConfig,
    pub jos: JosConfig,
    pub cubes: Vec<CubeConfig>,
}

impl Configuration {
    pub(crate) fn assemble(
        mode: ModeSummary,
        spectral: &SpectralPlan,
        hardware: &HardwareAssignment,
        cubes: &[CubeLayout],
        timing: &TimingBudget,
    ) -> Self {
        Configuration {
            mode,
            spectral_windows: SpectralWindowConfig::from_plan(spectral),
            correlator: hardware.into(),
            if_block: hardware.into(),
            jos: timing.into(),
            cubes: cubes.iter().map(CubeConfig::from).collect(),
        }
    }

    pub fn spectral_window(&self, id: &str) -> Option<&SpectralWindowConfig> {
        self.spectral_windows.iter().find(|spw| spw.id == id)
    }
}
