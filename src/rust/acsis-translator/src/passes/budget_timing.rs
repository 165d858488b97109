// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Step, cycle and calibration cadence of an observation.

use jcmt_log::{diagnostic, warn};
use jcmt_units::{Duration, Second, seconds};

use crate::descriptor::{
    FocusAxis, FocusParameters, IteratorParameters, JiggleParameters, ObservationDescriptor,
    RasterParameters, StareParameters,
};
use crate::passes::classify_mode::{MappingMode, ModeSummary, SwitchingMode};
use crate::passes::map_cubes::{CubeLayout, footprint_diagonal};
use crate::settings::TranslatorSettings;
use crate::{Error, Result};

/// Nod phases in one nod set (A-B-B-A).
pub const NOD_PHASES: u32 = 4;

/// Absorbs float error in ratios that are integers on paper, e.g. 30 s / 0.1 s.
const RATIO_EPSILON: f64 = 1e-9;

/// A strictly positive step time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepTime(Duration<Second>);

impl StepTime {
    pub fn new(value: Duration<Second>) -> Result<Self> {
        if value.value() > 0.0 {
            Ok(StepTime(value))
        } else {
            Err(Error::invariant(format!(
                "Step time must be positive, got {value}"
            )))
        }
    }

    pub fn get(self) -> Duration<Second> {
        self.0
    }

    /// Whole steps needed to cover `duration`, at least one.
    fn steps_for(self, duration: Duration<Second>) -> u32 {
        duration.steps_of(self.0).max(1.0) as u32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModeTiming {
    Raster {
        rows_per_ref: u32,
        rows_per_cal: u32,
        ref_to_cal_ratio: u32,
        /// Arcsec per second.
        scan_velocity: f64,
        row_time: Duration<Second>,
        n_refsamples: u32,
    },
    ChopJiggle {
        jiggle_points: u32,
        jiggles_per_chop: u32,
        off_cycles_per_chop: u32,
        steps_per_traversal: u32,
        traversal_time: Duration<Second>,
        required_repeats: u32,
        required_traversals: u32,
        max_traversals: u32,
        num_nod_sets: u32,
        /// Pattern traversals per nod phase.
        jos_mult: u32,
        /// Traversals per nod phase requested but not scheduled.
        shortfall_traversals: u32,
    },
    Grid {
        jos_min: u32,
    },
    FrequencySwitch {
        jos_min: u32,
    },
    Focus {
        axis: FocusAxis,
        steps: u32,
        step_size: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingBudget {
    pub step_time: StepTime,
    pub num_cycles: u32,
    pub steps_per_ref: u32,
    pub n_calsamples: u32,
    pub mode: ModeTiming,
}

struct ChopJiggleRequest {
    points: u32,
    on_per_chop: u32,
    off_cycles: u32,
    seconds_per_point: Duration<Second>,
}

fn raster_timing(
    raster: &RasterParameters,
    step: StepTime,
    cubes: &[CubeLayout],
) -> Result<(u32, ModeTiming)> {
    let rows_per_ref = raster
        .rows_per_ref
        .filter(|rows| *rows >= 1)
        .map_or(1, |rows| rows as u32);
    let rows_per_cal = raster
        .rows_per_cal
        .filter(|rows| *rows >= 1)
        .map_or(rows_per_ref, |rows| rows as u32);
    let ref_to_cal_ratio = (rows_per_cal / rows_per_ref).max(1);

    let scan_velocity = raster
        .scan_velocity
        .unwrap_or_else(|| raster.dx.value() / raster.sample_time.value());
    let row_time = seconds(footprint_diagonal(cubes)?.value() / scan_velocity);
    let on_steps = row_time / step.get() * rows_per_ref as f64;
    let n_refsamples = on_steps.sqrt().round().max(1.0) as u32;
    let steps_per_ref = on_steps.round().max(1.0) as u32;
    diagnostic!(
        "Raster row takes {} at {} arcsec/s, {} on-steps per reference",
        row_time,
        scan_velocity,
        on_steps
    );

    Ok((
        steps_per_ref,
        ModeTiming::Raster {
            rows_per_ref,
            rows_per_cal,
            ref_to_cal_ratio,
            scan_velocity,
            row_time,
            n_refsamples,
        },
    ))
}

fn chop_jiggle_timing(
    request: ChopJiggleRequest,
    step: StepTime,
    settings: &TranslatorSettings,
) -> (u32, ModeTiming) {
    let ChopJiggleRequest {
        points,
        on_per_chop,
        off_cycles,
        seconds_per_point,
    } = request;
    let steps_per_traversal = points.div_ceil(on_per_chop) * (on_per_chop + 2 * off_cycles);
    let traversal_time = step.get() * steps_per_traversal as f64;

    let required_repeats = (seconds_per_point / step.get() - RATIO_EPSILON).ceil().max(1.0) as u32;
    let required_traversals = required_repeats.div_ceil(NOD_PHASES);
    let max_traversals = ((settings.max_time_between_nods() / traversal_time + RATIO_EPSILON)
        .floor() as u32)
        .max(1);

    let (num_nod_sets, jos_mult) = if required_traversals <= max_traversals {
        (1, required_traversals)
    } else {
        (required_traversals / max_traversals, max_traversals)
    };
    let shortfall_traversals = required_traversals.saturating_sub(num_nod_sets * jos_mult);
    if shortfall_traversals > 0 {
        warn!(
            "Scheduling {} nod sets of {} traversals; {} of {} requested traversals are dropped",
            num_nod_sets,
            jos_mult,
            shortfall_traversals,
            required_traversals
        );
    }

    (
        steps_per_traversal * jos_mult,
        ModeTiming::ChopJiggle {
            jiggle_points: points,
            jiggles_per_chop: on_per_chop,
            off_cycles_per_chop: off_cycles,
            steps_per_traversal,
            traversal_time,
            required_repeats,
            required_traversals,
            max_traversals,
            num_nod_sets,
            jos_mult,
            shortfall_traversals,
        },
    )
}

fn jiggle_request(jiggle: &JiggleParameters) -> ChopJiggleRequest {
    let points = jiggle.pattern.len() as u32;
    ChopJiggleRequest {
        points,
        on_per_chop: jiggle.jiggles_per_chop.unwrap_or(points),
        off_cycles: jiggle.off_cycles_per_chop,
        seconds_per_point: jiggle.seconds_per_jiggle_point,
    }
}

/// A chopped stare visits each position as a single-point pattern.
fn stare_request(stare: &StareParameters) -> ChopJiggleRequest {
    ChopJiggleRequest {
        points: 1,
        on_per_chop: 1,
        off_cycles: 1,
        seconds_per_point: stare.seconds_per_point,
    }
}

fn focus_timing(focus: &FocusParameters, step: StepTime) -> (u32, ModeTiming) {
    (
        step.steps_for(focus.seconds_per_step),
        ModeTiming::Focus {
            axis: focus.axis,
            steps: focus.steps,
            step_size: focus.step_size,
        },
    )
}

fn mode_mismatch(mode: &ModeSummary, descriptor: &ObservationDescriptor) -> Error {
    Error::invariant(format!(
        "Mode {mode} does not match the {} iterator parameters",
        descriptor.iterator()
    ))
}

/// Pass to derive the timing budget of an observation.
///
/// `cubes` must already be laid out; raster reference sampling depends on
/// their footprint.
pub fn budget_timing(
    descriptor: &ObservationDescriptor,
    mode: &ModeSummary,
    cubes: &[CubeLayout],
    settings: &TranslatorSettings,
) -> Result<TimingBudget> {
    let step = match descriptor.parameters() {
        IteratorParameters::Raster(raster) => StepTime::new(raster.sample_time)?,
        _ => StepTime::new(settings.step_time())?,
    };

    let (steps_per_ref, timing) = match (descriptor.parameters(), mode.mapping, mode.switching) {
        (IteratorParameters::Raster(raster), MappingMode::Raster, _) => {
            raster_timing(raster, step, cubes)?
        }
        (IteratorParameters::Focus(focus), MappingMode::Jiggle, SwitchingMode::Chop) => {
            focus_timing(focus, step)
        }
        (IteratorParameters::Stare(stare), MappingMode::Grid, SwitchingMode::Pssw) => {
            let jos_min = step.steps_for(stare.seconds_per_point);
            (jos_min, ModeTiming::Grid { jos_min })
        }
        (IteratorParameters::Stare(stare), MappingMode::Jiggle, SwitchingMode::Chop) => {
            chop_jiggle_timing(stare_request(stare), step, settings)
        }
        (
            IteratorParameters::Jiggle(jiggle) | IteratorParameters::Pointing(jiggle),
            MappingMode::Jiggle,
            SwitchingMode::Chop,
        ) => chop_jiggle_timing(jiggle_request(jiggle), step, settings),
        (IteratorParameters::Jiggle(jiggle), MappingMode::Jiggle, SwitchingMode::Freqsw) => {
            let jos_min = step.steps_for(jiggle.seconds_per_jiggle_point);
            (1, ModeTiming::FrequencySwitch { jos_min })
        }
        _ => return Err(mode_mismatch(mode, descriptor)),
    };

    let n_calsamples = step.steps_for(settings.cal_time());
    Ok(TimingBudget {
        step_time: step,
        num_cycles: descriptor.integration_repeats(),
        steps_per_ref,
        n_calsamples,
        mode: timing,
    })
}
