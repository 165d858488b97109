// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Fit a regular pixel grid to an irregular set of offsets.
//!
//! Each axis is fitted independently in the frame rotated by the reference
//! position angle.

use jcmt_log::diagnostic;
use jcmt_units::{Angle, Arcsec, Degree, arcsec};

use crate::descriptor::Offset;
use crate::{Error, Result};

/// Offsets closer than this are the same position.
const DEDUP_EPSILON: f64 = 1e-9;

/// Regular grid of one axis, in the rotated frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisGrid {
    pub npix: u32,
    pub pixel_size: Angle<Arcsec>,
    /// Position of the first pixel centre.
    pub reference: Angle<Arcsec>,
}

impl AxisGrid {
    /// Position of the middle of the axis.
    pub fn centre(&self) -> Angle<Arcsec> {
        self.reference + self.pixel_size * ((self.npix - 1) as f64 / 2.0)
    }

    /// Full extent covered by the pixels.
    pub fn extent(&self) -> Angle<Arcsec> {
        self.pixel_size * self.npix as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegularGrid {
    pub nx: u32,
    pub ny: u32,
    pub pixel_x: Angle<Arcsec>,
    pub pixel_y: Angle<Arcsec>,
    /// Grid centre in the tangent-plane frame.
    pub centre: Offset,
    pub position_angle: Angle<Degree>,
}

impl RegularGrid {
    pub(crate) fn from_axes(x: AxisGrid, y: AxisGrid, position_angle: Angle<Degree>) -> Self {
        let centre = Offset {
            x: x.centre(),
            y: y.centre(),
        }
        .rotate_from(position_angle);
        RegularGrid {
            nx: x.npix,
            ny: y.npix,
            pixel_x: x.pixel_size,
            pixel_y: y.pixel_size,
            centre,
            position_angle,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.nx as usize * self.ny as usize
    }

    /// Diagonal of the area covered by the grid.
    pub fn footprint_diagonal(&self) -> Angle<Arcsec> {
        let width = self.pixel_x.value() * self.nx as f64;
        let height = self.pixel_y.value() * self.ny as f64;
        arcsec(width.hypot(height))
    }

    /// Centres of all pixels in the tangent-plane frame, row by row.
    pub fn pixel_centres(&self) -> Vec<Offset> {
        let centre = self.centre.rotate_into(self.position_angle);
        let half_x = (self.nx - 1) as f64 / 2.0;
        let half_y = (self.ny - 1) as f64 / 2.0;
        let mut centres = Vec::with_capacity(self.pixel_count());
        for j in 0..self.ny {
            for i in 0..self.nx {
                let local = Offset {
                    x: centre.x + self.pixel_x * (i as f64 - half_x),
                    y: centre.y + self.pixel_y * (j as f64 - half_y),
                };
                centres.push(local.rotate_from(self.position_angle));
            }
        }
        centres
    }
}

fn distinct_sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| (*a - *b).abs() < DEDUP_EPSILON);
    values
}

/// Whether every value lies within `tolerance` of the lattice
/// `reference + k * trial`.
fn fits_lattice(values: &[f64], reference: f64, trial: f64, tolerance: f64) -> bool {
    values.iter().all(|v| {
        let ratio = (v - reference) / trial;
        (ratio - ratio.round()).abs() <= tolerance / trial
    })
}

/// Fit one axis. `tolerance` is the distance under which two offsets are
/// taken to be on the same pixel.
pub fn synthesize_axis(
    offsets: &[f64],
    nyquist: Angle<Arcsec>,
    tolerance: Angle<Arcsec>,
) -> Result<AxisGrid> {
    let values = distinct_sorted(offsets.iter().copied());
    let (first, last) = match (values.first(), values.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(Error::invariant("Grid requested for an empty offset list")),
    };
    match values.len() {
        1 => {
            return Ok(AxisGrid {
                npix: 1,
                pixel_size: nyquist,
                reference: arcsec(first),
            });
        }
        2 => {
            return Ok(AxisGrid {
                npix: 2,
                pixel_size: arcsec(last - first),
                reference: arcsec(first),
            });
        }
        _ => {}
    }

    let tol = tolerance.value();
    let Some(original_trial) = values
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|gap| *gap > tol)
        .min_by(f64::total_cmp)
    else {
        // All offsets are within the tolerance of each other.
        return Ok(AxisGrid {
            npix: 1,
            pixel_size: tolerance,
            reference: arcsec((first + last) / 2.0),
        });
    };

    let mut reference = first;
    let snapped = (first / original_trial).round() * original_trial;
    if (first - snapped).abs() < tol {
        reference = snapped;
    }

    let mut divisor = 1.0;
    let trial = loop {
        let trial = original_trial / divisor;
        if trial < tol || fits_lattice(&values, reference, trial, tol) {
            break trial;
        }
        diagnostic!("Trial pixel size {} arcsec does not fit, shrinking", trial);
        divisor += 1.0;
    };

    let steps = (last - reference) / trial;
    let steps = if (steps - steps.round()).abs() <= tol / trial {
        steps.round()
    } else {
        steps.ceil()
    };
    Ok(AxisGrid {
        npix: steps as u32 + 1,
        pixel_size: arcsec(trial),
        reference: arcsec(reference),
    })
}

/// Pass to derive the regular grid covering `offsets`.
///
/// `tolerance_factor` scales the Nyquist value into the position tolerance.
pub fn synthesize_grid(
    offsets: &[Offset],
    position_angle: Angle<Degree>,
    nyquist: Angle<Arcsec>,
    tolerance_factor: f64,
) -> Result<RegularGrid> {
    if nyquist.value() <= 0.0 {
        return Err(Error::invariant(format!(
            "Grid synthesis needs a positive Nyquist value, got {nyquist}"
        )));
    }
    let tolerance = nyquist * tolerance_factor;
    let rotated: Vec<Offset> = offsets
        .iter()
        .map(|offset| offset.rotate_into(position_angle))
        .collect();
    let xs: Vec<f64> = rotated.iter().map(|o| o.x.value()).collect();
    let ys: Vec<f64> = rotated.iter().map(|o| o.y.value()).collect();
    let x = synthesize_axis(&xs, nyquist, tolerance)?;
    let y = synthesize_axis(&ys, nyquist, tolerance)?;
    diagnostic!(
        "Grid of {}x{} pixels of {} x {} at {}",
        x.npix,
        y.npix,
        x.pixel_size,
        y.pixel_size,
        position_angle
    );
    Ok(RegularGrid::from_axes(x, y, position_angle))
}
