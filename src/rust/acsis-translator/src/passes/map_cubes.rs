// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use jcmt_units::{Angle, Arcsec, Frequency, Hertz, degrees};

use crate::descriptor::{
    IteratorParameters, JiggleParameters, ObservationDescriptor, Offset, RasterParameters,
};
use crate::passes::plan_spectral::{SpectralPlan, SpectralWindowId};
use crate::passes::synthesize_grid::{AxisGrid, RegularGrid, synthesize_grid};
use crate::settings::TranslatorSettings;
use crate::{Error, Result};

/// Output data cube of one subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeLayout {
    pub spw_id: SpectralWindowId,
    pub grid: RegularGrid,
    pub rest_freq: Frequency<Hertz>,
    pub channel_width: Frequency<Hertz>,
    /// Channels after hybridisation.
    pub nchan: u32,
}

fn raster_axis(length: Angle<Arcsec>, spacing: Angle<Arcsec>) -> AxisGrid {
    let npix = (length / spacing).ceil() as u32 + 1;
    AxisGrid {
        npix,
        pixel_size: spacing,
        reference: -spacing * ((npix - 1) as f64 / 2.0),
    }
}

fn raster_grid(raster: &RasterParameters) -> RegularGrid {
    RegularGrid::from_axes(
        raster_axis(raster.width, raster.dx),
        raster_axis(raster.height, raster.dy),
        raster.position_angle,
    )
}

/// Jiggle pattern points in the tangent plane. The pattern itself is laid
/// out in the frame of its position angle.
fn jiggle_offsets(jiggle: &JiggleParameters) -> Vec<Offset> {
    jiggle
        .pattern
        .points
        .iter()
        .map(|point| point.rotate_from(jiggle.position_angle))
        .collect()
}

/// Spatial grid shared by every cube of the observation.
pub fn spatial_grid(
    descriptor: &ObservationDescriptor,
    settings: &TranslatorSettings,
) -> Result<RegularGrid> {
    let nyquist = descriptor.nyquist();
    let factor = settings.grid_tolerance_factor();
    match descriptor.parameters() {
        IteratorParameters::Raster(raster) => Ok(raster_grid(raster)),
        IteratorParameters::Stare(stare) => {
            synthesize_grid(&stare.offsets, stare.position_angle, nyquist, factor)
        }
        IteratorParameters::Jiggle(jiggle) | IteratorParameters::Pointing(jiggle) => {
            synthesize_grid(
                &jiggle_offsets(jiggle),
                jiggle.position_angle,
                nyquist,
                factor,
            )
        }
        IteratorParameters::Focus(_) => {
            synthesize_grid(&[Offset::new(0.0, 0.0)], degrees(0.0), nyquist, factor)
        }
    }
}

/// Pass to lay out one output cube per subsystem.
pub fn map_cubes(
    descriptor: &ObservationDescriptor,
    spectral: &SpectralPlan,
    settings: &TranslatorSettings,
) -> Result<Vec<CubeLayout>> {
    let grid = spatial_grid(descriptor, settings)?;
    Ok(spectral
        .subsystems
        .iter()
        .map(|subsystem| CubeLayout {
            spw_id: subsystem.spw_id,
            grid,
            rest_freq: subsystem.rest_freq,
            channel_width: subsystem.channel_width,
            nchan: subsystem.hybrid_channels,
        })
        .collect())
}

/// Longest footprint diagonal over all cubes.
pub fn footprint_diagonal(cubes: &[CubeLayout]) -> Result<Angle<Arcsec>> {
    cubes
        .iter()
        .map(|cube| cube.grid.footprint_diagonal())
        .max_by(|a, b| a.value().total_cmp(&b.value()))
        .ok_or_else(|| Error::invariant("Footprint requested before any cube was laid out"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{JiggleParameters, JigglePattern, SubsystemRequest, SwitchingKind};
    use crate::passes::plan_spectral::plan_spectral;
    use jcmt_units::{arcsec, gigahertz, megahertz, seconds};

    fn subsystem() -> SubsystemRequest {
        SubsystemRequest {
            rest_freq: gigahertz(345.796),
            bandwidth: megahertz(250.0),
            channels: 8192,
            overlap: megahertz(0.0),
            if_freq: gigahertz(4.0),
        }
    }

    fn raster() -> RasterParameters {
        RasterParameters {
            width: arcsec(120.0),
            height: arcsec(60.0),
            dx: arcsec(7.5),
            dy: arcsec(30.0),
            position_angle: degrees(0.0),
            sample_time: seconds(0.5),
            scan_velocity: None,
            rows_per_ref: None,
            rows_per_cal: None,
        }
    }

    #[test]
    fn test_raster_grid() {
        let grid = raster_grid(&raster());
        assert_eq!((grid.nx, grid.ny), (17, 3));
        assert_eq!(grid.pixel_x, arcsec(7.5));
        assert!(grid.centre.x.value().abs() < 1e-9);
        assert!(grid.centre.y.value().abs() < 1e-9);
        assert!((grid.footprint_diagonal().value() - 127.5f64.hypot(90.0)).abs() < 1e-9);
    }

    #[test]
    fn test_cube_per_subsystem() {
        let settings = TranslatorSettings::default();
        let jiggle = JiggleParameters {
            pattern: JigglePattern::named("3x3", arcsec(7.5)).unwrap(),
            position_angle: degrees(0.0),
            seconds_per_jiggle_point: seconds(30.0),
            jiggles_per_chop: None,
            off_cycles_per_chop: 2,
        };
        let descriptor =
            ObservationDescriptor::builder(IteratorParameters::Jiggle(jiggle), SwitchingKind::Chop)
                .subsystem(subsystem())
                .subsystem(subsystem())
                .receptors(["H00"])
                .nyquist(arcsec(7.0))
                .build()
                .unwrap();
        let spectral = plan_spectral(descriptor.subsystems(), &settings).unwrap();
        let cubes = map_cubes(&descriptor, &spectral, &settings).unwrap();
        assert_eq!(cubes.len(), 2);
        assert_eq!(cubes[1].spw_id.to_string(), "SPW2");
        assert_eq!((cubes[0].grid.nx, cubes[0].grid.ny), (3, 3));
        assert_eq!(cubes[0].nchan, 8192);
        let diagonal = footprint_diagonal(&cubes).unwrap();
        assert!((diagonal.value() - 22.5f64.hypot(22.5)).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_jiggle_keeps_pattern_lattice() {
        for pa in [0.0, 30.0, 45.0, 90.0] {
            let jiggle = JiggleParameters {
                pattern: JigglePattern::named("3x3", arcsec(7.5)).unwrap(),
                position_angle: degrees(pa),
                seconds_per_jiggle_point: seconds(30.0),
                jiggles_per_chop: None,
                off_cycles_per_chop: 2,
            };
            let descriptor = ObservationDescriptor::builder(
                IteratorParameters::Jiggle(jiggle),
                SwitchingKind::Chop,
            )
            .subsystem(subsystem())
            .receptors(["H00"])
            .nyquist(arcsec(7.0))
            .build()
            .unwrap();
            let grid = spatial_grid(&descriptor, &TranslatorSettings::default()).unwrap();
            assert_eq!((grid.nx, grid.ny), (3, 3), "pa {pa}");
            assert!((grid.pixel_x.value() - 7.5).abs() < 1e-9, "pa {pa}");
            assert!((grid.pixel_y.value() - 7.5).abs() < 1e-9, "pa {pa}");
            assert_eq!(grid.position_angle, degrees(pa));
            assert!(grid.centre.x.value().abs() < 1e-9);
            assert!(grid.centre.y.value().abs() < 1e-9);
        }
    }

    #[test]
    fn test_no_cubes() {
        assert!(matches!(
            footprint_diagonal(&[]),
            Err(Error::InvariantViolation(_))
        ));
    }
}
