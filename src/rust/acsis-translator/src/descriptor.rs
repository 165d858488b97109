// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! The typed observation descriptor.
//!
//! A descriptor is built once per unrolled observation by the tooling that
//! reads the science program, and is only read by the translator passes.
//! Parameters are grouped per iterator kind so that a field required by one
//! mode cannot be missing when that mode is translated.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use jcmt_units::{Angle, Arcsec, Degree, Duration, Frequency, Hertz, Second, arcsec};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceptorId(String);

impl Deref for ReceptorId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for ReceptorId {
    fn from(s: &str) -> Self {
        ReceptorId(s.to_string())
    }
}

impl From<String> for ReceptorId {
    fn from(s: String) -> Self {
        ReceptorId(s)
    }
}

impl fmt::Display for ReceptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Angular offset in the tangent plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub x: Angle<Arcsec>,
    pub y: Angle<Arcsec>,
}

impl Offset {
    pub fn new(x: f64, y: f64) -> Self {
        Offset {
            x: arcsec(x),
            y: arcsec(y),
        }
    }

    /// Coordinates of this offset in a frame rotated by `position_angle`.
    pub fn rotate_into(self, position_angle: Angle<Degree>) -> Offset {
        let (s, c) = position_angle.sin_cos();
        Offset {
            x: self.x * c + self.y * s,
            y: self.y * c - self.x * s,
        }
    }

    /// Inverse of [`Offset::rotate_into`].
    pub fn rotate_from(self, position_angle: Angle<Degree>) -> Offset {
        let (s, c) = position_angle.sin_cos();
        Offset {
            x: self.x * c - self.y * s,
            y: self.x * s + self.y * c,
        }
    }

    pub fn scaled(self, factor: f64) -> Offset {
        Offset {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IteratorKind {
    Raster,
    Stare,
    Jiggle,
    Pointing,
    Focus,
}

impl IteratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IteratorKind::Raster => "raster",
            IteratorKind::Stare => "stare",
            IteratorKind::Jiggle => "jiggle",
            IteratorKind::Pointing => "pointing",
            IteratorKind::Focus => "focus",
        }
    }
}

impl FromStr for IteratorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rasterPixel" | "raster" => Ok(IteratorKind::Raster),
            "stare" | "grid" => Ok(IteratorKind::Stare),
            "jiggle" => Ok(IteratorKind::Jiggle),
            "pointing" => Ok(IteratorKind::Pointing),
            "focus" => Ok(IteratorKind::Focus),
            _ => Err(Error::unrecognized(format!(
                "Unrecognized observation iterator '{s}'"
            ))),
        }
    }
}

impl fmt::Display for IteratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Switching scheme requested by the science program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SwitchingKind {
    Position,
    Chop,
    Beam,
    /// Frequency switching, with the variant named after the `Frequency-`
    /// prefix (e.g. `Slow`, `Fast`).
    Frequency(String),
    None,
}

impl SwitchingKind {
    pub fn as_str(&self) -> &str {
        match self {
            SwitchingKind::Position => "Position",
            SwitchingKind::Chop => "Chop",
            SwitchingKind::Beam => "Beam",
            SwitchingKind::Frequency(variant) => variant,
            SwitchingKind::None => "None",
        }
    }
}

impl FromStr for SwitchingKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Position" | "pssw" => Ok(SwitchingKind::Position),
            "Chop" | "chop" => Ok(SwitchingKind::Chop),
            "Beam" | "beam" => Ok(SwitchingKind::Beam),
            "None" | "none" | "" => Ok(SwitchingKind::None),
            _ if s.starts_with("Frequency-") || s.starts_with("freqsw") => {
                Ok(SwitchingKind::Frequency(s.to_string()))
            }
            _ => Err(Error::unrecognized(format!(
                "Unrecognized switching mode '{s}'"
            ))),
        }
    }
}

impl fmt::Display for SwitchingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frequency request of one spectral subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsystemRequest {
    pub rest_freq: Frequency<Hertz>,
    /// Bandwidth after hybridisation.
    pub bandwidth: Frequency<Hertz>,
    /// Channel count after hybridisation.
    pub channels: u32,
    /// Overlap between adjacent subbands. A positive overlap makes the
    /// subsystem a hybrid of two subbands.
    pub overlap: Frequency<Hertz>,
    /// Centre of the subsystem in the intermediate frequency band.
    pub if_freq: Frequency<Hertz>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JigglePattern {
    pub name: String,
    /// Points in the pattern frame, before rotation by the position angle.
    pub points: Vec<Offset>,
}

type PatternConstructor = fn() -> Vec<Offset>;

const JIGGLE_PATTERNS: [(&str, PatternConstructor); 5] = [
    ("3x3", || square_pattern(3)),
    ("5x5", || square_pattern(5)),
    ("HARP4", || square_pattern(4)),
    ("HARP5", || square_pattern(5)),
    ("5pt", || {
        vec![
            Offset::new(0.0, 0.0),
            Offset::new(1.0, 0.0),
            Offset::new(0.0, 1.0),
            Offset::new(-1.0, 0.0),
            Offset::new(0.0, -1.0),
        ]
    }),
];

/// Square pattern of `n` x `n` points at unit spacing centred on the origin.
fn square_pattern(n: u32) -> Vec<Offset> {
    let half = (n as f64 - 1.0) / 2.0;
    (0..n)
        .flat_map(|j| (0..n).map(move |i| Offset::new(i as f64 - half, j as f64 - half)))
        .collect()
}

impl JigglePattern {
    /// A built-in pattern, with the unit spacing scaled to `scale`.
    pub fn named(name: &str, scale: Angle<Arcsec>) -> Result<Self> {
        let (_, constructor) = JIGGLE_PATTERNS
            .iter()
            .find(|(pattern_name, _)| *pattern_name == name)
            .ok_or_else(|| Error::unrecognized(format!("Unknown jiggle pattern '{name}'")))?;
        Ok(JigglePattern {
            name: name.to_string(),
            points: constructor()
                .into_iter()
                .map(|p| p.scaled(scale.value()))
                .collect(),
        })
    }

    pub fn custom(name: impl Into<String>, points: Vec<Offset>) -> Self {
        JigglePattern {
            name: name.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterParameters {
    pub width: Angle<Arcsec>,
    pub height: Angle<Arcsec>,
    /// Sample spacing along a scan row.
    pub dx: Angle<Arcsec>,
    /// Spacing between scan rows.
    pub dy: Angle<Arcsec>,
    pub position_angle: Angle<Degree>,
    pub sample_time: Duration<Second>,
    /// Scan speed in arcsec per second. Derived from `dx` and `sample_time`
    /// when not given.
    pub scan_velocity: Option<f64>,
    pub rows_per_ref: Option<i64>,
    pub rows_per_cal: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StareParameters {
    pub offsets: Vec<Offset>,
    pub position_angle: Angle<Degree>,
    pub seconds_per_point: Duration<Second>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JiggleParameters {
    pub pattern: JigglePattern,
    pub position_angle: Angle<Degree>,
    pub seconds_per_jiggle_point: Duration<Second>,
    /// Jiggle points observed in one chop position. The whole pattern when
    /// not given.
    pub jiggles_per_chop: Option<u32>,
    /// Steps spent in the off position per chop cycle.
    pub off_cycles_per_chop: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FocusAxis {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FocusParameters {
    pub axis: FocusAxis,
    pub steps: u32,
    /// Secondary mirror displacement per step in mm.
    pub step_size: f64,
    pub seconds_per_step: Duration<Second>,
}

/// Iterator-specific part of the descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum IteratorParameters {
    Raster(RasterParameters),
    Stare(StareParameters),
    Jiggle(JiggleParameters),
    Pointing(JiggleParameters),
    Focus(FocusParameters),
}

impl IteratorParameters {
    pub fn kind(&self) -> IteratorKind {
        match self {
            IteratorParameters::Raster(_) => IteratorKind::Raster,
            IteratorParameters::Stare(_) => IteratorKind::Stare,
            IteratorParameters::Jiggle(_) => IteratorKind::Jiggle,
            IteratorParameters::Pointing(_) => IteratorKind::Pointing,
            IteratorParameters::Focus(_) => IteratorKind::Focus,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            IteratorParameters::Raster(raster) => {
                if raster.dx.value() <= 0.0 || raster.dy.value() <= 0.0 {
                    return Err(Error::unrecognized(format!(
                        "Raster sample spacing must be positive, got dx={}, dy={}",
                        raster.dx, raster.dy
                    )));
                }
                if raster.width.value() < 0.0 || raster.height.value() < 0.0 {
                    return Err(Error::unrecognized(format!(
                        "Raster map size must not be negative, got {} x {}",
                        raster.width, raster.height
                    )));
                }
                if let Some(velocity) = raster.scan_velocity {
                    if velocity <= 0.0 {
                        return Err(Error::unrecognized(format!(
                            "Raster scan velocity must be positive, got {velocity} arcsec/s"
                        )));
                    }
                }
            }
            IteratorParameters::Stare(stare) => {
                if stare.offsets.is_empty() {
                    return Err(Error::unrecognized("Stare observation without offsets"));
                }
            }
            IteratorParameters::Jiggle(jiggle) | IteratorParameters::Pointing(jiggle) => {
                if jiggle.pattern.is_empty() {
                    return Err(Error::unrecognized(format!(
                        "Jiggle pattern '{}' has no points",
                        jiggle.pattern.name
                    )));
                }
                if let Some(per_chop) = jiggle.jiggles_per_chop {
                    if per_chop == 0 || per_chop as usize > jiggle.pattern.len() {
                        return Err(Error::unrecognized(format!(
                            "Jiggles per chop must be in 1..={}, got {per_chop}",
                            jiggle.pattern.len()
                        )));
                    }
                }
            }
            IteratorParameters::Focus(focus) => {
                if focus.steps == 0 {
                    return Err(Error::unrecognized("Focus observation without steps"));
                }
            }
        }
        Ok(())
    }
}

/// Immutable description of one unrolled observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationDescriptor {
    parameters: IteratorParameters,
    switching: SwitchingKind,
    subsystems: Vec<SubsystemRequest>,
    integration_repeats: Option<u32>,
    enabled_receptors: Vec<ReceptorId>,
    nyquist: Angle<Arcsec>,
}

impl ObservationDescriptor {
    pub fn builder(
        parameters: IteratorParameters,
        switching: SwitchingKind,
    ) -> ObservationDescriptorBuilder {
        ObservationDescriptorBuilder {
            parameters,
            switching,
            subsystems: vec![],
            integration_repeats: None,
            enabled_receptors: vec![],
            nyquist: None,
        }
    }

    pub fn iterator(&self) -> IteratorKind {
        self.parameters.kind()
    }

    pub fn parameters(&self) -> &IteratorParameters {
        &self.parameters
    }

    pub fn switching(&self) -> &SwitchingKind {
        &self.switching
    }

    pub fn subsystems(&self) -> &[SubsystemRequest] {
        &self.subsystems
    }

    /// Requested repeats of the whole integration, 1 if not given.
    pub fn integration_repeats(&self) -> u32 {
        self.integration_repeats.unwrap_or(1)
    }

    pub fn enabled_receptors(&self) -> &[ReceptorId] {
        &self.enabled_receptors
    }

    /// Half the diffraction-limited beam size.
    pub fn nyquist(&self) -> Angle<Arcsec> {
        self.nyquist
    }
}

pub struct ObservationDescriptorBuilder {
    parameters: IteratorParameters,
    switching: SwitchingKind,
    subsystems: Vec<SubsystemRequest>,
    integration_repeats: Option<u32>,
    enabled_receptors: Vec<ReceptorId>,
    nyquist: Option<Angle<Arcsec>>,
}

impl ObservationDescriptorBuilder {
    pub fn subsystem(mut self, subsystem: SubsystemRequest) -> Self {
        self.subsystems.push(subsystem);
        self
    }

    pub fn integration_repeats(mut self, repeats: u32) -> Self {
        self.integration_repeats = Some(repeats);
        self
    }

    pub fn receptors<I, R>(mut self, receptors: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ReceptorId>,
    {
        self.enabled_receptors
            .extend(receptors.into_iter().map(Into::into));
        self
    }

    pub fn nyquist(mut self, nyquist: Angle<Arcsec>) -> Self {
        self.nyquist = Some(nyquist);
        self
    }

    pub fn build(self) -> Result<ObservationDescriptor> {
        self.parameters.validate()?;
        if self.subsystems.is_empty() {
            return Err(Error::unrecognized("Observation requests no spectral subsystems"));
        }
        for (i, subsystem) in self.subsystems.iter().enumerate() {
            if subsystem.channels == 0 || subsystem.bandwidth.value() <= 0.0 {
                return Err(Error::unrecognized(format!(
                    "Subsystem {} requests {} over {} channels",
                    i + 1,
                    subsystem.bandwidth,
                    subsystem.channels
                )));
            }
            if subsystem.overlap.value() < 0.0 {
                return Err(Error::unrecognized(format!(
                    "Subsystem {} has a negative overlap of {}",
                    i + 1,
                    subsystem.overlap
                )));
            }
        }
        if self.enabled_receptors.is_empty() {
            return Err(Error::unrecognized("Observation enables no receptors"));
        }
        if self.integration_repeats == Some(0) {
            return Err(Error::unrecognized("Integration repeat count must be positive"));
        }
        let nyquist = self
            .nyquist
            .ok_or_else(|| Error::unrecognized("Observation has no Nyquist sampling value"))?;
        if nyquist.value() <= 0.0 {
            return Err(Error::unrecognized(format!(
                "Nyquist sampling value must be positive, got {nyquist}"
            )));
        }
        Ok(ObservationDescriptor {
            parameters: self.parameters,
            switching: self.switching,
            subsystems: self.subsystems,
            integration_repeats: self.integration_repeats,
            enabled_receptors: self.enabled_receptors,
            nyquist,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jcmt_units::{degrees, gigahertz, megahertz, seconds};

    fn subsystem() -> SubsystemRequest {
        SubsystemRequest {
            rest_freq: gigahertz(345.796),
            bandwidth: megahertz(250.0),
            channels: 8192,
            overlap: megahertz(0.0),
            if_freq: gigahertz(4.0),
        }
    }

    fn stare(offsets: Vec<Offset>) -> IteratorParameters {
        IteratorParameters::Stare(StareParameters {
            offsets,
            position_angle: degrees(0.0),
            seconds_per_point: seconds(10.0),
        })
    }

    #[test]
    fn test_parse_iterator() {
        assert_eq!("rasterPixel".parse::<IteratorKind>().unwrap(), IteratorKind::Raster);
        assert_eq!("grid".parse::<IteratorKind>().unwrap(), IteratorKind::Stare);
        let err = "spiral".parse::<IteratorKind>().unwrap_err();
        assert!(matches!(err, Error::UnrecognizedInput(_)));
    }

    #[test]
    fn test_parse_switching() {
        assert_eq!("Position".parse::<SwitchingKind>().unwrap(), SwitchingKind::Position);
        assert_eq!(
            "Frequency-Slow".parse::<SwitchingKind>().unwrap(),
            SwitchingKind::Frequency("Frequency-Slow".to_string())
        );
        assert_eq!("".parse::<SwitchingKind>().unwrap(), SwitchingKind::None);
        assert!(matches!(
            "Wobble".parse::<SwitchingKind>(),
            Err(Error::UnrecognizedInput(_))
        ));
    }

    #[test]
    fn test_rotation_roundtrip() {
        let offset = Offset::new(30.0, -12.5);
        let pa = degrees(37.0);
        let back = offset.rotate_into(pa).rotate_from(pa);
        assert!((back.x.value() - 30.0).abs() < 1e-9);
        assert!((back.y.value() + 12.5).abs() < 1e-9);

        let rotated = Offset::new(10.0, 0.0).rotate_into(degrees(90.0));
        assert!(rotated.x.value().abs() < 1e-9);
        assert!((rotated.y.value() + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_named_patterns() {
        let pattern = JigglePattern::named("3x3", arcsec(7.5)).unwrap();
        assert_eq!(pattern.len(), 9);
        assert_eq!(pattern.points[0], Offset::new(-7.5, -7.5));
        assert_eq!(JigglePattern::named("HARP4", arcsec(7.5)).unwrap().len(), 16);
        assert_eq!(JigglePattern::named("5pt", arcsec(10.0)).unwrap().len(), 5);
        assert!(matches!(
            JigglePattern::named("7x7", arcsec(1.0)),
            Err(Error::UnrecognizedInput(_))
        ));
    }

    #[test]
    fn test_build() {
        let descriptor = ObservationDescriptor::builder(
            stare(vec![Offset::new(0.0, 0.0)]),
            SwitchingKind::Position,
        )
        .subsystem(subsystem())
        .receptors(["H00", "H01"])
        .nyquist(arcsec(7.0))
        .build()
        .unwrap();
        assert_eq!(descriptor.iterator(), IteratorKind::Stare);
        assert_eq!(descriptor.integration_repeats(), 1);
        assert_eq!(descriptor.enabled_receptors().len(), 2);
        assert_eq!(&*descriptor.enabled_receptors()[1], "H01");
    }

    #[test]
    fn test_build_rejects_missing_fields() {
        let no_nyquist = ObservationDescriptor::builder(
            stare(vec![Offset::new(0.0, 0.0)]),
            SwitchingKind::Position,
        )
        .subsystem(subsystem())
        .receptors(["H00"])
        .build();
        assert!(matches!(no_nyquist, Err(Error::UnrecognizedInput(_))));

        let no_offsets = ObservationDescriptor::builder(stare(vec![]), SwitchingKind::Position)
            .subsystem(subsystem())
            .receptors(["H00"])
            .nyquist(arcsec(7.0))
            .build();
        assert!(matches!(no_offsets, Err(Error::UnrecognizedInput(_))));

        let no_receptors = ObservationDescriptor::builder(
            stare(vec![Offset::new(0.0, 0.0)]),
            SwitchingKind::Position,
        )
        .subsystem(subsystem())
        .nyquist(arcsec(7.0))
        .build();
        assert!(matches!(no_receptors, Err(Error::UnrecognizedInput(_))));
    }
}
