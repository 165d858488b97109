// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::Serialize;

use crate::descriptor::{IteratorKind, SwitchingKind};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingMode {
    Raster,
    Grid,
    Jiggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchingMode {
    Pssw,
    Chop,
    Freqsw,
    #[serde(rename = "self")]
    SelfSwitch,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObsType {
    Science,
    Pointing,
    Focus,
    Skydip,
    Flatfield,
}

impl MappingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingMode::Raster => "raster",
            MappingMode::Grid => "grid",
            MappingMode::Jiggle => "jiggle",
        }
    }
}

impl SwitchingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchingMode::Pssw => "pssw",
            SwitchingMode::Chop => "chop",
            SwitchingMode::Freqsw => "freqsw",
            SwitchingMode::SelfSwitch => "self",
            SwitchingMode::None => "none",
        }
    }
}

impl ObsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObsType::Science => "science",
            ObsType::Pointing => "pointing",
            ObsType::Focus => "focus",
            ObsType::Skydip => "skydip",
            ObsType::Flatfield => "flatfield",
        }
    }
}

/// Observing mode derived from the iterator and switching scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ModeSummary {
    pub mapping: MappingMode,
    pub switching: SwitchingMode,
    pub obs_type: ObsType,
}

impl ModeSummary {
    const fn new(mapping: MappingMode, switching: SwitchingMode, obs_type: ObsType) -> Self {
        ModeSummary {
            mapping,
            switching,
            obs_type,
        }
    }

    /// Chopped jiggle maps, including pointing and focus observations.
    pub fn is_chop_jiggle(&self) -> bool {
        self.mapping == MappingMode::Jiggle && self.switching == SwitchingMode::Chop
    }
}

impl fmt::Display for ModeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.mapping.as_str(),
            self.switching.as_str(),
            self.obs_type.as_str()
        )
    }
}

fn unsupported(iterator: IteratorKind, switching: &SwitchingKind) -> Error {
    Error::unsupported(format!(
        "Switching mode '{switching}' is not supported with the {iterator} iterator"
    ))
}

fn not_yet_supported(iterator: IteratorKind, switching: &SwitchingKind) -> Error {
    Error::unsupported(format!(
        "{iterator} with switching mode '{switching}' is not yet supported"
    ))
}

/// Classify an observation into its mapping mode, switching mode and
/// observation type.
///
/// Pointing and focus observations are always chopped jiggles; the supplied
/// switching mode is ignored for them.
pub fn classify_mode(iterator: IteratorKind, switching: &SwitchingKind) -> Result<ModeSummary> {
    use MappingMode as M;
    use ObsType as O;
    use SwitchingMode as S;

    match iterator {
        IteratorKind::Raster => match switching {
            SwitchingKind::Position => Ok(ModeSummary::new(M::Raster, S::Pssw, O::Science)),
            SwitchingKind::Chop => Err(not_yet_supported(iterator, switching)),
            _ => Err(unsupported(iterator, switching)),
        },
        IteratorKind::Pointing => Ok(ModeSummary::new(M::Jiggle, S::Chop, O::Pointing)),
        IteratorKind::Focus => Ok(ModeSummary::new(M::Jiggle, S::Chop, O::Focus)),
        IteratorKind::Stare => match switching {
            SwitchingKind::Position => Ok(ModeSummary::new(M::Grid, S::Pssw, O::Science)),
            SwitchingKind::Chop | SwitchingKind::Beam => {
                Ok(ModeSummary::new(M::Jiggle, S::Chop, O::Science))
            }
            _ => Err(unsupported(iterator, switching)),
        },
        IteratorKind::Jiggle => match switching {
            SwitchingKind::Chop | SwitchingKind::Beam => {
                Ok(ModeSummary::new(M::Jiggle, S::Chop, O::Science))
            }
            SwitchingKind::Frequency(_) => Ok(ModeSummary::new(M::Jiggle, S::Freqsw, O::Science)),
            SwitchingKind::Position => Err(not_yet_supported(iterator, switching)),
            _ => Err(unsupported(iterator, switching)),
        },
    }
}

/// Classify from the science-program names of iterator and switching mode.
///
/// The switching name is not parsed for pointing and focus.
pub fn classify_mode_names(iterator: &str, switching: &str) -> Result<ModeSummary> {
    let iterator: IteratorKind = iterator.parse()?;
    let switching = match iterator {
        IteratorKind::Pointing | IteratorKind::Focus => SwitchingKind::None,
        _ => switching.parse()?,
    };
    classify_mode(iterator, &switching)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ObsType as O;

    const ALL_ITERATORS: [IteratorKind; 5] = [
        IteratorKind::Raster,
        IteratorKind::Stare,
        IteratorKind::Jiggle,
        IteratorKind::Pointing,
        IteratorKind::Focus,
    ];

    fn all_switching() -> Vec<SwitchingKind> {
        vec![
            SwitchingKind::Position,
            SwitchingKind::Chop,
            SwitchingKind::Beam,
            SwitchingKind::Frequency("Frequency-Slow".to_string()),
            SwitchingKind::Frequency("Frequency-Fast".to_string()),
            SwitchingKind::None,
        ]
    }

    #[test]
    fn test_supported_combinations() {
        let cases = [
            ("raster", "Position", "raster_pssw_science"),
            ("stare", "Position", "grid_pssw_science"),
            ("stare", "Chop", "jiggle_chop_science"),
            ("grid", "Beam", "jiggle_chop_science"),
            ("jiggle", "Chop", "jiggle_chop_science"),
            ("jiggle", "Beam", "jiggle_chop_science"),
            ("jiggle", "Frequency-Slow", "jiggle_freqsw_science"),
            ("pointing", "Position", "jiggle_chop_pointing"),
            ("focus", "None", "jiggle_chop_focus"),
        ];
        for (iterator, switching, expected) in cases {
            let mode = classify_mode_names(iterator, switching).unwrap();
            assert_eq!(mode.to_string(), expected, "{iterator} + {switching}");
        }
    }

    #[test]
    fn test_not_yet_supported() {
        for (iterator, switching) in [("raster", "Chop"), ("jiggle", "Position")] {
            let err = classify_mode_names(iterator, switching).unwrap_err();
            assert!(matches!(err, Error::UnsupportedCombination(_)));
            assert!(err.to_string().contains("not yet supported"));
        }
    }

    #[test]
    fn test_other_combinations_fail() {
        for (iterator, switching) in [
            ("raster", "Beam"),
            ("raster", "Frequency-Fast"),
            ("raster", "None"),
            ("stare", "Frequency-Slow"),
            ("stare", "None"),
            ("jiggle", "None"),
        ] {
            let err = classify_mode_names(iterator, switching).unwrap_err();
            assert!(matches!(err, Error::UnsupportedCombination(_)));
        }
    }

    #[test]
    fn test_unrecognized_names() {
        assert!(matches!(
            classify_mode_names("scan", "Position"),
            Err(Error::UnrecognizedInput(_))
        ));
        assert!(matches!(
            classify_mode_names("jiggle", "Nod"),
            Err(Error::UnrecognizedInput(_))
        ));
    }

    #[test]
    fn test_pointing_and_focus_accept_any_switching_name() {
        for switching in ["Nod", "", "Position"] {
            let pointing = classify_mode_names("pointing", switching).unwrap();
            assert_eq!(pointing.to_string(), "jiggle_chop_pointing");
            let focus = classify_mode_names("focus", switching).unwrap();
            assert_eq!(focus.to_string(), "jiggle_chop_focus");
        }
    }

    #[test]
    fn test_pointing_and_focus_ignore_switching() {
        for switching in all_switching() {
            let pointing = classify_mode(IteratorKind::Pointing, &switching).unwrap();
            assert_eq!(pointing.obs_type, ObsType::Pointing);
            assert!(pointing.is_chop_jiggle());
            let focus = classify_mode(IteratorKind::Focus, &switching).unwrap();
            assert_eq!(focus.obs_type, ObsType::Focus);
            assert!(focus.is_chop_jiggle());
        }
    }

    #[test]
    fn test_every_pair_is_total_or_fails() {
        for iterator in ALL_ITERATORS {
            for switching in all_switching() {
                match classify_mode(iterator, &switching) {
                    Ok(mode) => {
                        assert!(!mode.mapping.as_str().is_empty());
                        assert!(!mode.switching.as_str().is_empty());
                        assert!(!mode.obs_type.as_str().is_empty());
                        assert!(matches!(mode.obs_type, O::Science | O::Pointing | O::Focus));
                    }
                    Err(err) => assert!(matches!(err, Error::UnsupportedCombination(_))),
                }
            }
        }
    }
}
