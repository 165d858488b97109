// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Route the spectral windows of every enabled receptor through the wired
//! correlator hardware.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use jcmt_log::diagnostic;
use jcmt_units::{Frequency, Hertz};

use crate::bandwidth_mode::strip_channel_count;
use crate::descriptor::ReceptorId;
use crate::hardware_map::{HardwareMap, HardwareSlot};
use crate::passes::plan_spectral::{SpectralPlan, SpectralWindowId};
use crate::{Error, Result};

/// One spectral window of one receptor routed through one hardware slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotAssignment {
    pub receptor: ReceptorId,
    pub spw_id: SpectralWindowId,
    pub slot: HardwareSlot,
    /// Bandwidth label of the window, e.g. `1GHzx2048`.
    pub bandwidth_label: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HardwareAssignment {
    pub assignments: Vec<SlotAssignment>,
    /// Correlator module id to bandwidth label.
    pub cm_modes: BTreeMap<u32, String>,
    /// Quadrant id to subband mode, including unused quadrants.
    pub quadrant_modes: BTreeMap<u32, String>,
    /// Down-converter id to bandwidth without channel count, upper-cased.
    pub dcm_bandwidths: BTreeMap<u32, String>,
    pub synth_windows: BTreeMap<u32, SpectralWindowId>,
    /// Quantized LO2 per synthesizer slot.
    pub lo2: BTreeMap<u32, Frequency<Hertz>>,
}

/// Record `value` under `key` unless a different value is already there, in
/// which case the existing value is returned.
fn claim<K: Ord, V: PartialEq + Clone>(
    table: &mut BTreeMap<K, V>,
    key: K,
    value: V,
) -> std::result::Result<(), V> {
    match table.entry(key) {
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
        Entry::Occupied(entry) if *entry.get() == value => Ok(()),
        Entry::Occupied(entry) => Err(entry.get().clone()),
    }
}

impl HardwareAssignment {
    fn assign(&mut self, assignment: SlotAssignment) -> Result<()> {
        let SlotAssignment {
            receptor,
            spw_id,
            slot,
            bandwidth_label,
        } = &assignment;

        claim(&mut self.cm_modes, slot.cm_id, bandwidth_label.clone()).map_err(|existing| {
            Error::conflict(format!(
                "Correlator module {} already runs {existing}, cannot run {bandwidth_label} for {spw_id} of receptor {receptor}",
                slot.cm_id
            ))
        })?;
        claim(
            &mut self.quadrant_modes,
            slot.quadrant,
            bandwidth_label.clone(),
        )
        .map_err(|existing| {
            Error::conflict(format!(
                "Quadrant {} is already in subband mode {existing}, cannot switch to {bandwidth_label} for {spw_id} of receptor {receptor}",
                slot.quadrant
            ))
        })?;
        let dcm_bandwidth = strip_channel_count(bandwidth_label).to_uppercase();
        claim(&mut self.dcm_bandwidths, slot.dcm_id, dcm_bandwidth.clone()).map_err(
            |existing| {
                Error::conflict(format!(
                    "Down-converter {} is already set to {existing}, cannot set {dcm_bandwidth} for {spw_id} of receptor {receptor}",
                    slot.dcm_id
                ))
            },
        )?;
        claim(&mut self.synth_windows, slot.synth, *spw_id).map_err(|existing| {
            Error::conflict(format!(
                "Synthesizer slot {} is claimed by both {existing} and {spw_id} (receptor {receptor})",
                slot.synth
            ))
        })?;

        diagnostic!(
            "{} of {} on CM {} DCM {} quadrant {} synth {}",
            spw_id,
            receptor,
            slot.cm_id,
            slot.dcm_id,
            slot.quadrant,
            slot.synth
        );
        self.assignments.push(assignment);
        Ok(())
    }

    pub fn for_receptor<'a>(
        &'a self,
        receptor: &'a ReceptorId,
    ) -> impl Iterator<Item = &'a SlotAssignment> + 'a {
        self.assignments
            .iter()
            .filter(move |assignment| assignment.receptor == *receptor)
    }
}

/// Pass to assign hardware slots to the spectral windows of every enabled
/// receptor.
pub fn map_correlator(
    spectral: &SpectralPlan,
    map: &HardwareMap,
    receptors: &[ReceptorId],
) -> Result<HardwareAssignment> {
    let mut windows: Vec<_> = spectral
        .subbands()
        .map(|(subsystem, subband)| (subband.spw_id, subsystem.bandwidth_label.as_str()))
        .collect();
    windows.sort_by_key(|(spw_id, _)| *spw_id);

    let mut result = HardwareAssignment::default();
    for receptor in receptors {
        let slots = map.slots(receptor).ok_or_else(|| {
            Error::unrecognized(format!(
                "Receptor '{receptor}' is not in the correlator wiring map"
            ))
        })?;
        if windows.len() > slots.len() {
            return Err(Error::ResourceExhaustion {
                receptor: receptor.to_string(),
                requested: windows.len(),
                available: slots.len(),
            });
        }
        for ((spw_id, label), slot) in windows.iter().zip(slots) {
            result.assign(SlotAssignment {
                receptor: receptor.clone(),
                spw_id: *spw_id,
                slot: slot.clone(),
                bandwidth_label: label.to_string(),
            })?;
        }
    }

    for (_, slot) in map.iter_slots() {
        result
            .quadrant_modes
            .entry(slot.quadrant)
            .or_insert_with(|| slot.sb_mode.clone());
    }

    let lo2_by_window = spectral.lo2_by_window();
    for (synth, spw_id) in &result.synth_windows {
        let lo2 = lo2_by_window.get(spw_id).ok_or_else(|| {
            Error::invariant(format!("No LO2 was planned for {spw_id} on synthesizer {synth}"))
        })?;
        result.lo2.insert(*synth, *lo2);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bandwidth_mode::BandwidthMode;
    use crate::descriptor::SubsystemRequest;
    use crate::hardware_map::test_support::harp_like_map;
    use crate::passes::plan_spectral::plan_spectral;
    use crate::settings::TranslatorSettings;
    use indexmap::IndexMap;
    use jcmt_units::{gigahertz, hertz};
    use proptest::prelude::*;

    const MODES: [(f64, u32); 3] = [(1e9, 2048), (500e6, 4096), (250e6, 8192)];

    fn plan(modes: &[(f64, u32)]) -> SpectralPlan {
        let requests: Vec<_> = modes
            .iter()
            .map(|(bandwidth, channels)| SubsystemRequest {
                rest_freq: gigahertz(345.796),
                bandwidth: hertz(*bandwidth),
                channels: *channels,
                overlap: hertz(0.0),
                if_freq: gigahertz(4.0),
            })
            .collect();
        plan_spectral(&requests, &TranslatorSettings::default()).unwrap()
    }

    fn receptors(names: &[&str]) -> Vec<ReceptorId> {
        names.iter().map(|name| ReceptorId::from(*name)).collect()
    }

    fn slot(cm_id: u32, quadrant: u32, synth: u32) -> HardwareSlot {
        HardwareSlot {
            cm_id,
            dcm_id: cm_id,
            quadrant,
            sb_mode: "1GHzx2048".to_string(),
            synth,
        }
    }

    #[test]
    fn test_every_table_mode_is_plannable() {
        let spectral = plan(&MODES);
        let planned: Vec<_> = spectral
            .subsystems
            .iter()
            .map(|subsystem| subsystem.bandwidth_mode)
            .collect();
        assert_eq!(planned, BandwidthMode::ALL.to_vec());
    }

    #[test]
    fn test_windows_take_slots_in_order() {
        let map = harp_like_map(16, 4);
        let spectral = plan(&[MODES[2], MODES[0]]);
        let result = map_correlator(&spectral, &map, &receptors(&["H00", "H05"])).unwrap();
        assert_eq!(result.assignments.len(), 4);

        let h05 = ReceptorId::from("H05");
        let h05: Vec<_> = result.for_receptor(&h05).collect();
        assert_eq!(h05[0].spw_id.to_string(), "SPW1");
        assert_eq!(h05[0].slot.cm_id, 20);
        assert_eq!(h05[1].spw_id.to_string(), "SPW2");
        assert_eq!(h05[1].bandwidth_label, "1GHzx2048");

        assert_eq!(result.cm_modes[&0], "250MHzx8192");
        assert_eq!(result.dcm_bandwidths[&1], "1GHZ");
        assert_eq!(result.synth_windows[&0].to_string(), "SPW1");
        assert_eq!(result.lo2[&0], gigahertz(1.875));
        assert_eq!(result.lo2[&1], gigahertz(1.5));
        // Unused quadrants keep their default mode.
        assert_eq!(result.quadrant_modes[&2], "1GHzx2048");
        assert_eq!(result.quadrant_modes[&4], "250MHzx8192");
    }

    #[test]
    fn test_too_many_windows() {
        let map = harp_like_map(2, 2);
        let spectral = plan(&[MODES[0], MODES[1], MODES[2]]);
        let err = map_correlator(&spectral, &map, &receptors(&["H01"])).unwrap_err();
        match err {
            Error::ResourceExhaustion {
                receptor,
                requested,
                available,
            } => {
                assert_eq!(receptor, "H01");
                assert_eq!((requested, available), (3, 2));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unknown_receptor() {
        let map = harp_like_map(2, 2);
        let err = map_correlator(&plan(&[MODES[0]]), &map, &receptors(&["W00"])).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedInput(_)));
    }

    #[test]
    fn test_quadrant_conflict() {
        let mut wiring = IndexMap::new();
        wiring.insert(ReceptorId::from("A"), vec![slot(0, 0, 0), slot(1, 1, 1)]);
        wiring.insert(ReceptorId::from("B"), vec![slot(2, 1, 0), slot(3, 0, 1)]);
        let map = HardwareMap::new(wiring);
        let spectral = plan(&[MODES[0], MODES[2]]);
        let err = map_correlator(&spectral, &map, &receptors(&["A", "B"])).unwrap_err();
        assert!(matches!(err, Error::ResourceConflict(_)));
        assert!(err.to_string().contains("Quadrant 1"));
    }

    #[test]
    fn test_synth_double_claim() {
        let mut wiring = IndexMap::new();
        wiring.insert(ReceptorId::from("A"), vec![slot(0, 0, 0), slot(1, 1, 1)]);
        wiring.insert(ReceptorId::from("B"), vec![slot(2, 2, 1), slot(3, 3, 0)]);
        let map = HardwareMap::new(wiring);
        let spectral = plan(&[MODES[0], MODES[0]]);
        let err = map_correlator(&spectral, &map, &receptors(&["A", "B"])).unwrap_err();
        assert!(matches!(err, Error::ResourceConflict(_)));
        assert!(err.to_string().contains("Synthesizer slot 1"));
    }

    #[test]
    fn test_same_window_may_share_a_synth() {
        let map = harp_like_map(8, 2);
        let spectral = plan(&[MODES[1]]);
        let all: Vec<_> = map.receptors().cloned().collect();
        let result = map_correlator(&spectral, &map, &all).unwrap();
        assert_eq!(result.synth_windows.len(), 1);
        assert_eq!(result.lo2.len(), 1);
    }

    fn arbitrary_map() -> impl Strategy<Value = HardwareMap> {
        let any_slot =
            (0u32..4, 0u32..4, 0u32..4).prop_map(|(cm, quadrant, synth)| slot(cm, quadrant, synth));
        prop::collection::vec(prop::collection::vec(any_slot, 1..4), 1..4).prop_map(|receptors| {
            HardwareMap::new(
                receptors
                    .into_iter()
                    .enumerate()
                    .map(|(i, slots)| (ReceptorId::from(format!("R{i}")), slots))
                    .collect(),
            )
        })
    }

    proptest! {
        #[test]
        fn one_bandwidth_mode_per_correlator_module(
            map in arbitrary_map(),
            modes in prop::collection::vec(prop::sample::select(MODES.to_vec()), 1..4),
        ) {
            let spectral = plan(&modes);
            let all: Vec<_> = map.receptors().cloned().collect();
            match map_correlator(&spectral, &map, &all) {
                Ok(result) => {
                    for assignment in &result.assignments {
                        prop_assert_eq!(
                            &result.cm_modes[&assignment.slot.cm_id],
                            &assignment.bandwidth_label
                        );
                        prop_assert_eq!(
                            &result.quadrant_modes[&assignment.slot.quadrant],
                            &assignment.bandwidth_label
                        );
                    }
                    for synth in result.synth_windows.keys() {
                        prop_assert!(result.lo2.contains_key(synth));
                    }
                }
                Err(err) => {
                    let expected = matches!(
                        err,
                        Error::ResourceConflict(_) | Error::ResourceExhaustion { .. }
                    );
                    prop_assert!(expected, "unexpected error {:?}", err);
                }
            }
        }
    }
}
