// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use jcmt_log::{debug, info, warn};

use crate::Result;
use crate::config::Configuration;
use crate::descriptor::ObservationDescriptor;
use crate::hardware_map::HardwareMap;
use crate::passes::budget_timing::budget_timing;
use crate::passes::classify_mode::classify_mode;
use crate::passes::map_correlator::map_correlator;
use crate::passes::map_cubes::map_cubes;
use crate::passes::plan_spectral::plan_spectral;
use crate::settings::TranslatorSettings;

/// Runs the translation passes over observation descriptors.
///
/// The hardware map is shared read-only, so one translator (or clones of
/// it) can serve any number of concurrent translations.
#[derive(Debug, Clone)]
pub struct Translator {
    settings: TranslatorSettings,
    hardware_map: Arc<HardwareMap>,
}

impl Translator {
    /// Create a translator. Settings are sanitized and every replaced value
    /// is logged as a warning.
    pub fn new(mut settings: TranslatorSettings, hardware_map: Arc<HardwareMap>) -> Self {
        for change in settings.sanitize() {
            warn!(
                "Translator setting `{}` is sanitized from {} to {}. Reason: {}",
                change.field.to_uppercase(),
                change.original,
                change.sanitized,
                change.reason
            );
        }
        Translator {
            settings,
            hardware_map,
        }
    }

    pub fn settings(&self) -> &TranslatorSettings {
        &self.settings
    }

    pub fn translate(&self, descriptor: &ObservationDescriptor) -> Result<Configuration> {
        let mode = classify_mode(descriptor.iterator(), descriptor.switching())?;
        debug!("Translating {} observation", mode);
        let spectral = plan_spectral(descriptor.subsystems(), &self.settings)?;
        let hardware = map_correlator(
            &spectral,
            &self.hardware_map,
            descriptor.enabled_receptors(),
        )?;
        let cubes = map_cubes(descriptor, &spectral, &self.settings)?;
        let timing = budget_timing(descriptor, &mode, &cubes, &self.settings)?;
        Ok(Configuration::assemble(
            mode, &spectral, &hardware, &cubes, &timing,
        ))
    }

    /// Translate each descriptor independently; a failure only affects its
    /// own entry.
    pub fn translate_batch<'a>(
        &self,
        descriptors: impl IntoIterator<Item = &'a ObservationDescriptor>,
    ) -> Vec<Result<Configuration>> {
        descriptors
            .into_iter()
            .enumerate()
            .map(|(index, descriptor)| {
                self.translate(descriptor).inspect_err(|err| {
                    info!("Observation {} failed to translate: {}", index, err);
                })
            })
            .collect()
    }
}
