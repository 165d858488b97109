// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Module for defining settings for the translator.
use jcmt_units::{Duration, Frequency, Hertz, Second, megahertz, seconds};

#[derive(Debug, Clone)]
pub struct SanitizationChange {
    pub field: &'static str,
    pub original: String,
    pub sanitized: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct TranslatorSettings {
    step_time: Duration<Second>,
    cal_time: Duration<Second>,
    max_time_between_nods: Duration<Second>,
    lo2_step: Frequency<Hertz>,
    bandwidth_rounding: Frequency<Hertz>,
    grid_tolerance_factor: f64,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        TranslatorSettings {
            step_time: seconds(0.1),
            cal_time: seconds(1.2),
            max_time_between_nods: seconds(60.0),
            lo2_step: megahertz(0.2),
            bandwidth_rounding: megahertz(10.0),
            grid_tolerance_factor: 0.2,
        }
    }
}

impl TranslatorSettings {
    pub fn new(
        step_time: Duration<Second>,
        cal_time: Duration<Second>,
        max_time_between_nods: Duration<Second>,
        lo2_step: Frequency<Hertz>,
        bandwidth_rounding: Frequency<Hertz>,
        grid_tolerance_factor: f64,
    ) -> Self {
        TranslatorSettings {
            step_time,
            cal_time,
            max_time_between_nods,
            lo2_step,
            bandwidth_rounding,
            grid_tolerance_factor,
        }
    }

    /// Step time of every mode whose step time is not derived from the
    /// request.
    pub fn step_time(&self) -> Duration<Second> {
        self.step_time
    }

    /// Interval between calibration samples.
    pub fn cal_time(&self) -> Duration<Second> {
        self.cal_time
    }

    /// Longest allowed time spent in one nod position.
    pub fn max_time_between_nods(&self) -> Duration<Second> {
        self.max_time_between_nods
    }

    /// Quantization step of the second local oscillator synthesizers.
    pub fn lo2_step(&self) -> Frequency<Hertz> {
        self.lo2_step
    }

    pub fn bandwidth_rounding(&self) -> Frequency<Hertz> {
        self.bandwidth_rounding
    }

    /// Fraction of the Nyquist value within which two offsets are
    /// considered to fall on the same grid position.
    pub fn grid_tolerance_factor(&self) -> f64 {
        self.grid_tolerance_factor
    }

    /// Replace values that cannot be used by the translator with the
    /// defaults and report every replacement.
    ///
    /// A non-positive step time is not corrected here: the timing pass
    /// refuses it when it constructs the budget.
    pub fn sanitize(&mut self) -> Vec<SanitizationChange> {
        let defaults = TranslatorSettings::default();
        let mut changes = vec![];

        let duration_fields = [
            ("cal_time", &mut self.cal_time, defaults.cal_time),
            (
                "max_time_between_nods",
                &mut self.max_time_between_nods,
                defaults.max_time_between_nods,
            ),
        ];
        for (field, value, default) in duration_fields {
            if !is_positive(value.value()) {
                changes.push(SanitizationChange {
                    field,
                    original: value.to_string(),
                    sanitized: default.to_string(),
                    reason: "Must be positive.".to_string(),
                });
                *value = default;
            }
        }

        let frequency_fields = [
            ("lo2_step", &mut self.lo2_step, defaults.lo2_step),
            (
                "bandwidth_rounding",
                &mut self.bandwidth_rounding,
                defaults.bandwidth_rounding,
            ),
        ];
        for (field, value, default) in frequency_fields {
            if !is_positive(value.value()) {
                changes.push(SanitizationChange {
                    field,
                    original: value.to_string(),
                    sanitized: default.to_string(),
                    reason: "Must be positive.".to_string(),
                });
                *value = default;
            }
        }

        if !(is_positive(self.grid_tolerance_factor) && self.grid_tolerance_factor <= 0.5) {
            let sanitized = if self.grid_tolerance_factor > 0.5 {
                0.5
            } else {
                defaults.grid_tolerance_factor
            };
            changes.push(SanitizationChange {
                field: "grid_tolerance_factor",
                original: self.grid_tolerance_factor.to_string(),
                sanitized: sanitized.to_string(),
                reason: "Must be in the range (0, 0.5].".to_string(),
            });
            self.grid_tolerance_factor = sanitized;
        }
        changes
    }
}

fn is_positive(value: f64) -> bool {
    value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_need_no_sanitization() {
        let mut settings = TranslatorSettings::default();
        assert!(settings.sanitize().is_empty());
        assert_eq!(settings.lo2_step(), megahertz(0.2));
        assert_eq!(settings.step_time(), seconds(0.1));
    }

    #[test]
    fn test_sanitization_change() {
        let mut settings = TranslatorSettings::new(
            seconds(0.1),
            seconds(-1.0),
            seconds(60.0),
            megahertz(0.0),
            megahertz(10.0),
            0.9,
        );
        let changes = settings.sanitize();
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].field, "cal_time");
        assert_eq!(changes[0].original, seconds(-1.0).to_string());
        assert_eq!(settings.cal_time(), seconds(1.2));
        assert_eq!(changes[1].field, "lo2_step");
        assert_eq!(settings.lo2_step(), megahertz(0.2));
        assert_eq!(changes[2].field, "grid_tolerance_factor");
        assert_eq!(settings.grid_tolerance_factor(), 0.5);
    }

    #[test]
    fn test_step_time_is_left_for_the_timing_pass() {
        let mut settings = TranslatorSettings::new(
            seconds(0.0),
            seconds(1.2),
            seconds(60.0),
            megahertz(0.2),
            megahertz(10.0),
            0.2,
        );
        assert!(settings.sanitize().is_empty());
        assert_eq!(settings.step_time(), seconds(0.0));
    }
}
