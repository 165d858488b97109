// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::{quantity, unit};

quantity!(Frequency);
unit!(Hertz, "Hz");

pub const fn hertz<T>(value: T) -> Frequency<Hertz, T> {
    Frequency { value, unit: Hertz }
}

pub fn megahertz(value: f64) -> Frequency<Hertz> {
    hertz(value * 1e6)
}

pub fn gigahertz(value: f64) -> Frequency<Hertz> {
    hertz(value * 1e9)
}

impl Frequency<Hertz> {
    /// Round down to the nearest integer multiple of `step`.
    pub fn floor_to_multiple(self, step: Frequency<Hertz>) -> Frequency<Hertz> {
        step * (self / step).floor()
    }

    /// Round to the nearest integer multiple of `step`.
    pub fn round_to_multiple(self, step: Frequency<Hertz>) -> Frequency<Hertz> {
        step * (self / step).round()
    }

    pub fn abs(self) -> Frequency<Hertz> {
        hertz(self.value.abs())
    }
}
