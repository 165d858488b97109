// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::{quantity, unit};

quantity!(Angle);
unit!(Arcsec, "arcsec");
unit!(Degree, "deg");

pub const fn arcsec<T>(value: T) -> Angle<Arcsec, T> {
    Angle {
        value,
        unit: Arcsec,
    }
}

pub const fn degrees<T>(value: T) -> Angle<Degree, T> {
    Angle {
        value,
        unit: Degree,
    }
}

impl Angle<Arcsec> {
    pub fn to_degrees(self) -> Angle<Degree> {
        degrees(self.value / 3600.0)
    }

    pub fn abs(self) -> Angle<Arcsec> {
        arcsec(self.value.abs())
    }
}

impl Angle<Degree> {
    pub fn to_arcsec(self) -> Angle<Arcsec> {
        arcsec(self.value * 3600.0)
    }

    pub fn to_radians(self) -> f64 {
        self.value.to_radians()
    }

    /// Sine and cosine of the angle.
    pub fn sin_cos(self) -> (f64, f64) {
        self.to_radians().sin_cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion() {
        assert_eq!(degrees(1.0).to_arcsec(), arcsec(3600.0));
        assert_eq!(arcsec(1800.0).to_degrees(), degrees(0.5));
    }

    #[test]
    fn test_sin_cos() {
        let (s, c) = degrees(90.0).sin_cos();
        assert!((s - 1.0).abs() < 1e-12);
        assert!(c.abs() < 1e-12);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", arcsec(7.5)), "7.5 arcsec");
        assert_eq!(format!("{}", degrees(45.0)), "45.0 deg");
    }
}
