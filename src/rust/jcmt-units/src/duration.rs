// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::{quantity, unit};

quantity!(Duration);
unit!(Second, "s");

pub const fn seconds<T>(value: T) -> Duration<Second, T> {
    Duration {
        value,
        unit: Second,
    }
}

impl Duration<Second> {
    /// Number of whole `step`s that fit into this duration, rounded to the
    /// nearest integer.
    pub fn steps_of(self, step: Duration<Second>) -> f64 {
        (self / step).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation() {
        let duration: Duration<Second> = 1.2.into();
        assert_eq!(duration.value(), 1.2);
        assert_eq!(Duration::<Second>::from(0.1), seconds(0.1));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", seconds(0.1)), "0.1 s");
        assert_eq!(format!("{}", seconds(0.30000000000000004)), "0.3 s");
        assert_eq!(format!("{:#}", seconds(2.5)), "2.5 s");
    }

    #[test]
    fn test_eq() {
        assert_eq!(seconds(0.0), seconds(-0.0));
        assert_ne!(seconds(1.0), seconds(-1.0));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(seconds(1.0) + seconds(0.5), seconds(1.5));
        assert_eq!(seconds(1.0) * 3.0, seconds(3.0));
        assert_eq!(seconds(3.0) / seconds(1.5), 2.0);
        assert!(seconds(1.0) < seconds(2.0));
    }

    #[test]
    fn test_steps_of() {
        assert_eq!(seconds(1.2).steps_of(seconds(0.1)), 12.0);
        assert_eq!(seconds(1.24).steps_of(seconds(0.5)), 2.0);
    }
}
