// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

pub(crate) fn round_to_significant_digits(x: f64, n: u32) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        let order = x.abs().log10().floor();
        let scale = 10f64.powf((n as f64) - 1.0 - order);
        (x * scale).round() / scale
    }
}

/// Write `value` followed by its unit symbol.
///
/// The plain form keeps one digit less than the float type resolves, so
/// `0.1 + 0.2` prints as `0.3`. The alternate form (`{:#}`) prints the raw
/// value.
pub fn write_quantity<T, U>(f: &mut fmt::Formatter<'_>, value: T, unit: &U) -> fmt::Result
where
    T: num_traits::Float + num_traits::AsPrimitive<f64> + fmt::Display,
    U: fmt::Display,
{
    if f.alternate() {
        fmt::Display::fmt(&value, f)?;
    } else {
        let digits = (-T::epsilon().log10() - T::one()).as_() as u32;
        fmt::Debug::fmt(&round_to_significant_digits(value.as_(), digits), f)?;
    }
    write!(f, " {unit}")
}

/// Same-unit arithmetic of a quantity type: `op(Self, Self) -> Self`.
#[doc(hidden)]
#[macro_export]
macro_rules! __quantity_op {
    ($ident:ident, $trait:ident, $method:ident, $op:tt) => {
        impl<U: std::marker::Copy, T: std::ops::$trait<Output = T> + std::marker::Copy>
            std::ops::$trait for $ident<U, T>
        {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self {
                $ident {
                    value: self.value $op rhs.value,
                    unit: self.unit,
                }
            }
        }
    };
}

/// Scaling of a quantity type by a bare number: `op(Self, T) -> Self`.
#[doc(hidden)]
#[macro_export]
macro_rules! __quantity_scale {
    ($ident:ident, $trait:ident, $method:ident, $op:tt) => {
        impl<U: std::marker::Copy, T: std::ops::$trait<Output = T> + std::marker::Copy>
            std::ops::$trait<T> for $ident<U, T>
        {
            type Output = Self;

            fn $method(self, rhs: T) -> Self {
                $ident {
                    value: self.value $op rhs,
                    unit: self.unit,
                }
            }
        }
    };
}

/// Declare a quantity type `$ident<U, T = f64>` tagged with the unit `U`.
///
/// Quantities of one unit add, subtract and compare; scaling by a bare number
/// keeps the unit, and dividing two quantities of one unit yields a bare
/// number. Zero compares equal regardless of sign.
#[macro_export]
macro_rules! quantity {
    ($ident:ident) => {
        /// A value of type `T` in the unit `U`.
        #[derive(std::clone::Clone, std::marker::Copy, std::default::Default, core::fmt::Debug)]
        pub struct $ident<U, T = f64> {
            pub(crate) value: T,
            pub(crate) unit: U,
        }

        impl<U, T> $ident<U, T> {
            pub fn value(self) -> T {
                self.value
            }
        }

        impl<T: num_traits::Zero + std::cmp::PartialEq, U> PartialEq for $ident<U, T> {
            fn eq(&self, other: &Self) -> bool {
                (self.value.is_zero() && other.value.is_zero()) || self.value == other.value
            }
        }

        impl<T: num_traits::Zero + std::cmp::PartialOrd, U> PartialOrd for $ident<U, T> {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                if self == other {
                    Some(std::cmp::Ordering::Equal)
                } else {
                    self.value.partial_cmp(&other.value)
                }
            }
        }

        $crate::__quantity_op!($ident, Add, add, +);
        $crate::__quantity_op!($ident, Sub, sub, -);
        $crate::__quantity_scale!($ident, Mul, mul, *);
        $crate::__quantity_scale!($ident, Div, div, /);

        impl<U, T: std::ops::Div<Output = T>> std::ops::Div for $ident<U, T> {
            type Output = T;

            fn div(self, rhs: Self) -> T {
                self.value / rhs.value
            }
        }

        impl<U: std::marker::Copy, T: std::ops::Neg<Output = T>> std::ops::Neg for $ident<U, T> {
            type Output = Self;

            fn neg(self) -> Self {
                $ident {
                    value: -self.value,
                    unit: self.unit,
                }
            }
        }

        impl<U: std::fmt::Display, T> std::fmt::Display for $ident<U, T>
        where
            T: num_traits::Float + num_traits::AsPrimitive<f64> + std::fmt::Display,
        {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                $crate::unit::write_quantity(f, self.value, &self.unit)
            }
        }

        impl<U: std::default::Default, T: num_traits::Num> From<T> for $ident<U, T> {
            fn from(value: T) -> Self {
                $ident {
                    value,
                    unit: U::default(),
                }
            }
        }
    };
}

/// Declare a zero-sized unit type with its display symbol.
#[macro_export]
macro_rules! unit {
    ($ident:ident, $symbol:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $ident;

        impl std::fmt::Display for $ident {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($symbol)
            }
        }
    };
}
