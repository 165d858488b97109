// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Unit-tagged quantities.
//!
//! Values crossing the boundary of the translator keep their physical unit in
//! the type: frequencies in hertz, times in seconds, offsets in arcseconds and
//! position angles in degrees.

pub mod angle;
pub mod duration;
pub mod frequency;
#[doc(hidden)]
pub mod unit;

pub use angle::{Angle, Arcsec, Degree, arcsec, degrees};
pub use duration::{Duration, Second, seconds};
pub use frequency::{Frequency, Hertz, gigahertz, hertz, megahertz};
