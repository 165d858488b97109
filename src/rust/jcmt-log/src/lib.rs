// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Log records of the translator crates.
//!
//! Each record carries a target of the form
//! `acsis.translator::<module path>`. Installing a logger is the host's job.

use std::sync::{atomic::AtomicBool, atomic::Ordering};

#[doc(hidden)]
pub use log as _log;

#[doc(hidden)]
#[macro_export]
macro_rules! __record {
    ($level:ident, $($arg:tt)+) => {
        $crate::_log::$level!(target: concat!("acsis.translator::", module_path!()), $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($msg:literal $(, $($arg:tt)+)?) => {
        $crate::__record!(debug, $msg $(, $($arg)+)?);
    };
}

#[macro_export]
macro_rules! info {
    ($msg:literal $(, $($arg:tt)+)?) => {
        $crate::__record!(info, $msg $(, $($arg)+)?);
    };
}

#[macro_export]
macro_rules! warn {
    ($msg:literal $(, $($arg:tt)+)?) => {
        $crate::__record!(warn, $msg $(, $($arg)+)?);
    };
}

/// Info record emitted only while diagnostics are switched on.
///
/// Used for intermediate pass results: channel plans, slot assignments,
/// rejected trial pixel sizes.
#[macro_export]
macro_rules! diagnostic {
    ($msg:literal $(, $($arg:tt)+)?) => {
        if $crate::is_diagnostics_enabled() {
            $crate::__record!(info, $msg $(, $($arg)+)?);
        }
    };
}

static DIAGNOSTICS: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn is_diagnostics_enabled() -> bool {
    DIAGNOSTICS.load(Ordering::Acquire)
}

/// Switch diagnostic records on or off for the whole process.
///
/// Does not touch the installed logger or its level filter.
pub fn init_logging(with_diagnostics: bool) {
    DIAGNOSTICS.store(with_diagnostics, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_flag() {
        init_logging(true);
        assert!(is_diagnostics_enabled());
        diagnostic!("Diagnostics on for {}", "test");
        init_logging(false);
        assert!(!is_diagnostics_enabled());
        diagnostic!("Not emitted");
        info!("Plain record");
    }
}
