// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Display;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of a single observation's translation.
///
/// Every pass fails fast: an error aborts the translation of the observation
/// it was raised for and no partial configuration is produced.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A recognized combination that is explicitly not implemented.
    #[error("{0}")]
    UnsupportedCombination(String),

    /// An iterator kind, switching mode, bandwidth label or other name that
    /// is not in any lookup table.
    #[error("{0}")]
    UnrecognizedInput(String),

    /// More spectral windows requested than hardware slots are wired for a
    /// receptor.
    #[error(
        "Receptor '{receptor}' requires {requested} spectral windows but only {available} hardware slots are available"
    )]
    ResourceExhaustion {
        receptor: String,
        requested: usize,
        available: usize,
    },

    /// Two assignments disagree on the use of a shared hardware resource.
    #[error("{0}")]
    ResourceConflict(String),

    /// A defect in the pass ordering or the inputs a pass relies upon.
    #[error("Internal inconsistency: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn unsupported<T: Display>(msg: T) -> Self {
        Error::UnsupportedCombination(msg.to_string())
    }

    pub fn unrecognized<T: Display>(msg: T) -> Self {
        Error::UnrecognizedInput(msg.to_string())
    }

    pub fn conflict<T: Display>(msg: T) -> Self {
        Error::ResourceConflict(msg.to_string())
    }

    pub fn invariant<T: Display>(msg: T) -> Self {
        Error::InvariantViolation(msg.to_string())
    }
}
